//! 集成测试共享工具模块
//!
//! 提供常用的布局和行构造函数，供所有集成测试使用

#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::str::FromStr;

use rowmeta::{Row, RowLayout, Value, ValueMeta, ValueType};

/// 2007-05-07T13:04:13.203Z
pub fn sample_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2007, 5, 7, 13, 4, 13)
        .single()
        .expect("有效日期")
        + Duration::milliseconds(203)
}

pub fn big(text: &str) -> BigDecimal {
    BigDecimal::from_str(text).expect("有效的大数")
}

/// 端到端场景使用的布局：字符串、日期、带掩码的数值和整数、大数、布尔
pub fn sample_layout() -> RowLayout {
    let mut layout = RowLayout::new();
    layout.append(ValueMeta::new("field_string", ValueType::String));
    layout.append(ValueMeta::new("field_date", ValueType::Date));
    layout.append(ValueMeta::new("field_number", ValueType::Number).with_mask("#,##0.00"));
    layout.append(ValueMeta::new("field_integer", ValueType::Integer).with_mask("0000000"));
    layout.append(ValueMeta::new("field_bignumber", ValueType::BigNumber));
    layout.append(ValueMeta::new("field_boolean", ValueType::Boolean));
    layout
}

pub fn sample_row() -> Row {
    vec![
        Value::from("sampleString"),
        Value::Date(sample_date()),
        Value::Number(9123.0),
        Value::Integer(12345),
        Value::BigNumber(big("123456789012345678.9349")),
        Value::Boolean(true),
    ]
}

/// 每种逻辑类型各一个位置
pub fn all_types_layout() -> RowLayout {
    let mut layout = RowLayout::new();
    for value_type in ValueType::ALL {
        layout.append(ValueMeta::new(value_type.desc().to_lowercase(), value_type));
    }
    layout
}

/// 与 [`all_types_layout`] 对应的非空行
pub fn all_types_row() -> Row {
    ValueType::ALL
        .iter()
        .map(|value_type| match value_type {
            ValueType::String => Value::from("héllo, wörld"),
            ValueType::Integer => Value::Integer(-9_876_543_210),
            ValueType::Number => Value::Number(-1234.5625),
            ValueType::BigNumber => Value::BigNumber(big("-98765432109876543210.0123456789")),
            ValueType::Date => Value::Date(sample_date()),
            ValueType::Timestamp => Value::Timestamp(
                Utc.timestamp_opt(1_196_683_453, 203_456_789)
                    .single()
                    .expect("有效时间戳"),
            ),
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Binary => Value::binary(vec![0u8, 1, 2, 254, 255]),
            ValueType::Serializable => Value::serializable(b"opaque".to_vec()),
        })
        .collect()
}

pub fn ints(values: &[i64]) -> Row {
    values.iter().map(|&v| Value::Integer(v)).collect()
}
