//! 值转换集成测试
//!
//! 测试范围:
//! - core::convert - 掩码格式化、文本解析、跨类型转换、比较与哈希
//! - config - 转换默认值对结果的影响

mod common;

use std::cmp::Ordering;
use std::sync::Arc;

use common::{big, sample_date, sample_layout, sample_row};
use rowmeta::{
    ConversionConfig, RowError, RowLayout, TrimType, Value, ValueConverter, ValueMeta, ValueType,
};

// ==================== 格式化测试 ====================

#[test]
fn test_sample_row_renders_with_masks() {
    let layout = sample_layout();
    let row = sample_row();

    let rendered: Vec<String> = (0..layout.len())
        .map(|i| layout.get_string(&row, i).expect("格式化失败").unwrap_or_default())
        .collect();
    assert_eq!(rendered[0], "sampleString");
    assert_eq!(rendered[1], "2007/05/07 13:04:13.203");
    assert_eq!(rendered[2], "9,123.00");
    assert_eq!(rendered[3], "0012345");
    assert_eq!(rendered[5], "Y");
}

#[test]
fn test_sample_row_typed_access() {
    let layout = sample_layout();
    let row = sample_row();

    assert_eq!(layout.get_integer(&row, 3).expect("取值失败"), Some(12345));
    assert_eq!(layout.get_number(&row, 3).expect("取值失败"), Some(12345.0));
    assert_eq!(layout.get_date(&row, 1).expect("取值失败"), Some(sample_date()));
    assert_eq!(
        layout.get_big_number(&row, 4).expect("取值失败"),
        Some(big("123456789012345678.9349"))
    );
    assert_eq!(layout.get_boolean(&row, 5).expect("取值失败"), Some(true));
    // 日期转整数为纪元毫秒
    assert_eq!(
        layout.get_integer(&row, 1).expect("取值失败"),
        Some(sample_date().timestamp_millis())
    );
}

#[test]
fn test_configured_time_zone_applies_to_dates() {
    let config = ConversionConfig {
        default_time_zone: "+02:00".to_string(),
        ..ConversionConfig::default()
    };
    let converter = Arc::new(ValueConverter::new(config).expect("配置无效"));
    let mut layout = RowLayout::with_converter(converter);
    layout.append(ValueMeta::new("when", ValueType::Date));

    let row = vec![Value::Date(sample_date())];
    assert_eq!(
        layout.get_string(&row, 0).expect("格式化失败").as_deref(),
        Some("2007/05/07 15:04:13.203")
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ConversionConfig {
        default_time_zone: "Mars/Olympus".to_string(),
        ..ConversionConfig::default()
    };
    assert!(ValueConverter::new(config).is_err());
}

// ==================== 解析测试 ====================

#[test]
fn test_reading_text_with_masks() {
    let converter = ValueConverter::default();

    let number_rules = ValueMeta::new("amount", ValueType::String).with_mask("#,##0.00");
    let value = converter
        .convert_data_from_string(
            &number_rules,
            Some("9,123.00"),
            ValueType::Number,
            None,
            None,
            TrimType::None,
        )
        .expect("解析失败");
    assert_eq!(value, Value::Number(9123.0));

    let date_rules = ValueMeta::new("when", ValueType::String).with_mask("yyyy-MM-dd HH:mm:ss.SSS");
    let value = converter
        .convert_data_from_string(
            &date_rules,
            Some("  2007-05-07 13:04:13.203 "),
            ValueType::Date,
            None,
            None,
            TrimType::Both,
        )
        .expect("解析失败");
    assert_eq!(value, Value::Date(sample_date()));
}

#[test]
fn test_null_markers_and_replacements() {
    let converter = ValueConverter::default();
    let rules = ValueMeta::new("qty", ValueType::String);

    let value = converter
        .convert_data_from_string(&rules, Some("n/a"), ValueType::Integer, Some("N/A"), None, TrimType::None)
        .expect("解析失败");
    assert_eq!(value, Value::Null);

    let value = converter
        .convert_data_from_string(&rules, Some(""), ValueType::Integer, None, Some("7"), TrimType::None)
        .expect("解析失败");
    assert_eq!(value, Value::Integer(7));

    let value = converter
        .convert_data_from_string(&rules, None, ValueType::Integer, None, None, TrimType::None)
        .expect("解析失败");
    assert_eq!(value, Value::Null);
}

#[test]
fn test_unparseable_text_reports_value_and_target() {
    let converter = ValueConverter::default();
    let rules = ValueMeta::new("qty", ValueType::String);
    let err = converter
        .convert_data_from_string(&rules, Some("abc"), ValueType::Integer, None, None, TrimType::None)
        .unwrap_err();
    assert!(err.is_conversion());
    match err {
        RowError::Conversion(detail) => {
            assert_eq!(detail.value, "abc");
            assert_eq!(detail.target, ValueType::Integer);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

// ==================== 存储方式与比较测试 ====================

fn lazy_integer() -> ValueMeta {
    let mut meta = ValueMeta::new("qty", ValueType::Integer);
    meta.set_binary_string_storage(ValueMeta::new("qty", ValueType::String));
    meta
}

#[test]
fn test_binary_string_storage_matches_normal() {
    let converter = ValueConverter::default();
    let lazy = lazy_integer();
    let normal = ValueMeta::new("qty", ValueType::Integer);
    let raw = Value::binary(b"42".to_vec());

    assert_eq!(converter.get_integer(&lazy, &raw).expect("取值失败"), Some(42));
    assert_eq!(
        converter.convert_to_normal_storage(&lazy, &raw).expect("转换失败"),
        Value::Integer(42)
    );
    assert_eq!(
        converter.hash_value(&lazy, &raw).expect("哈希失败"),
        converter.hash_value(&normal, &Value::Integer(42)).expect("哈希失败")
    );
    assert_eq!(
        converter
            .compare_with(&lazy, &raw, &normal, &Value::Integer(42))
            .expect("比较失败"),
        Ordering::Equal
    );
    // 空字节视为空值
    assert!(converter.is_null(&lazy, &Value::binary(Vec::new())).expect("判断失败"));
}

#[test]
fn test_compare_is_antisymmetric() {
    let converter = ValueConverter::default();
    let samples = [
        (ValueMeta::new("i", ValueType::Integer), Value::Integer(-3), Value::Integer(8)),
        (ValueMeta::new("n", ValueType::Number), Value::Number(0.5), Value::Number(-0.25)),
        (ValueMeta::new("s", ValueType::String), Value::from("apple"), Value::from("pear")),
        (
            ValueMeta::new("b", ValueType::BigNumber),
            Value::BigNumber(big("1.10")),
            Value::BigNumber(big("1.2")),
        ),
        (ValueMeta::new("f", ValueType::Boolean), Value::Boolean(false), Value::Boolean(true)),
    ];
    for (meta, a, b) in &samples {
        let ab = converter.compare(meta, a, b).expect("比较失败");
        let ba = converter.compare(meta, b, a).expect("比较失败");
        assert_eq!(ab, ba.reverse(), "{}", meta);
        assert_eq!(converter.compare(meta, a, a).expect("比较失败"), Ordering::Equal);
    }
}

#[test]
fn test_case_insensitive_strings_hash_alike() {
    let converter = ValueConverter::default();
    let mut meta = ValueMeta::new("code", ValueType::String);
    meta.set_case_insensitive(true);
    let a = Value::from("ABC");
    let b = Value::from("abc");
    assert_eq!(converter.compare(&meta, &a, &b).expect("比较失败"), Ordering::Equal);
    assert_eq!(
        converter.hash_value(&meta, &a).expect("哈希失败"),
        converter.hash_value(&meta, &b).expect("哈希失败")
    );
}

#[test]
fn test_big_numbers_with_different_scale_are_equal() {
    let converter = ValueConverter::default();
    let meta = ValueMeta::new("b", ValueType::BigNumber);
    let a = Value::BigNumber(big("2.50"));
    let b = Value::BigNumber(big("2.5"));
    assert_eq!(converter.compare(&meta, &a, &b).expect("比较失败"), Ordering::Equal);
    assert_eq!(
        converter.hash_value(&meta, &a).expect("哈希失败"),
        converter.hash_value(&meta, &b).expect("哈希失败")
    );
}
