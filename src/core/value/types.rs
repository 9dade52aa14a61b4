//! 值与类型定义
//!
//! [`Value`] 是一行中单个位置的运行时值，[`ValueType`] 是描述符声明的逻辑类型，
//! [`StorageType`] 描述值在行内的物理表示。

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 一行数据：按位置排列的值，长度可以大于布局的字段数（多出的部分为空闲槽位）
pub type Row = Vec<Value>;

/// 逻辑类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Number,
    String,
    Date,
    Boolean,
    Integer,
    BigNumber,
    Serializable,
    Binary,
    Timestamp,
}

impl ValueType {
    pub const ALL: [ValueType; 9] = [
        ValueType::Number,
        ValueType::String,
        ValueType::Date,
        ValueType::Boolean,
        ValueType::Integer,
        ValueType::BigNumber,
        ValueType::Serializable,
        ValueType::Binary,
        ValueType::Timestamp,
    ];

    /// 稳定的数字编号，持久化格式依赖该值
    pub fn id(self) -> u8 {
        match self {
            ValueType::Number => 1,
            ValueType::String => 2,
            ValueType::Date => 3,
            ValueType::Boolean => 4,
            ValueType::Integer => 5,
            ValueType::BigNumber => 6,
            ValueType::Serializable => 7,
            ValueType::Binary => 8,
            ValueType::Timestamp => 9,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.id() == id)
    }

    pub fn desc(self) -> &'static str {
        match self {
            ValueType::Number => "Number",
            ValueType::String => "String",
            ValueType::Date => "Date",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::BigNumber => "BigNumber",
            ValueType::Serializable => "Serializable",
            ValueType::Binary => "Binary",
            ValueType::Timestamp => "Timestamp",
        }
    }

    /// 按名称查找类型，忽略大小写
    pub fn from_desc(desc: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.desc().eq_ignore_ascii_case(desc.trim()))
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::Number | ValueType::Integer | ValueType::BigNumber
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ValueType::Date | ValueType::Timestamp)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.desc())
    }
}

/// 物理存储方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageType {
    /// 值就是逻辑类型本身
    #[default]
    Normal,
    /// 值是尚未解析的原始字节，按存储描述符的规则延迟解析
    BinaryString,
    /// 值是字典下标，真实值在描述符的索引表中
    Indexed,
}

impl StorageType {
    pub fn id(self) -> u8 {
        match self {
            StorageType::Normal => 0,
            StorageType::BinaryString => 1,
            StorageType::Indexed => 2,
        }
    }

    pub fn desc(self) -> &'static str {
        match self {
            StorageType::Normal => "normal",
            StorageType::BinaryString => "binary-string",
            StorageType::Indexed => "indexed",
        }
    }
}

/// 字符串裁剪方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimType {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl TrimType {
    pub fn apply<'a>(self, s: &'a str) -> &'a str {
        match self {
            TrimType::None => s,
            TrimType::Left => s.trim_start(),
            TrimType::Right => s.trim_end(),
            TrimType::Both => s.trim(),
        }
    }

    pub fn from_desc(desc: &str) -> Option<Self> {
        match desc.trim().to_ascii_lowercase().as_str() {
            "none" => Some(TrimType::None),
            "left" => Some(TrimType::Left),
            "right" => Some(TrimType::Right),
            "both" => Some(TrimType::Both),
            _ => None,
        }
    }
}

/// 行中单个位置的值
///
/// 二进制负载使用 `Arc<[u8]>`：浅拷贝只增加引用计数，深拷贝见
/// [`Value::deep_clone`]。
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Number(f64),
    BigNumber(BigDecimal),
    Date(DateTime<Utc>),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
    Binary(Arc<[u8]>),
    Serializable(Arc<[u8]>),
}

impl Value {
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Binary(Arc::from(bytes.into()))
    }

    pub fn serializable(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Serializable(Arc::from(bytes.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 值自身携带的逻辑类型，`Null` 没有类型
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(ValueType::String),
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Number(_) => Some(ValueType::Number),
            Value::BigNumber(_) => Some(ValueType::BigNumber),
            Value::Date(_) => Some(ValueType::Date),
            Value::Timestamp(_) => Some(ValueType::Timestamp),
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Binary(_) => Some(ValueType::Binary),
            Value::Serializable(_) => Some(ValueType::Serializable),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) | Value::Serializable(b) => Some(b),
            _ => None,
        }
    }

    /// 深拷贝：二进制负载复制出独立的缓冲区
    pub fn deep_clone(&self) -> Self {
        match self {
            Value::Binary(b) => Value::Binary(Arc::from(b.to_vec())),
            Value::Serializable(b) => Value::Serializable(Arc::from(b.to_vec())),
            other => other.clone(),
        }
    }

    /// 两个值是否共享同一块二进制负载
    pub fn shares_payload(&self, other: &Value) -> bool {
        match (self.as_bytes(), other.as_bytes()) {
            (Some(a), Some(b)) => std::ptr::eq(a.as_ptr(), b.as_ptr()) && a.len() == b.len(),
            _ => false,
        }
    }
}

/// 浮点数按位比较：NaN 等于自身，`0.0` 与 `-0.0` 不相等，
/// 保证编解码往返后的行与原行相等
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::BigNumber(a), Value::BigNumber(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Serializable(a), Value::Serializable(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::BigNumber(b) => write!(f, "{}", b),
            Value::Date(d) | Value::Timestamp(d) => write!(f, "{}", d.to_rfc3339()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Binary(b) | Value::Serializable(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<BigDecimal> for Value {
    fn from(b: BigDecimal) -> Self {
        Value::BigNumber(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
