//! 值描述符
//!
//! 描述行中一个位置：名称、逻辑类型、长度/精度、存储方式以及文本转换规则。
//! 所有字段都有默认值，`None` 表示使用 [`ConversionConfig`] 中的全局默认。
//!
//! [`ConversionConfig`]: crate::config::ConversionConfig

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::error::{RowError, RowResult};
use crate::core::format::zone;
use crate::core::value::{StorageType, TrimType, Value, ValueType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMeta {
    name: String,
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default)]
    storage_type: StorageType,
    #[serde(default = "unset")]
    length: i32,
    #[serde(default = "unset")]
    precision: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversion_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decimal_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grouping_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency_symbol: Option<String>,
    #[serde(default, with = "zone::serde_opt", skip_serializing_if = "Option::is_none")]
    date_format_time_zone: Option<FixedOffset>,
    #[serde(default)]
    date_format_lenient: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lenient_string_to_number: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_metadata: Option<Arc<ValueMeta>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversion_metadata: Option<Arc<ValueMeta>>,
    /// 字典表不参与持久化
    #[serde(skip)]
    index: Option<Arc<[Value]>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comments: Option<String>,
    #[serde(default)]
    trim_type: TrimType,
    #[serde(default)]
    case_insensitive: bool,
    #[serde(default)]
    sorted_descending: bool,
    #[serde(default)]
    output_padding: bool,
    #[serde(default)]
    big_number_formatting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    null_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_encoding: Option<String>,
}

fn unset() -> i32 {
    -1
}

impl ValueMeta {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            storage_type: StorageType::Normal,
            length: -1,
            precision: -1,
            conversion_mask: None,
            decimal_symbol: None,
            grouping_symbol: None,
            currency_symbol: None,
            date_format_time_zone: None,
            date_format_lenient: false,
            lenient_string_to_number: None,
            storage_metadata: None,
            conversion_metadata: None,
            index: None,
            origin: None,
            comments: None,
            trim_type: TrimType::None,
            case_insensitive: false,
            sorted_descending: false,
            output_padding: false,
            big_number_formatting: true,
            null_string: None,
            string_encoding: None,
        }
    }

    pub fn with_length(
        name: impl Into<String>,
        value_type: ValueType,
        length: i32,
        precision: i32,
    ) -> Self {
        let mut meta = Self::new(name, value_type);
        meta.length = length;
        meta.precision = precision;
        meta
    }

    /// 链式设置掩码
    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.set_conversion_mask(Some(mask.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// 名称为空的描述符不参与重名检查和名称查找
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn set_value_type(&mut self, value_type: ValueType) {
        self.value_type = value_type;
    }

    pub fn type_desc(&self) -> &'static str {
        self.value_type.desc()
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// 直接设置存储方式，不检查配套的存储描述符或字典表，见 [`ValueMeta::validate`]
    pub fn set_storage_type(&mut self, storage_type: StorageType) {
        self.storage_type = storage_type;
    }

    pub fn is_storage_normal(&self) -> bool {
        self.storage_type == StorageType::Normal
    }

    pub fn is_storage_binary_string(&self) -> bool {
        self.storage_type == StorageType::BinaryString
    }

    pub fn is_storage_indexed(&self) -> bool {
        self.storage_type == StorageType::Indexed
    }

    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn set_length(&mut self, length: i32) {
        self.length = length;
    }

    pub fn precision(&self) -> i32 {
        self.precision
    }

    pub fn set_precision(&mut self, precision: i32) {
        self.precision = precision;
    }

    pub fn set_length_and_precision(&mut self, length: i32, precision: i32) {
        self.length = length;
        self.precision = precision;
    }

    pub fn conversion_mask(&self) -> Option<&str> {
        self.conversion_mask.as_deref().filter(|m| !m.is_empty())
    }

    pub fn set_conversion_mask(&mut self, mask: Option<String>) {
        self.conversion_mask = mask;
    }

    pub fn decimal_symbol(&self) -> Option<&str> {
        self.decimal_symbol.as_deref()
    }

    pub fn set_decimal_symbol(&mut self, symbol: Option<String>) {
        self.decimal_symbol = symbol;
    }

    pub fn grouping_symbol(&self) -> Option<&str> {
        self.grouping_symbol.as_deref()
    }

    pub fn set_grouping_symbol(&mut self, symbol: Option<String>) {
        self.grouping_symbol = symbol;
    }

    pub fn currency_symbol(&self) -> Option<&str> {
        self.currency_symbol.as_deref()
    }

    pub fn set_currency_symbol(&mut self, symbol: Option<String>) {
        self.currency_symbol = symbol;
    }

    pub fn date_format_time_zone(&self) -> Option<FixedOffset> {
        self.date_format_time_zone
    }

    pub fn set_date_format_time_zone(&mut self, zone: Option<FixedOffset>) {
        self.date_format_time_zone = zone;
    }

    pub fn is_date_format_lenient(&self) -> bool {
        self.date_format_lenient
    }

    pub fn set_date_format_lenient(&mut self, lenient: bool) {
        self.date_format_lenient = lenient;
    }

    pub fn lenient_string_to_number(&self) -> Option<bool> {
        self.lenient_string_to_number
    }

    pub fn set_lenient_string_to_number(&mut self, lenient: Option<bool>) {
        self.lenient_string_to_number = lenient;
    }

    pub fn storage_metadata(&self) -> Option<&ValueMeta> {
        self.storage_metadata.as_deref()
    }

    pub fn set_storage_metadata(&mut self, meta: Option<ValueMeta>) {
        self.storage_metadata = meta.map(Arc::new);
    }

    pub fn conversion_metadata(&self) -> Option<&ValueMeta> {
        self.conversion_metadata.as_deref()
    }

    pub fn set_conversion_metadata(&mut self, meta: Option<ValueMeta>) {
        self.conversion_metadata = meta.map(Arc::new);
    }

    pub fn index(&self) -> Option<&[Value]> {
        self.index.as_deref()
    }

    pub fn set_index(&mut self, index: Option<Vec<Value>>) {
        self.index = index.map(Arc::from);
    }

    /// 切换为延迟解析的字节存储，`storage` 描述原始文本的格式
    pub fn set_binary_string_storage(&mut self, storage: ValueMeta) {
        self.storage_type = StorageType::BinaryString;
        self.storage_metadata = Some(Arc::new(storage));
    }

    /// 切换为字典存储
    pub fn set_indexed_storage(&mut self, index: Vec<Value>) {
        self.storage_type = StorageType::Indexed;
        self.index = Some(Arc::from(index));
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn set_origin(&mut self, origin: Option<String>) {
        self.origin = origin;
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn set_comments(&mut self, comments: Option<String>) {
        self.comments = comments;
    }

    pub fn trim_type(&self) -> TrimType {
        self.trim_type
    }

    pub fn set_trim_type(&mut self, trim_type: TrimType) {
        self.trim_type = trim_type;
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn set_case_insensitive(&mut self, case_insensitive: bool) {
        self.case_insensitive = case_insensitive;
    }

    pub fn is_sorted_descending(&self) -> bool {
        self.sorted_descending
    }

    pub fn set_sorted_descending(&mut self, descending: bool) {
        self.sorted_descending = descending;
    }

    pub fn is_output_padding(&self) -> bool {
        self.output_padding
    }

    pub fn set_output_padding(&mut self, padding: bool) {
        self.output_padding = padding;
    }

    pub fn is_big_number_formatting(&self) -> bool {
        self.big_number_formatting
    }

    pub fn set_big_number_formatting(&mut self, formatting: bool) {
        self.big_number_formatting = formatting;
    }

    pub fn null_string(&self) -> Option<&str> {
        self.null_string.as_deref()
    }

    pub fn set_null_string(&mut self, null_string: Option<String>) {
        self.null_string = null_string;
    }

    pub fn string_encoding(&self) -> Option<&str> {
        self.string_encoding.as_deref()
    }

    pub fn set_string_encoding(&mut self, encoding: Option<String>) {
        self.string_encoding = encoding;
    }

    /// 复制时需要深拷贝值的描述符：值持有可变语义的字节负载
    pub fn requires_real_clone(&self) -> bool {
        matches!(self.value_type, ValueType::Binary | ValueType::Serializable)
            || self.storage_type == StorageType::BinaryString
    }

    /// 文本转换时实际生效的规则：有转换描述符时以它为准
    pub fn format_rules(&self) -> &ValueMeta {
        self.conversion_metadata.as_deref().unwrap_or(self)
    }

    /// 检查存储方式与配套数据是否一致
    pub fn validate(&self) -> RowResult<()> {
        match self.storage_type {
            StorageType::BinaryString if self.storage_metadata.is_none() => Err(
                RowError::structural(format!(
                    "'{}' uses binary-string storage without storage metadata",
                    self.name
                )),
            ),
            StorageType::Indexed if self.index.is_none() => Err(RowError::structural(format!(
                "'{}' uses indexed storage without an index table",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    /// 类型说明，形如 `Number(9, 2)` 或 `String(10)<binary-string>`
    pub fn to_string_meta(&self) -> String {
        let mut out = self.value_type.desc().to_string();
        match self.value_type {
            ValueType::Number | ValueType::BigNumber if self.length >= 0 => {
                if self.precision >= 0 {
                    out.push_str(&format!("({}, {})", self.length, self.precision));
                } else {
                    out.push_str(&format!("({})", self.length));
                }
            }
            ValueType::String | ValueType::Integer | ValueType::Binary if self.length >= 0 => {
                out.push_str(&format!("({})", self.length));
            }
            _ => {}
        }
        if self.storage_type != StorageType::Normal {
            out.push('<');
            out.push_str(self.storage_type.desc());
            out.push('>');
        }
        out
    }
}

impl fmt::Display for ValueMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.to_string_meta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let meta = ValueMeta::new("qty", ValueType::Integer);
        assert_eq!(meta.name(), "qty");
        assert_eq!(meta.length(), -1);
        assert_eq!(meta.precision(), -1);
        assert!(meta.is_storage_normal());
        assert!(meta.conversion_mask().is_none());
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_empty_mask_is_unset() {
        let mut meta = ValueMeta::new("d", ValueType::Date);
        meta.set_conversion_mask(Some(String::new()));
        assert!(meta.conversion_mask().is_none());
    }

    #[test]
    fn test_to_string_meta() {
        let n = ValueMeta::with_length("amount", ValueType::Number, 9, 2);
        assert_eq!(n.to_string_meta(), "Number(9, 2)");
        let mut s = ValueMeta::with_length("code", ValueType::String, 10, -1);
        s.set_binary_string_storage(ValueMeta::new("code", ValueType::String));
        assert_eq!(s.to_string_meta(), "String(10)<binary-string>");
        assert_eq!(s.to_string(), "code String(10)<binary-string>");
        assert_eq!(ValueMeta::new("b", ValueType::Boolean).to_string_meta(), "Boolean");
    }

    #[test]
    fn test_validate_storage_requirements() {
        let mut meta = ValueMeta::new("x", ValueType::Integer);
        meta.set_storage_type(StorageType::BinaryString);
        assert!(meta.validate().is_err());
        meta.set_binary_string_storage(ValueMeta::new("x", ValueType::String));
        assert!(meta.validate().is_ok());

        let mut idx = ValueMeta::new("y", ValueType::String);
        idx.set_storage_type(StorageType::Indexed);
        assert!(idx.validate().is_err());
        idx.set_indexed_storage(vec![Value::from("a"), Value::from("b")]);
        assert!(idx.validate().is_ok());
        assert_eq!(idx.index().map(|i| i.len()), Some(2));
    }

    #[test]
    fn test_requires_real_clone() {
        assert!(ValueMeta::new("b", ValueType::Binary).requires_real_clone());
        assert!(ValueMeta::new("s", ValueType::Serializable).requires_real_clone());
        assert!(!ValueMeta::new("i", ValueType::Integer).requires_real_clone());
    }

    #[test]
    fn test_format_rules_prefers_conversion_metadata() {
        let mut meta = ValueMeta::new("n", ValueType::Number);
        assert_eq!(meta.format_rules().name(), "n");
        meta.set_conversion_metadata(Some(ValueMeta::new("n_src", ValueType::String).with_mask("0.00")));
        assert_eq!(meta.format_rules().name(), "n_src");
        assert_eq!(meta.format_rules().conversion_mask(), Some("0.00"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut meta = ValueMeta::with_length("when", ValueType::Date, -1, -1);
        meta.set_conversion_mask(Some("yyyy-MM-dd".into()));
        meta.set_date_format_time_zone(FixedOffset::east_opt(3600));
        meta.set_binary_string_storage(ValueMeta::new("when", ValueType::String));
        meta.set_trim_type(TrimType::Both);

        let json = serde_json::to_string(&meta).expect("序列化失败");
        assert!(json.contains("\"binary-string\""));
        assert!(json.contains("+01:00"));
        let back: ValueMeta = serde_json::from_str(&json).expect("反序列化失败");
        assert_eq!(back, meta);
    }
}
