//! 值转换器
//!
//! 所有按描述符解释原始值的操作都集中在 [`ValueConverter`] 中：
//! 存储方式解码、类型访问器、文本格式化/解析以及跨描述符转换。
//! 转换器本身不可变，持有全局配置和编译后掩码的缓存，可以在线程间共享。

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, Utc};
use num_traits::{ToPrimitive, Zero};
use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ConversionConfig;
use crate::core::error::{ConversionError, RowError, RowResult};
use crate::core::format::{zone, DateMask, DecimalDigits, MaskCache, NumberMask, Symbols};
use crate::core::meta::ValueMeta;
use crate::core::value::{StorageType, TrimType, Value, ValueType};

pub struct ValueConverter {
    config: ConversionConfig,
    default_zone: FixedOffset,
    masks: MaskCache,
}

pub(crate) fn conversion_error(
    meta: &ValueMeta,
    value: &dyn Display,
    target: ValueType,
    reason: impl Into<String>,
) -> RowError {
    ConversionError::new(value.to_string(), meta.to_string(), target, reason).into()
}

impl ValueConverter {
    pub fn new(config: ConversionConfig) -> RowResult<Self> {
        config.validate()?;
        let default_zone = zone::parse_offset(&config.default_time_zone).ok_or_else(|| {
            RowError::config(format!(
                "unsupported default_time_zone '{}'",
                config.default_time_zone
            ))
        })?;
        log::debug!(
            "value converter created: zone={}, mask cache capacity={}",
            zone::format_offset(&default_zone),
            config.mask_cache_capacity
        );
        Ok(Self {
            masks: MaskCache::new(config.mask_cache_capacity),
            default_zone,
            config,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn default_time_zone(&self) -> FixedOffset {
        self.default_zone
    }

    fn empty_differs_from_null(&self) -> bool {
        self.config.empty_string_differs_from_null
    }

    // ---------------------------------------------------------------
    // 掩码与符号
    // ---------------------------------------------------------------

    fn number_pattern<'a>(&'a self, rules: &'a ValueMeta, kind: ValueType) -> Cow<'a, str> {
        if let Some(mask) = rules.conversion_mask() {
            return Cow::Borrowed(mask);
        }
        let cfg = &self.config;
        if rules.value_type() == ValueType::String {
            return Cow::Borrowed(match kind {
                ValueType::Integer => cfg.parse_integer_mask.as_str(),
                ValueType::BigNumber => cfg.parse_big_number_mask.as_str(),
                _ => cfg.parse_number_mask.as_str(),
            });
        }
        if rules.length() > 0 {
            return Cow::Owned(match kind {
                ValueType::Integer => length_integer_pattern(rules.length()),
                _ => length_number_pattern(rules.length(), rules.precision()),
            });
        }
        Cow::Borrowed(match kind {
            ValueType::Integer => cfg.default_integer_mask.as_str(),
            ValueType::BigNumber => cfg.default_big_number_mask.as_str(),
            _ => cfg.default_number_mask.as_str(),
        })
    }

    fn date_pattern<'a>(&'a self, rules: &'a ValueMeta, kind: ValueType) -> &'a str {
        if let Some(mask) = rules.conversion_mask() {
            return mask;
        }
        let from_string = rules.value_type() == ValueType::String;
        match (kind, from_string) {
            (ValueType::Timestamp, true) => self.config.parse_timestamp_mask.as_str(),
            (ValueType::Timestamp, false) => self.config.default_timestamp_mask.as_str(),
            (_, true) => self.config.parse_date_mask.as_str(),
            (_, false) => self.config.default_date_mask.as_str(),
        }
    }

    fn symbols(&self, rules: &ValueMeta) -> Symbols {
        Symbols::from_strings(
            rules
                .decimal_symbol()
                .unwrap_or(&self.config.decimal_symbol),
            rules
                .grouping_symbol()
                .unwrap_or(&self.config.grouping_symbol),
            rules
                .currency_symbol()
                .unwrap_or(&self.config.currency_symbol),
        )
    }

    fn zone_of(&self, rules: &ValueMeta) -> FixedOffset {
        rules.date_format_time_zone().unwrap_or(self.default_zone)
    }

    fn lenient_numbers(&self, rules: &ValueMeta) -> bool {
        rules
            .lenient_string_to_number()
            .unwrap_or(self.config.lenient_string_to_number)
    }

    fn number_mask(
        &self,
        meta: &ValueMeta,
        value: &dyn Display,
        kind: ValueType,
    ) -> RowResult<Arc<NumberMask>> {
        let rules = meta.format_rules();
        let pattern = self.number_pattern(rules, kind);
        self.masks
            .number(&pattern, &self.symbols(rules))
            .map_err(|reason| conversion_error(meta, value, kind, reason))
    }

    fn date_mask(
        &self,
        meta: &ValueMeta,
        value: &dyn Display,
        kind: ValueType,
    ) -> RowResult<Arc<DateMask>> {
        let rules = meta.format_rules();
        self.masks
            .date(self.date_pattern(rules, kind))
            .map_err(|reason| conversion_error(meta, value, kind, reason))
    }

    // ---------------------------------------------------------------
    // 文本编码
    // ---------------------------------------------------------------

    fn check_encoding(&self, meta: &ValueMeta) -> Result<(), String> {
        match meta.string_encoding() {
            None => Ok(()),
            Some(enc) if enc.eq_ignore_ascii_case("utf-8") || enc.eq_ignore_ascii_case("utf8") => {
                Ok(())
            }
            Some(enc) => Err(format!("unsupported string encoding '{}'", enc)),
        }
    }

    fn decode_text(&self, meta: &ValueMeta, bytes: &[u8]) -> RowResult<String> {
        let shown = || format!("<{} bytes>", bytes.len());
        self.check_encoding(meta)
            .map_err(|reason| conversion_error(meta, &shown(), ValueType::String, reason))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| conversion_error(meta, &shown(), ValueType::String, e.to_string()))
    }

    fn encode_text(&self, meta: &ValueMeta, text: &str) -> RowResult<Arc<[u8]>> {
        self.check_encoding(meta)
            .map_err(|reason| conversion_error(meta, &text, ValueType::Binary, reason))?;
        Ok(Arc::from(text.as_bytes()))
    }

    // ---------------------------------------------------------------
    // 存储方式
    // ---------------------------------------------------------------

    /// 按描述符的存储方式取出逻辑值，NORMAL 存储不复制
    pub(crate) fn native<'a>(&self, meta: &ValueMeta, raw: &'a Value) -> RowResult<Cow<'a, Value>> {
        if raw.is_null() {
            return Ok(Cow::Owned(Value::Null));
        }
        match meta.storage_type() {
            StorageType::Normal => Ok(Cow::Borrowed(raw)),
            StorageType::BinaryString => {
                let bytes = match raw {
                    Value::Binary(b) => b,
                    other => {
                        return Err(conversion_error(
                            meta,
                            other,
                            meta.value_type(),
                            "binary-string storage expects a byte payload",
                        ))
                    }
                };
                if bytes.is_empty() {
                    return Ok(Cow::Owned(Value::Null));
                }
                let storage = meta.storage_metadata().ok_or_else(|| {
                    RowError::structural(format!(
                        "'{}' uses binary-string storage without storage metadata",
                        meta.name()
                    ))
                })?;
                let text = Value::String(self.decode_text(storage, bytes)?);
                self.convert_native_to_type(meta.value_type(), storage, &text)
                    .map(Cow::Owned)
            }
            StorageType::Indexed => {
                let table = meta.index().ok_or_else(|| {
                    RowError::structural(format!(
                        "'{}' uses indexed storage without an index table",
                        meta.name()
                    ))
                })?;
                let code = match raw {
                    Value::Integer(i) => *i,
                    other => {
                        return Err(conversion_error(
                            meta,
                            other,
                            meta.value_type(),
                            "indexed storage expects an integer code",
                        ))
                    }
                };
                usize::try_from(code)
                    .ok()
                    .and_then(|i| table.get(i))
                    .map(|v| Cow::Owned(v.clone()))
                    .ok_or_else(|| {
                        conversion_error(
                            meta,
                            &code,
                            meta.value_type(),
                            format!("index {} out of range ({} entries)", code, table.len()),
                        )
                    })
            }
        }
    }

    /// 转为 NORMAL 存储的逻辑值
    pub fn convert_to_normal_storage(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Value> {
        self.native(meta, raw).map(Cow::into_owned)
    }

    /// 转为 BINARY_STRING 存储的字节，文本按存储描述符的规则生成
    pub fn convert_to_binary_string_storage(
        &self,
        meta: &ValueMeta,
        raw: &Value,
    ) -> RowResult<Value> {
        if meta.is_storage_binary_string() {
            return Ok(raw.clone());
        }
        let native = self.native(meta, raw)?;
        let rules = meta.storage_metadata().unwrap_or(meta);
        match self.string_of(rules, &native)? {
            Some(text) => Ok(Value::Binary(self.encode_text(rules, &text)?)),
            None => Ok(Value::Null),
        }
    }

    /// 把逻辑值放回描述符的存储方式：BINARY_STRING 生成文本字节，INDEXED 查找编号
    pub fn convert_to_storage(&self, meta: &ValueMeta, logical: &Value) -> RowResult<Value> {
        if logical.is_null() {
            return Ok(Value::Null);
        }
        match meta.storage_type() {
            StorageType::Normal => Ok(logical.clone()),
            StorageType::BinaryString => {
                let rules = meta.storage_metadata().unwrap_or(meta);
                match self.string_of(rules, logical)? {
                    Some(text) => Ok(Value::Binary(self.encode_text(rules, &text)?)),
                    None => Ok(Value::Null),
                }
            }
            StorageType::Indexed => {
                let table = meta.index().ok_or_else(|| {
                    RowError::structural(format!(
                        "'{}' uses indexed storage without an index table",
                        meta.name()
                    ))
                })?;
                table
                    .iter()
                    .position(|v| v == logical)
                    .map(|i| Value::Integer(i as i64))
                    .ok_or_else(|| {
                        conversion_error(
                            meta,
                            logical,
                            meta.value_type(),
                            "value not present in the index table",
                        )
                    })
            }
        }
    }

    /// 复制值；需要深拷贝的描述符会复制字节负载
    pub fn clone_value(&self, meta: &ValueMeta, raw: &Value) -> Value {
        if meta.requires_real_clone() {
            raw.deep_clone()
        } else {
            raw.clone()
        }
    }

    // ---------------------------------------------------------------
    // 类型访问器
    // ---------------------------------------------------------------

    pub fn get_string(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Option<String>> {
        let native = self.native(meta, raw)?;
        self.string_of(meta, &native)
    }

    pub fn get_integer(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Option<i64>> {
        let native = self.native(meta, raw)?;
        self.integer_of(meta, &native)
    }

    pub fn get_number(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Option<f64>> {
        let native = self.native(meta, raw)?;
        self.number_of(meta, &native)
    }

    pub fn get_big_number(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Option<BigDecimal>> {
        let native = self.native(meta, raw)?;
        self.big_number_of(meta, &native)
    }

    pub fn get_boolean(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Option<bool>> {
        let native = self.native(meta, raw)?;
        self.boolean_of(meta, &native)
    }

    pub fn get_date(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Option<DateTime<Utc>>> {
        let native = self.native(meta, raw)?;
        self.date_of(meta, &native, ValueType::Date)
    }

    pub fn get_timestamp(
        &self,
        meta: &ValueMeta,
        raw: &Value,
    ) -> RowResult<Option<DateTime<Utc>>> {
        let native = self.native(meta, raw)?;
        self.date_of(meta, &native, ValueType::Timestamp)
    }

    pub fn get_binary(&self, meta: &ValueMeta, raw: &Value) -> RowResult<Option<Arc<[u8]>>> {
        if meta.is_storage_binary_string() && meta.value_type() == ValueType::String {
            if let Value::Binary(bytes) = raw {
                return Ok((!bytes.is_empty()).then(|| bytes.clone()));
            }
        }
        let native = self.native(meta, raw)?;
        self.binary_of(meta, &native)
    }

    pub(crate) fn string_of(&self, meta: &ValueMeta, v: &Value) -> RowResult<Option<String>> {
        let text = match v {
            Value::Null => return Ok(None),
            Value::String(s) => meta.trim_type().apply(s).to_string(),
            Value::Integer(i) => self.number_mask(meta, v, ValueType::Integer)?.format_i64(*i),
            Value::Number(f) => self.number_mask(meta, v, ValueType::Number)?.format_f64(*f),
            Value::BigNumber(b) => {
                if meta.format_rules().is_big_number_formatting() {
                    self.number_mask(meta, v, ValueType::BigNumber)?.format_big(b)
                } else {
                    b.to_string()
                }
            }
            Value::Date(d) => self
                .date_mask(meta, v, ValueType::Date)?
                .format(d, self.zone_of(meta.format_rules())),
            Value::Timestamp(d) => self
                .date_mask(meta, v, ValueType::Timestamp)?
                .format(d, self.zone_of(meta.format_rules())),
            Value::Boolean(b) => format_boolean(meta, *b).to_string(),
            Value::Binary(bytes) => self.decode_text(meta, bytes)?,
            Value::Serializable(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        Ok(Some(pad_output(meta, v, text)))
    }

    pub(crate) fn integer_of(&self, meta: &ValueMeta, v: &Value) -> RowResult<Option<i64>> {
        let target = ValueType::Integer;
        Ok(Some(match v {
            Value::Null => return Ok(None),
            Value::Integer(i) => *i,
            Value::Number(f) => {
                let rounded = (f + 0.5).floor();
                if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                    return Err(conversion_error(meta, v, target, "value out of range"));
                }
                rounded as i64
            }
            Value::BigNumber(b) => DecimalDigits::from_big(b)
                .to_i64_truncated()
                .ok_or_else(|| conversion_error(meta, v, target, "value out of range"))?,
            Value::String(s) => match self.trimmed(meta, s) {
                None => return Ok(None),
                Some(text) => self.parse_integer(meta, text)?,
            },
            Value::Date(d) | Value::Timestamp(d) => d.timestamp_millis(),
            Value::Boolean(b) => *b as i64,
            Value::Binary(_) | Value::Serializable(_) => {
                return Err(conversion_error(meta, v, target, "no integer representation"))
            }
        }))
    }

    pub(crate) fn number_of(&self, meta: &ValueMeta, v: &Value) -> RowResult<Option<f64>> {
        let target = ValueType::Number;
        Ok(Some(match v {
            Value::Null => return Ok(None),
            Value::Number(f) => *f,
            Value::Integer(i) => *i as f64,
            Value::BigNumber(b) => b
                .to_f64()
                .ok_or_else(|| conversion_error(meta, v, target, "value out of range"))?,
            Value::String(s) => match self.trimmed(meta, s) {
                None => return Ok(None),
                Some(text) => self.parse_number(meta, text)?,
            },
            Value::Date(d) | Value::Timestamp(d) => d.timestamp_millis() as f64,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Binary(_) | Value::Serializable(_) => {
                return Err(conversion_error(meta, v, target, "no numeric representation"))
            }
        }))
    }

    pub(crate) fn big_number_of(
        &self,
        meta: &ValueMeta,
        v: &Value,
    ) -> RowResult<Option<BigDecimal>> {
        let target = ValueType::BigNumber;
        Ok(Some(match v {
            Value::Null => return Ok(None),
            Value::BigNumber(b) => b.clone(),
            Value::Integer(i) => BigDecimal::from(*i),
            Value::Number(f) => DecimalDigits::from_f64(*f)
                .map(|d| d.to_big())
                .ok_or_else(|| conversion_error(meta, v, target, "value is not finite"))?,
            Value::String(s) => match self.trimmed(meta, s) {
                None => return Ok(None),
                Some(text) => self.parse_big_number(meta, text)?,
            },
            Value::Date(d) | Value::Timestamp(d) => BigDecimal::from(d.timestamp_millis()),
            Value::Boolean(b) => BigDecimal::from(*b as i64),
            Value::Binary(_) | Value::Serializable(_) => {
                return Err(conversion_error(meta, v, target, "no numeric representation"))
            }
        }))
    }

    pub(crate) fn boolean_of(&self, meta: &ValueMeta, v: &Value) -> RowResult<Option<bool>> {
        Ok(Some(match v {
            Value::Null => return Ok(None),
            Value::Boolean(b) => *b,
            Value::String(s) => match self.trimmed(meta, s) {
                None => return Ok(None),
                Some(text) => parse_boolean(text),
            },
            Value::Integer(i) => *i != 0,
            Value::Number(f) => (*f as i64) != 0,
            Value::BigNumber(b) => !b.is_zero(),
            other => {
                return Err(conversion_error(
                    meta,
                    other,
                    ValueType::Boolean,
                    "no boolean representation",
                ))
            }
        }))
    }

    pub(crate) fn date_of(
        &self,
        meta: &ValueMeta,
        v: &Value,
        kind: ValueType,
    ) -> RowResult<Option<DateTime<Utc>>> {
        let from_millis = |ms: Option<i64>| {
            ms.and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or_else(|| conversion_error(meta, v, kind, "value out of range"))
        };
        Ok(Some(match v {
            Value::Null => return Ok(None),
            Value::Date(d) | Value::Timestamp(d) => *d,
            Value::Integer(i) => from_millis(Some(*i))?,
            Value::Number(f) => from_millis(f.is_finite().then(|| *f as i64))?,
            Value::BigNumber(b) => from_millis(DecimalDigits::from_big(b).to_i64_truncated())?,
            Value::String(s) => match self.trimmed(meta, s) {
                None => return Ok(None),
                Some(text) => self.parse_date(meta, text, kind)?,
            },
            other => {
                return Err(conversion_error(meta, other, kind, "no date representation"))
            }
        }))
    }

    pub(crate) fn binary_of(&self, meta: &ValueMeta, v: &Value) -> RowResult<Option<Arc<[u8]>>> {
        match v {
            Value::Null => Ok(None),
            Value::Binary(b) => Ok(Some(b.clone())),
            Value::Serializable(_) => Err(conversion_error(
                meta,
                v,
                ValueType::Binary,
                "serializable values have no binary representation",
            )),
            other => match self.string_of(meta, other)? {
                Some(text) => self.encode_text(meta, &text).map(Some),
                None => Ok(None),
            },
        }
    }

    /// 按描述符的裁剪方式处理文本，空文本视为 `None`
    fn trimmed<'a>(&self, meta: &ValueMeta, text: &'a str) -> Option<&'a str> {
        let t = meta.trim_type().apply(text);
        if t.is_empty() {
            None
        } else {
            Some(t)
        }
    }

    // ---------------------------------------------------------------
    // 文本解析
    // ---------------------------------------------------------------

    fn parse_digits(&self, meta: &ValueMeta, text: &str, kind: ValueType) -> RowResult<DecimalDigits> {
        let mask = self.number_mask(meta, &text, kind)?;
        let lenient = self.lenient_numbers(meta.format_rules());
        mask.parse(text, lenient)
            .map_err(|reason| conversion_error(meta, &text, kind, reason))
    }

    fn parse_integer(&self, meta: &ValueMeta, text: &str) -> RowResult<i64> {
        self.parse_digits(meta, text, ValueType::Integer)?
            .to_i64_truncated()
            .ok_or_else(|| conversion_error(meta, &text, ValueType::Integer, "value out of range"))
    }

    fn parse_number(&self, meta: &ValueMeta, text: &str) -> RowResult<f64> {
        Ok(self.parse_digits(meta, text, ValueType::Number)?.to_f64())
    }

    fn parse_big_number(&self, meta: &ValueMeta, text: &str) -> RowResult<BigDecimal> {
        match self.parse_digits(meta, text, ValueType::BigNumber) {
            Ok(d) => Ok(d.to_big()),
            Err(err) => BigDecimal::from_str(text).map_err(|_| err),
        }
    }

    fn parse_date(&self, meta: &ValueMeta, text: &str, kind: ValueType) -> RowResult<DateTime<Utc>> {
        let rules = meta.format_rules();
        let mask = self.date_mask(meta, &text, kind)?;
        mask.parse(text, self.zone_of(rules), rules.is_date_format_lenient())
            .map_err(|reason| conversion_error(meta, &text, kind, reason))
    }

    // ---------------------------------------------------------------
    // 跨类型转换
    // ---------------------------------------------------------------

    /// 把某个描述符下的值转为指定逻辑类型（NORMAL 存储）
    pub fn convert_to_type(
        &self,
        target: ValueType,
        source: &ValueMeta,
        raw: &Value,
    ) -> RowResult<Value> {
        let native = self.native(source, raw)?;
        self.convert_native_to_type(target, source, &native)
    }

    /// 同上，但 `v` 已经是逻辑值，不再按存储方式解码
    pub(crate) fn convert_native_to_type(
        &self,
        target: ValueType,
        source: &ValueMeta,
        v: &Value,
    ) -> RowResult<Value> {
        let converted = match target {
            ValueType::String => self.string_of(source, v)?.map(Value::String),
            ValueType::Integer => self.integer_of(source, v)?.map(Value::Integer),
            ValueType::Number => self.number_of(source, v)?.map(Value::Number),
            ValueType::BigNumber => self.big_number_of(source, v)?.map(Value::BigNumber),
            ValueType::Boolean => self.boolean_of(source, v)?.map(Value::Boolean),
            ValueType::Date => self.date_of(source, v, target)?.map(Value::Date),
            ValueType::Timestamp => self.date_of(source, v, target)?.map(Value::Timestamp),
            ValueType::Binary => self.binary_of(source, v)?.map(Value::Binary),
            ValueType::Serializable => match v {
                Value::Null => None,
                Value::Serializable(b) | Value::Binary(b) => Some(Value::Serializable(b.clone())),
                other => {
                    return Err(conversion_error(
                        source,
                        other,
                        target,
                        "only byte payloads convert to serializable",
                    ))
                }
            },
        };
        Ok(converted.unwrap_or(Value::Null))
    }

    /// 把 `source` 描述的值转换为 `target` 描述的逻辑类型
    ///
    /// 逻辑类型相同时只做存储方式归一；任一侧为字符串时经由文本转换，
    /// 源端按自己的规则格式化，目标端按自己的规则解析；其余情况直接做数值/日期转换。
    pub fn convert_between(
        &self,
        target: &ValueMeta,
        source: &ValueMeta,
        raw: &Value,
    ) -> RowResult<Value> {
        let native = self.native(source, raw)?;
        if native.is_null() {
            return Ok(Value::Null);
        }
        if target.value_type() == source.value_type() {
            return Ok(native.into_owned());
        }
        if source.value_type() == ValueType::String {
            return match self.string_of(source, &native)? {
                Some(text) => self.parse_from_string(target, &text),
                None => Ok(Value::Null),
            };
        }
        self.convert_native_to_type(target.value_type(), source, &native)
    }

    /// 按描述符的规则把值格式化为文本；空值返回空值文本
    pub fn convert_to_string(&self, meta: &ValueMeta, raw: &Value) -> RowResult<String> {
        match self.get_string(meta, raw)? {
            Some(text) => Ok(text),
            None => Ok(self.null_representation(meta).to_string()),
        }
    }

    /// 空值的文本表示
    pub fn null_representation<'a>(&'a self, meta: &'a ValueMeta) -> &'a str {
        match meta.null_string() {
            Some(s) => s,
            None if meta.value_type() == ValueType::String => "",
            None => &self.config.null_string,
        }
    }

    /// 按描述符的规则把文本解析为描述符的逻辑类型
    pub fn parse_from_string(&self, meta: &ValueMeta, text: &str) -> RowResult<Value> {
        let trimmed = meta.trim_type().apply(text);
        if trimmed.is_empty() {
            if meta.value_type() == ValueType::String && self.empty_differs_from_null() {
                return Ok(Value::String(String::new()));
            }
            return Ok(Value::Null);
        }
        Ok(match meta.value_type() {
            ValueType::String => Value::String(trimmed.to_string()),
            ValueType::Integer => Value::Integer(self.parse_integer(meta, trimmed)?),
            ValueType::Number => Value::Number(self.parse_number(meta, trimmed)?),
            ValueType::BigNumber => Value::BigNumber(self.parse_big_number(meta, trimmed)?),
            ValueType::Boolean => Value::Boolean(parse_boolean(trimmed)),
            ValueType::Date => Value::Date(self.parse_date(meta, trimmed, ValueType::Date)?),
            ValueType::Timestamp => {
                Value::Timestamp(self.parse_date(meta, trimmed, ValueType::Timestamp)?)
            }
            ValueType::Binary => Value::Binary(self.encode_text(meta, trimmed)?),
            ValueType::Serializable => Value::serializable(trimmed.as_bytes()),
        })
    }

    /// 读取外部文本时的完整处理：替换空值、识别“空值标记”、裁剪后解析
    ///
    /// `rules` 是描述输入文本格式的字符串描述符，`target` 是期望的逻辑类型。
    pub fn convert_data_from_string(
        &self,
        rules: &ValueMeta,
        text: Option<&str>,
        target: ValueType,
        null_if: Option<&str>,
        if_null: Option<&str>,
        trim: TrimType,
    ) -> RowResult<Value> {
        let mut text = text;
        if text.map_or(true, str::is_empty) {
            if let Some(replacement) = if_null.filter(|s| !s.is_empty()) {
                text = Some(replacement);
            }
        }
        let text = match text {
            None => return Ok(Value::Null),
            Some(t) => t,
        };
        if let Some(marker) = null_if.filter(|s| !s.is_empty()) {
            if trim.apply(text).eq_ignore_ascii_case(trim.apply(marker)) {
                return Ok(Value::Null);
            }
        }
        let trimmed = trim.apply(text);
        if trimmed.is_empty() {
            if target == ValueType::String && self.empty_differs_from_null() {
                return Ok(Value::String(String::new()));
            }
            return Ok(Value::Null);
        }
        if target == ValueType::String {
            return Ok(Value::String(trimmed.to_string()));
        }
        self.convert_to_type(target, rules, &Value::String(trimmed.to_string()))
    }

    /// 用描述符的转换描述符解析文本值
    pub fn convert_using_conversion_metadata(
        &self,
        meta: &ValueMeta,
        raw: &Value,
    ) -> RowResult<Value> {
        let conversion = meta.conversion_metadata().ok_or_else(|| {
            RowError::structural(format!("'{}' has no conversion metadata", meta.name()))
        })?;
        self.convert_to_type(meta.value_type(), conversion, raw)
    }
}

impl Default for ValueConverter {
    fn default() -> Self {
        let config = ConversionConfig::default();
        Self {
            masks: MaskCache::new(config.mask_cache_capacity),
            default_zone: zone::utc(),
            config,
        }
    }
}

impl std::fmt::Debug for ValueConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueConverter")
            .field("default_zone", &self.default_zone)
            .field("masks", &self.masks)
            .finish()
    }
}

fn length_integer_pattern(length: i32) -> String {
    let zeros = "0".repeat(length.max(0) as usize);
    format!(" {};-{}", zeros, zeros)
}

fn length_number_pattern(length: i32, precision: i32) -> String {
    let length = length.max(0) as usize;
    let mut positive: Vec<char> = vec![' '];
    if precision < 0 {
        positive.extend(std::iter::repeat('0').take(length));
        positive.extend(".00".chars());
    } else {
        positive.extend(std::iter::repeat('0').take(length + 1));
        let pos = length as i64 - precision as i64 + 1;
        if pos >= 0 && (pos as usize) < positive.len() {
            positive[pos as usize] = '.';
        }
    }
    let positive: String = positive.into_iter().collect();
    format!("{};-{}", positive, &positive[1..])
}

fn format_boolean(meta: &ValueMeta, value: bool) -> &'static str {
    match (meta.length() >= 3, value) {
        (true, true) => "true",
        (true, false) => "false",
        (false, true) => "Y",
        (false, false) => "N",
    }
}

fn parse_boolean(text: &str) -> bool {
    text.eq_ignore_ascii_case("Y")
        || text.eq_ignore_ascii_case("TRUE")
        || text.eq_ignore_ascii_case("YES")
        || text == "1"
}

/// 开启输出填充时把文本补齐到描述符长度：字符串右侧补空格，其余左侧补空格
fn pad_output(meta: &ValueMeta, v: &Value, text: String) -> String {
    if !meta.is_output_padding() || meta.length() <= 0 {
        return text;
    }
    let width = meta.length() as usize;
    let len = text.chars().count();
    if len >= width {
        return text;
    }
    let fill = " ".repeat(width - len);
    if matches!(v, Value::String(_)) {
        text + &fill
    } else {
        fill + &text
    }
}
