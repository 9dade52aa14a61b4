//! 比较、空值判断与哈希
//!
//! 三者都基于逻辑值：BINARY_STRING 存储的整数与 NORMAL 存储的同值整数
//! 比较相等、哈希相同。

use std::cmp::Ordering;
use std::hash::Hasher;

use super::converter::{conversion_error, ValueConverter};
use crate::core::error::RowResult;
use crate::core::format::DecimalDigits;
use crate::core::meta::ValueMeta;
use crate::core::value::{StorageType, StableHasher, Value, ValueType};

impl ValueConverter {
    /// 值在该描述符下是否为空
    ///
    /// 空字节的 BINARY_STRING 值、裁剪或解析后为空的值都算空；
    /// 未开启“空串不等于空值”时，空字符串也算空。
    pub fn is_null(&self, meta: &ValueMeta, raw: &Value) -> RowResult<bool> {
        if raw.is_null() {
            return Ok(true);
        }
        if meta.storage_type() == StorageType::BinaryString {
            if let Value::Binary(bytes) = raw {
                if bytes.is_empty() && !self.config().empty_string_differs_from_null {
                    return Ok(true);
                }
            }
        }
        let native = self.native(meta, raw)?;
        Ok(self.native_is_null(meta, &native))
    }

    fn native_is_null(&self, meta: &ValueMeta, v: &Value) -> bool {
        match v {
            Value::Null => true,
            _ if self.config().empty_string_differs_from_null => false,
            Value::String(s) => meta.value_type() == ValueType::String && s.is_empty(),
            _ => false,
        }
    }

    /// 按描述符比较两个值
    ///
    /// 空值小于任何非空值，两个空值相等；`sorted_descending` 时结果整体反转。
    pub fn compare(&self, meta: &ValueMeta, a: &Value, b: &Value) -> RowResult<Ordering> {
        let na = self.native(meta, a)?;
        let nb = self.native(meta, b)?;
        self.compare_native(meta, &na, &nb)
    }

    /// 比较两个分别由不同描述符描述的值
    ///
    /// 逻辑类型不同时，先把 `b` 转换为 `meta_a` 的类型，再按 `meta_a` 比较；
    /// 整数与浮点数按浮点数比较。
    pub fn compare_with(
        &self,
        meta_a: &ValueMeta,
        a: &Value,
        meta_b: &ValueMeta,
        b: &Value,
    ) -> RowResult<Ordering> {
        let na = self.native(meta_a, a)?;
        if meta_a.value_type() == meta_b.value_type() {
            let nb = self.native(meta_b, b)?;
            return self.compare_native(meta_a, &na, &nb);
        }
        if meta_a.value_type() == ValueType::Integer && meta_b.value_type() == ValueType::Number {
            let nb = self.native(meta_b, b)?;
            let x = self.number_of(meta_a, &na)?.map(Value::Number).unwrap_or(Value::Null);
            let y = self.number_of(meta_b, &nb)?.map(Value::Number).unwrap_or(Value::Null);
            return self.compare_native(meta_b, &x, &y);
        }
        let converted = self.convert_between(meta_a, meta_b, b)?;
        self.compare_native(meta_a, &na, &converted)
    }

    pub(crate) fn compare_native(
        &self,
        meta: &ValueMeta,
        a: &Value,
        b: &Value,
    ) -> RowResult<Ordering> {
        let ordering = match (self.native_is_null(meta, a), self.native_is_null(meta, b)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare_non_null(meta, a, b)?,
        };
        Ok(if meta.is_sorted_descending() {
            ordering.reverse()
        } else {
            ordering
        })
    }

    fn compare_non_null(&self, meta: &ValueMeta, a: &Value, b: &Value) -> RowResult<Ordering> {
        Ok(match meta.value_type() {
            ValueType::String => {
                let x = self.string_of(meta, a)?.unwrap_or_default();
                let y = self.string_of(meta, b)?.unwrap_or_default();
                if meta.is_case_insensitive() {
                    x.to_lowercase().cmp(&y.to_lowercase())
                } else {
                    x.cmp(&y)
                }
            }
            ValueType::Integer => self.integer_of(meta, a)?.cmp(&self.integer_of(meta, b)?),
            ValueType::Number => {
                let x = self.number_of(meta, a)?.unwrap_or_default();
                let y = self.number_of(meta, b)?.unwrap_or_default();
                x.total_cmp(&y)
            }
            ValueType::BigNumber => self
                .big_number_of(meta, a)?
                .cmp(&self.big_number_of(meta, b)?),
            ValueType::Date => self
                .date_of(meta, a, ValueType::Date)?
                .cmp(&self.date_of(meta, b, ValueType::Date)?),
            ValueType::Timestamp => self
                .date_of(meta, a, ValueType::Timestamp)?
                .cmp(&self.date_of(meta, b, ValueType::Timestamp)?),
            ValueType::Boolean => self.boolean_of(meta, a)?.cmp(&self.boolean_of(meta, b)?),
            ValueType::Binary => {
                let x = self.binary_of(meta, a)?.unwrap_or_else(|| Vec::new().into());
                let y = self.binary_of(meta, b)?.unwrap_or_else(|| Vec::new().into());
                x.len().cmp(&y.len()).then_with(|| x.cmp(&y))
            }
            ValueType::Serializable => {
                return Err(conversion_error(
                    meta,
                    a,
                    ValueType::Serializable,
                    "serializable values can not be compared",
                ))
            }
        })
    }

    /// 值的稳定哈希，与 [`ValueConverter::compare`] 的相等关系一致
    pub fn hash_value(&self, meta: &ValueMeta, raw: &Value) -> RowResult<u32> {
        let mut hasher = StableHasher::new();
        let native = self.native(meta, raw)?;
        if self.native_is_null(meta, &native) {
            hasher.write_u8(0);
            return Ok(hasher.finish_u32());
        }
        hasher.write_u8(meta.value_type().id());

        match meta.value_type() {
            ValueType::String => {
                let s = self.string_of(meta, &native)?.unwrap_or_default();
                if meta.is_case_insensitive() {
                    hasher.write(s.to_lowercase().as_bytes());
                } else {
                    hasher.write(s.as_bytes());
                }
            }
            ValueType::Integer => {
                hasher.write_i64(self.integer_of(meta, &native)?.unwrap_or_default());
            }
            ValueType::Number => {
                let f = self.number_of(meta, &native)?.unwrap_or_default();
                hasher.write_u64(f.to_bits());
            }
            ValueType::BigNumber => {
                if let Some(b) = self.big_number_of(meta, &native)? {
                    let digits = DecimalDigits::from_big(&b);
                    hasher.write_u8(digits.negative as u8);
                    hasher.write(&digits.digits);
                    hasher.write_i64(digits.point as i64);
                }
            }
            ValueType::Date | ValueType::Timestamp => {
                if let Some(d) = self.date_of(meta, &native, meta.value_type())? {
                    hasher.write_i64(d.timestamp());
                    hasher.write_u32(d.timestamp_subsec_nanos());
                }
            }
            ValueType::Boolean => {
                hasher.write_u8(self.boolean_of(meta, &native)?.unwrap_or_default() as u8);
            }
            ValueType::Binary => {
                if let Some(bytes) = self.binary_of(meta, &native)? {
                    hasher.write(&bytes);
                }
            }
            ValueType::Serializable => {
                if let Some(bytes) = native.as_bytes() {
                    hasher.write(bytes);
                }
            }
        }
        Ok(hasher.finish_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn lazy_integer() -> ValueMeta {
        let mut meta = ValueMeta::new("qty", ValueType::Integer);
        meta.set_binary_string_storage(ValueMeta::new("qty", ValueType::String));
        meta
    }

    #[test]
    fn test_nulls_order_first() {
        let c = ValueConverter::default();
        let meta = ValueMeta::new("i", ValueType::Integer);
        assert_eq!(c.compare(&meta, &Value::Null, &Value::Null).unwrap(), Ordering::Equal);
        assert_eq!(c.compare(&meta, &Value::Null, &Value::Integer(1)).unwrap(), Ordering::Less);
        assert_eq!(c.compare(&meta, &Value::Integer(1), &Value::Null).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_descending_reverses_including_nulls() {
        let c = ValueConverter::default();
        let mut meta = ValueMeta::new("i", ValueType::Integer);
        meta.set_sorted_descending(true);
        assert_eq!(c.compare(&meta, &Value::Integer(1), &Value::Integer(2)).unwrap(), Ordering::Greater);
        assert_eq!(c.compare(&meta, &Value::Null, &Value::Integer(1)).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_case_insensitive_strings() {
        let c = ValueConverter::default();
        let mut meta = ValueMeta::new("s", ValueType::String);
        assert_ne!(c.compare(&meta, &Value::from("abc"), &Value::from("ABC")).unwrap(), Ordering::Equal);
        meta.set_case_insensitive(true);
        assert_eq!(c.compare(&meta, &Value::from("abc"), &Value::from("ABC")).unwrap(), Ordering::Equal);
        assert_eq!(
            c.hash_value(&meta, &Value::from("abc")).unwrap(),
            c.hash_value(&meta, &Value::from("ABC")).unwrap()
        );
    }

    #[test]
    fn test_empty_string_is_null() {
        let c = ValueConverter::default();
        let meta = ValueMeta::new("s", ValueType::String);
        assert!(c.is_null(&meta, &Value::from("")).unwrap());
        assert!(!c.is_null(&meta, &Value::from(" ")).unwrap());
        assert_eq!(c.compare(&meta, &Value::from(""), &Value::Null).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_storage_independent_compare_and_hash() {
        let c = ValueConverter::default();
        let lazy = lazy_integer();
        let plain = ValueMeta::new("qty", ValueType::Integer);
        let raw = Value::binary(b"12345".to_vec());

        assert_eq!(
            c.compare_with(&lazy, &raw, &plain, &Value::Integer(12345)).unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            c.hash_value(&lazy, &raw).unwrap(),
            c.hash_value(&plain, &Value::Integer(12345)).unwrap()
        );
    }

    #[test]
    fn test_compare_with_mixed_types() {
        let c = ValueConverter::default();
        let int = ValueMeta::new("i", ValueType::Integer);
        let num = ValueMeta::new("n", ValueType::Number);
        assert_eq!(
            c.compare_with(&int, &Value::Integer(2), &num, &Value::Number(2.5)).unwrap(),
            Ordering::Less
        );
        let s = ValueMeta::new("s", ValueType::String);
        assert_eq!(
            c.compare_with(&int, &Value::Integer(10), &s, &Value::from("9")).unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn test_big_number_scale_does_not_matter() {
        let c = ValueConverter::default();
        let meta = ValueMeta::new("b", ValueType::BigNumber);
        let a = Value::BigNumber(BigDecimal::from_str("1.50").unwrap());
        let b = Value::BigNumber(BigDecimal::from_str("1.5").unwrap());
        assert_eq!(c.compare(&meta, &a, &b).unwrap(), Ordering::Equal);
        assert_eq!(c.hash_value(&meta, &a).unwrap(), c.hash_value(&meta, &b).unwrap());
    }

    #[test]
    fn test_binary_orders_by_length_first() {
        let c = ValueConverter::default();
        let meta = ValueMeta::new("b", ValueType::Binary);
        let short = Value::binary(vec![9u8]);
        let long = Value::binary(vec![0u8, 0]);
        assert_eq!(c.compare(&meta, &short, &long).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_serializable_not_comparable() {
        let c = ValueConverter::default();
        let meta = ValueMeta::new("o", ValueType::Serializable);
        let v = Value::serializable(vec![1u8]);
        assert!(c.compare(&meta, &v, &v).is_err());
        assert!(c.hash_value(&meta, &v).is_ok());
    }
}
