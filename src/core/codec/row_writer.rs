//! RowWriter - 二进制编码器

use num_bigint::Sign;

use super::{EMPTY_ROW_MARKER, NULL_FLAG, PRESENT_FLAG};
use crate::core::error::{RowError, RowResult};
use crate::core::meta::ValueMeta;
use crate::core::row::RowLayout;
use crate::core::value::Value;

pub struct RowWriter<'a> {
    layout: &'a RowLayout,
    buffer: &'a mut Vec<u8>,
}

impl<'a> RowWriter<'a> {
    pub fn new(layout: &'a RowLayout, buffer: &'a mut Vec<u8>) -> Self {
        Self { layout, buffer }
    }

    /// 写入一行；行比布局短时缺失的位置按空值写入
    pub fn write_row(&mut self, row: &[Value]) -> RowResult<()> {
        if self.layout.is_empty() {
            self.buffer.push(EMPTY_ROW_MARKER);
            return Ok(());
        }
        let layout = self.layout;
        for (position, meta) in layout.descriptors().enumerate() {
            match row.get(position) {
                Some(raw) => self.write_field(&meta.read(), raw)?,
                None => self.write_field(&meta.read(), &Value::Null)?,
            }
        }
        Ok(())
    }

    fn write_field(&mut self, meta: &ValueMeta, raw: &Value) -> RowResult<()> {
        let value = self
            .layout
            .converter()
            .convert_to_type(meta.value_type(), meta, raw)?;

        match &value {
            Value::Null => {
                self.buffer.push(NULL_FLAG);
                return Ok(());
            }
            _ => self.buffer.push(PRESENT_FLAG),
        }

        match value {
            Value::Null => {}
            Value::String(s) => self.write_bytes(meta, s.as_bytes())?,
            Value::Binary(b) | Value::Serializable(b) => self.write_bytes(meta, &b)?,
            Value::Integer(i) => self.write_i64(i),
            Value::Number(f) => self.buffer.extend_from_slice(&f.to_bits().to_be_bytes()),
            Value::BigNumber(b) => {
                let (unscaled, scale) = b.as_bigint_and_exponent();
                let scale = i32::try_from(scale).map_err(|_| {
                    RowError::structural(format!(
                        "scale {} of field '{}' does not fit the row format",
                        scale,
                        meta.name()
                    ))
                })?;
                let (sign, magnitude) = unscaled.to_bytes_be();
                self.buffer.push(match sign {
                    Sign::Minus => 0xFF,
                    Sign::NoSign => 0,
                    Sign::Plus => 1,
                });
                self.buffer.extend_from_slice(&scale.to_be_bytes());
                self.write_bytes(meta, &magnitude)?;
            }
            Value::Date(d) => self.write_i64(d.timestamp_millis()),
            Value::Timestamp(d) => {
                self.write_i64(d.timestamp_millis());
                let sub_millis = (d.timestamp_subsec_nanos() % 1_000_000) as i32;
                self.buffer.extend_from_slice(&sub_millis.to_be_bytes());
            }
            Value::Boolean(b) => self.buffer.push(u8::from(b)),
        }
        Ok(())
    }

    fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    fn write_bytes(&mut self, meta: &ValueMeta, bytes: &[u8]) -> RowResult<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| {
            RowError::structural(format!(
                "field '{}' payload of {} bytes is too large",
                meta.name(),
                bytes.len()
            ))
        })?;
        self.buffer.extend_from_slice(&len.to_be_bytes());
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }
}
