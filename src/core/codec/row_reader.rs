//! RowReader - 二进制解码器

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use num_bigint::{BigInt, Sign};
use std::io::{self, Read};

use super::{EMPTY_ROW_MARKER, NULL_FLAG, PRESENT_FLAG};
use crate::core::error::{RowError, RowResult};
use crate::core::meta::ValueMeta;
use crate::core::row::RowLayout;
use crate::core::value::{Row, Value, ValueType};

pub struct RowReader<'a, R: Read> {
    layout: &'a RowLayout,
    input: R,
}

impl<'a, R: Read> RowReader<'a, R> {
    pub fn new(layout: &'a RowLayout, input: R) -> Self {
        Self { layout, input }
    }

    /// 读取一行，值按描述符的存储方式还原
    pub fn read_row(&mut self) -> RowResult<Row> {
        if self.layout.is_empty() {
            let marker = self.read_u8("<row marker>")?;
            if marker != EMPTY_ROW_MARKER {
                return Err(corrupt(format!("unexpected empty row marker {:#04x}", marker)));
            }
            return Ok(Row::new());
        }
        let layout = self.layout;
        let mut row = Vec::with_capacity(layout.len());
        for (position, meta) in layout.descriptors().enumerate() {
            let meta = meta.read();
            let field = field_label(&meta, position);
            let logical = self.read_field(&meta, &field)?;
            row.push(layout.converter().convert_to_storage(&meta, &logical)?);
        }
        Ok(row)
    }

    fn read_field(&mut self, meta: &ValueMeta, field: &str) -> RowResult<Value> {
        match self.read_u8(field)? {
            NULL_FLAG => return Ok(Value::Null),
            PRESENT_FLAG => {}
            other => {
                return Err(corrupt(format!(
                    "invalid null flag {:#04x} for field '{}'",
                    other, field
                )))
            }
        }

        Ok(match meta.value_type() {
            ValueType::String => {
                let bytes = self.read_bytes(field)?;
                let text = String::from_utf8(bytes).map_err(|e| {
                    corrupt(format!("field '{}' is not valid UTF-8: {}", field, e))
                })?;
                Value::String(text)
            }
            ValueType::Binary => Value::binary(self.read_bytes(field)?),
            ValueType::Serializable => Value::serializable(self.read_bytes(field)?),
            ValueType::Integer => Value::Integer(self.read_i64(field)?),
            ValueType::Number => Value::Number(f64::from_bits(self.read_i64(field)? as u64)),
            ValueType::BigNumber => {
                let sign = match self.read_u8(field)? {
                    0xFF => Sign::Minus,
                    0 => Sign::NoSign,
                    1 => Sign::Plus,
                    other => {
                        return Err(corrupt(format!(
                            "invalid sign byte {:#04x} for field '{}'",
                            other, field
                        )))
                    }
                };
                let scale = self.read_i32(field)?;
                let magnitude = self.read_bytes(field)?;
                let unscaled = BigInt::from_bytes_be(sign, &magnitude);
                Value::BigNumber(BigDecimal::new(unscaled, i64::from(scale)))
            }
            ValueType::Date => Value::Date(self.read_millis(field)?),
            ValueType::Timestamp => {
                let base = self.read_millis(field)?;
                let sub_millis = self.read_i32(field)?;
                Value::Timestamp(base + Duration::nanoseconds(i64::from(sub_millis)))
            }
            ValueType::Boolean => Value::Boolean(self.read_u8(field)? != 0),
        })
    }

    fn read_exact(&mut self, buf: &mut [u8], field: &str) -> RowResult<()> {
        self.input.read_exact(buf).map_err(|e| truncated(e, field))
    }

    fn read_u8(&mut self, field: &str) -> RowResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf, field)?;
        Ok(buf[0])
    }

    fn read_i32(&mut self, field: &str) -> RowResult<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, field)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_i64(&mut self, field: &str) -> RowResult<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf, field)?;
        Ok(i64::from_be_bytes(buf))
    }

    fn read_millis(&mut self, field: &str) -> RowResult<DateTime<Utc>> {
        let millis = self.read_i64(field)?;
        DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| corrupt(format!("timestamp {} of field '{}' out of range", millis, field)))
    }

    /// u32 长度前缀 + 字节；按实际读到的数据分配，长度字段损坏时不会预先申请巨大内存
    fn read_bytes(&mut self, field: &str) -> RowResult<Vec<u8>> {
        let len = self.read_i32(field)? as u32 as u64;
        let mut bytes = Vec::new();
        (&mut self.input)
            .take(len)
            .read_to_end(&mut bytes)
            .map_err(|e| truncated(e, field))?;
        if (bytes.len() as u64) < len {
            return Err(RowError::TruncatedStream {
                field: field.to_string(),
            });
        }
        Ok(bytes)
    }
}

fn field_label(meta: &ValueMeta, position: usize) -> String {
    if meta.has_name() {
        meta.name().to_string()
    } else {
        format!("#{}", position)
    }
}

fn truncated(e: io::Error, field: &str) -> RowError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        RowError::TruncatedStream {
            field: field.to_string(),
        }
    } else {
        RowError::Io(e)
    }
}

fn corrupt(message: String) -> RowError {
    RowError::Io(io::Error::new(io::ErrorKind::InvalidData, message))
}
