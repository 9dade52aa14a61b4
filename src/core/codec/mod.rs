//! Codec 模块 - 行的二进制编解码
//!
//! 按 [`RowLayout`] 逐个位置编码行，用于跨线程/进程传递行数据。
//!
//! ## 架构
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │            codec::mod.rs            │
//! │   encode / decode 及多行批量接口     │
//! └─────────────────────────────────────┘
//!              │
//!        ┌─────┴──────┐
//!        ▼            ▼
//!   ┌──────────┐ ┌──────────┐
//!   │row_writer│ │row_reader│
//!   └──────────┘ └──────────┘
//! ```
//!
//! ## 二进制格式
//!
//! 每个位置依次写入：
//! - NULL标记：1字节，`1` 表示空值，之后没有负载
//! - 负载（大端序）：
//!   - String / Binary / Serializable：u32 长度 + 字节
//!   - Integer：i64
//!   - Number：f64 位模式
//!   - BigNumber：符号字节 + i32 scale + u32 长度 + 大整数绝对值字节
//!   - Date：i64 纪元毫秒
//!   - Timestamp：i64 纪元毫秒 + i32 亚毫秒纳秒
//!   - Boolean：1字节
//!
//! 布局为空时只写一个值为 `1` 的标记字节。
//!
//! 编码的是逻辑值，与存储方式无关：同一逻辑值的 BINARY_STRING 和 NORMAL
//! 存储得到相同的字节。解码时按描述符的存储方式还原。
//!
//! ## 使用示例
//!
//! ```ignore
//! use rowmeta::core::codec;
//!
//! let bytes = codec::encode(&layout, &row)?;
//! let back = codec::decode(&layout, &bytes)?;
//! ```

pub mod row_reader;
pub mod row_writer;

pub use row_reader::RowReader;
pub use row_writer::RowWriter;

use std::io::{Cursor, Read};

use crate::core::error::RowResult;
use crate::core::row::RowLayout;
use crate::core::value::{Row, Value};

pub(crate) const NULL_FLAG: u8 = 1;
pub(crate) const PRESENT_FLAG: u8 = 0;
pub(crate) const EMPTY_ROW_MARKER: u8 = 1;

/// 编码一行
pub fn encode(layout: &RowLayout, row: &[Value]) -> RowResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(layout, row, &mut out)?;
    Ok(out)
}

/// 编码一行并追加到 `out`
pub fn encode_into(layout: &RowLayout, row: &[Value], out: &mut Vec<u8>) -> RowResult<()> {
    log::trace!("encoding row of {} fields", layout.len());
    RowWriter::new(layout, out).write_row(row)
}

/// 从字节中解码一行，多余的字节被忽略
pub fn decode(layout: &RowLayout, bytes: &[u8]) -> RowResult<Row> {
    let mut input = bytes;
    decode_from(layout, &mut input)
}

/// 从流中解码一行
pub fn decode_from<R: Read>(layout: &RowLayout, input: &mut R) -> RowResult<Row> {
    log::trace!("decoding row of {} fields", layout.len());
    RowReader::new(layout, input).read_row()
}

/// 把多行依次编码到同一个缓冲区
pub fn encode_rows<R: AsRef<[Value]>>(layout: &RowLayout, rows: &[R]) -> RowResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut writer = RowWriter::new(layout, &mut out);
    for row in rows {
        writer.write_row(row.as_ref())?;
    }
    Ok(out)
}

/// 解码 [`encode_rows`] 的输出
///
/// 数据在两行之间结束时正常返回；在一行中间结束时返回 `TruncatedStream`。
pub fn decode_rows(layout: &RowLayout, bytes: &[u8]) -> RowResult<Vec<Row>> {
    let mut cursor = Cursor::new(bytes);
    let mut rows = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        rows.push(RowReader::new(layout, &mut cursor).read_row()?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RowError;
    use crate::core::meta::ValueMeta;
    use crate::core::value::ValueType;

    fn layout() -> RowLayout {
        let mut layout = RowLayout::new();
        layout.append(ValueMeta::new("id", ValueType::Integer));
        layout.append(ValueMeta::new("name", ValueType::String));
        layout
    }

    #[test]
    fn test_encode_layout() {
        let bytes = encode(&layout(), &[Value::Integer(7), Value::from("ab")]).unwrap();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 0, 0, 0, 0, 0, 7, 0, 0, 0, 0, 2, b'a', b'b']
        );
    }

    #[test]
    fn test_null_is_single_flag_byte() {
        let bytes = encode(&layout(), &[Value::Null, Value::Null]).unwrap();
        assert_eq!(bytes, vec![NULL_FLAG, NULL_FLAG]);
    }

    #[test]
    fn test_empty_layout_marker() {
        let empty = RowLayout::new();
        let bytes = encode(&empty, &[]).unwrap();
        assert_eq!(bytes, vec![EMPTY_ROW_MARKER]);
        assert!(decode(&empty, &bytes).unwrap().is_empty());
        assert!(matches!(
            decode(&empty, &[]),
            Err(RowError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_rows_roundtrip_and_clean_end() {
        let layout = layout();
        let rows = vec![
            vec![Value::Integer(1), Value::from("x")],
            vec![Value::Null, Value::from("y")],
        ];
        let bytes = encode_rows(&layout, &rows).unwrap();
        assert_eq!(decode_rows(&layout, &bytes).unwrap(), rows);
        assert!(decode_rows(&layout, &[]).unwrap().is_empty());

        let cut = &bytes[..bytes.len() - 1];
        match decode_rows(&layout, cut) {
            Err(RowError::TruncatedStream { field }) => assert_eq!(field, "name"),
            other => panic!("expected truncated stream, got {:?}", other),
        }
    }

    #[test]
    fn test_values_are_coerced_to_layout_type() {
        let layout = layout();
        let bytes = encode(&layout, &[Value::from("42"), Value::Integer(5)]).unwrap();
        let row = decode(&layout, &bytes).unwrap();
        assert_eq!(row, vec![Value::Integer(42), Value::from("5")]);
    }
}
