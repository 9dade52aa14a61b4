//! 行数组操作
//!
//! 行是 `Vec<Value>`，长度可以大于布局长度，多出的位置为 [`Value::Null`]。
//! 这里的函数按位置增删值，不触碰其他位置，也不关心布局。

use crate::core::error::{RowError, RowResult};
use crate::core::value::{Row, Value};

/// 分配新行时额外预留的位置数
pub const OVER_ALLOCATE_SIZE: usize = 5;

/// 分配一行：`size` 个空值加上预留位置
pub fn allocate(size: usize) -> Row {
    vec![Value::Null; size + OVER_ALLOCATE_SIZE]
}

/// 保证行长度至少为 `min_size`
///
/// 已经足够长时原样返回，不复制；否则扩容并用空值补齐。
pub fn resize(mut row: Row, min_size: usize) -> Row {
    if row.len() >= min_size {
        return row;
    }
    row.resize(min_size + OVER_ALLOCATE_SIZE, Value::Null);
    row
}

/// 删除一个位置，其余位置保持相对顺序
pub fn remove_at(row: &[Value], position: usize) -> RowResult<Row> {
    if position >= row.len() {
        return Err(RowError::structural(format!(
            "cannot remove position {} from a row of {} values",
            position,
            row.len()
        )));
    }
    let mut out = Vec::with_capacity(row.len() - 1);
    out.extend_from_slice(&row[..position]);
    out.extend_from_slice(&row[position + 1..]);
    Ok(out)
}

/// 一次删除多个位置
///
/// 越界位置和重复位置被忽略；`positions` 为空时返回内容相同的行。
pub fn remove_many(row: &[Value], positions: &[usize]) -> Row {
    if positions.is_empty() {
        return row.to_vec();
    }
    let mut drop = vec![false; row.len()];
    for &p in positions {
        if let Some(flag) = drop.get_mut(p) {
            *flag = true;
        }
    }
    row.iter()
        .zip(drop)
        .filter(|(_, dropped)| !dropped)
        .map(|(v, _)| v.clone())
        .collect()
}

/// `row_a` 的前 `length_a` 个值后接 `row_b` 的全部值
///
/// 复用 `row_a` 的缓冲区，空间不够时按 [`resize`] 的规则扩容。
pub fn concat(row_a: Row, length_a: usize, row_b: &[Value]) -> Row {
    let mut out = resize(row_a, length_a + row_b.len());
    out[length_a..length_a + row_b.len()].clone_from_slice(row_b);
    out
}

/// 在位置 `length` 处追加一个值
pub fn append_value(row: Row, length: usize, value: Value) -> Row {
    let mut out = resize(row, length + 1);
    out[length] = value;
    out
}

/// 在 `position` 处插入一个值，`[position, length)` 的值后移一位
pub fn insert_value(row: Row, length: usize, position: usize, value: Value) -> RowResult<Row> {
    if position > length {
        return Err(RowError::structural(format!(
            "cannot insert at position {} into a row of length {}",
            position, length
        )));
    }
    let mut out = resize(row, length + 1);
    out[position..=length].rotate_right(1);
    out[position] = value;
    Ok(out)
}

/// 把多段行拼成一行，每段取前 `len` 个值
pub fn create_resized_copy(parts: &[(&[Value], usize)]) -> Row {
    let total: usize = parts.iter().map(|(_, len)| *len).sum();
    let mut out = Vec::with_capacity(total + OVER_ALLOCATE_SIZE);
    for (part, len) in parts {
        let take = (*len).min(part.len());
        out.extend_from_slice(&part[..take]);
        out.resize(out.len() + (len - take), Value::Null);
    }
    out.resize(total + OVER_ALLOCATE_SIZE, Value::Null);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Row {
        values.iter().map(|&v| Value::Integer(v)).collect()
    }

    #[test]
    fn test_allocate_has_slack() {
        let row = allocate(3);
        assert_eq!(row.len(), 3 + OVER_ALLOCATE_SIZE);
        assert!(row.iter().all(Value::is_null));
    }

    #[test]
    fn test_resize_keeps_long_enough_row() {
        let row = ints(&[1, 2, 3]);
        let ptr = row.as_ptr();
        let same = resize(row, 2);
        assert_eq!(same.as_ptr(), ptr);
        assert_eq!(same, ints(&[1, 2, 3]));
    }

    #[test]
    fn test_resize_grows_with_nulls() {
        let grown = resize(ints(&[1, 2]), 4);
        assert!(grown.len() >= 4);
        assert_eq!(&grown[..2], &ints(&[1, 2])[..]);
        assert!(grown[2..].iter().all(Value::is_null));
    }

    #[test]
    fn test_remove_at() {
        let row = ints(&[1, 2, 3]);
        assert_eq!(remove_at(&row, 1).unwrap(), ints(&[1, 3]));
        assert!(remove_at(&row, 3).is_err());
    }

    #[test]
    fn test_remove_many() {
        let row = ints(&[1, 2, 3, 4, 5]);
        assert_eq!(remove_many(&row, &[0, 2, 4]), ints(&[2, 4]));
        assert_eq!(remove_many(&row, &[]), row);
        assert_eq!(remove_many(&row, &[4, 0, 4, 9]), ints(&[2, 3, 4]));
    }

    #[test]
    fn test_remove_many_matches_single_removals() {
        let row = ints(&[10, 20, 30, 40, 50, 60]);
        let batched = remove_many(&row, &[1, 3, 4]);
        // 从后往前删除，避免位置偏移
        let mut single = row.clone();
        for p in [4, 3, 1] {
            single = remove_at(&single, p).unwrap();
        }
        assert_eq!(batched, single);
    }

    #[test]
    fn test_concat_and_append() {
        let joined = concat(ints(&[1, 2, 99]), 2, &ints(&[3, 4]));
        assert_eq!(&joined[..4], &ints(&[1, 2, 3, 4])[..]);

        let mut row = allocate(0);
        for i in 0..12 {
            row = append_value(row, i, Value::Integer(i as i64));
        }
        assert_eq!(&row[..12], &ints(&(0..12).collect::<Vec<_>>())[..]);
    }

    #[test]
    fn test_insert_value() {
        let row = insert_value(ints(&[1, 3]), 2, 1, Value::Integer(2)).unwrap();
        assert_eq!(&row[..3], &ints(&[1, 2, 3])[..]);
        let row = insert_value(row, 3, 3, Value::Integer(4)).unwrap();
        assert_eq!(&row[..4], &ints(&[1, 2, 3, 4])[..]);
        assert!(insert_value(ints(&[1]), 1, 2, Value::Null).is_err());
    }

    #[test]
    fn test_create_resized_copy() {
        let a = ints(&[1, 2, 0, 0]);
        let b = ints(&[3]);
        let row = create_resized_copy(&[(a.as_slice(), 2), (b.as_slice(), 1)]);
        assert_eq!(row.len(), 3 + OVER_ALLOCATE_SIZE);
        assert_eq!(&row[..3], &ints(&[1, 2, 3])[..]);
    }
}
