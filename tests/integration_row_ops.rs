//! 行数组操作集成测试
//!
//! 测试范围:
//! - core::row::ops - 扩容、批量删除、拼接、插入
//! - 布局与行同步增删列

mod common;

use common::ints;
use rowmeta::core::row::ops;
use rowmeta::{RowLayout, Value, ValueMeta, ValueType};

#[test]
fn test_resize_returns_same_buffer_when_long_enough() {
    let row = ints(&[1, 2, 3]);
    let ptr = row.as_ptr();
    for n in 0..=3 {
        let row = ops::resize(ints(&[1, 2, 3]), n);
        assert_eq!(row, ints(&[1, 2, 3]));
    }
    let same = ops::resize(row, 3);
    assert_eq!(same.as_ptr(), ptr);
}

#[test]
fn test_resize_pads_with_nulls() {
    let row = ops::resize(ints(&[1, 2, 3]), 6);
    assert!(row.len() >= 6);
    assert_eq!(&row[..3], ints(&[1, 2, 3]).as_slice());
    assert!(row[3..].iter().all(Value::is_null));
}

#[test]
fn test_remove_many() {
    let row = ints(&[1, 2, 3, 4, 5]);
    assert_eq!(ops::remove_many(&row, &[0, 2, 4]), ints(&[2, 4]));
    assert_eq!(ops::remove_many(&row, &[]), row);

    let mut single = row.clone();
    for p in [4, 2, 0] {
        single = ops::remove_at(&single, p).expect("删除失败");
    }
    assert_eq!(single, ops::remove_many(&row, &[0, 2, 4]));
}

#[test]
fn test_append_loop_reuses_slack() {
    let mut row = ops::allocate(0);
    let mut reallocations = 0;
    for i in 0..100 {
        let before = row.as_ptr();
        row = ops::append_value(row, i, Value::Integer(i as i64));
        if row.as_ptr() != before {
            reallocations += 1;
        }
    }
    assert_eq!(&row[..100], ints(&(0..100).collect::<Vec<_>>()).as_slice());
    assert!(reallocations < 100);
}

#[test]
fn test_add_and_drop_column_with_layout() {
    let mut layout = RowLayout::new();
    layout.append(ValueMeta::new("a", ValueType::Integer));
    layout.append(ValueMeta::new("c", ValueType::Integer));
    let row = ints(&[1, 3]);

    // 在中间插入列
    layout
        .insert_at(1, ValueMeta::new("b", ValueType::Integer))
        .expect("插入失败");
    let row = ops::insert_value(row, 2, 1, Value::Integer(2)).expect("插入失败");
    assert_eq!(layout.get_integer(&row, 1).expect("取值失败"), Some(2));
    assert_eq!(layout.get_integer(&row, 2).expect("取值失败"), Some(3));

    // 删除首列
    let position = layout.index_of("a").expect("字段存在");
    layout.remove_at(position).expect("删除失败");
    let row = ops::remove_at(&row, position).expect("删除失败");
    assert_eq!(layout.get_integer_or(&row, "b", 0).expect("取值失败"), Some(2));
    assert_eq!(layout.get_integer_or(&row, "c", 0).expect("取值失败"), Some(3));
    // 已删除的列按默认值返回
    assert_eq!(layout.get_integer_or(&row, "a", -1).expect("取值失败"), Some(-1));
}

#[test]
fn test_concat_and_resized_copy() {
    let left = ints(&[1, 2]);
    let right = ints(&[3, 4, 5]);
    let joined = ops::concat(left.clone(), 2, &right);
    assert_eq!(&joined[..5], ints(&[1, 2, 3, 4, 5]).as_slice());

    let copy = ops::create_resized_copy(&[(left.as_slice(), 2), (right.as_slice(), 3)]);
    assert_eq!(&copy[..5], ints(&[1, 2, 3, 4, 5]).as_slice());
    assert!(copy[5..].iter().all(Value::is_null));
}
