//! 值转换
//!
//! [`ValueConverter`] 负责按描述符解释原始值：存储方式解码、类型访问、
//! 文本格式化与解析、跨描述符转换、比较与哈希。

mod compare;
mod converter;

pub use converter::ValueConverter;
