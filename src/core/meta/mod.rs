//! 值描述符
//!
//! - `value_meta`：描述符本身，包含类型、存储方式和格式规则
//! - `meta_ref`：可共享、带实例编号的描述符句柄

pub mod meta_ref;
pub mod value_meta;

pub use meta_ref::ValueMetaRef;
pub use value_meta::ValueMeta;
