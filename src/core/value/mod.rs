//! 值模块
//!
//! - `types`：逻辑类型、存储类型和运行时值
//! - `hash`：跨进程稳定的哈希函数

pub mod hash;
pub mod types;

pub use hash::{murmurhash2, StableHasher};
pub use types::{Row, StorageType, TrimType, Value, ValueType};
