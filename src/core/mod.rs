pub mod codec;
pub mod convert;
pub mod error;
pub mod format;
pub mod meta;
pub mod row;
pub mod value;

// 错误和结果类型
pub use error::{ConversionError, RowError, RowResult};

// 核心数据类型
pub use value::{Row, StorageType, TrimType, Value, ValueType};

pub use convert::ValueConverter;
pub use meta::{ValueMeta, ValueMetaRef};
pub use row::RowLayout;
