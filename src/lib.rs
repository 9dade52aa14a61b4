//! rowmeta - row metadata and value engine for ETL pipelines
//!
//! A row is a bare positional `Vec<Value>`; a [`RowLayout`] describes each
//! position with a [`ValueMeta`] and delegates typed access, text conversion,
//! comparison and hashing to a shared [`ValueConverter`]. The codec module
//! serializes rows for hand-off across threads or processes.

pub mod config;
pub mod core;
pub mod utils;

pub use crate::config::{Config, ConversionConfig, LogConfig};
pub use crate::core::{
    ConversionError, Row, RowError, RowLayout, RowResult, StorageType, TrimType, Value,
    ValueConverter, ValueMeta, ValueMetaRef, ValueType,
};
