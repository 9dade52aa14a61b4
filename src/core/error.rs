//! 行元数据引擎的错误类型定义
//!
//! 所有公开操作统一返回 [`RowResult`]，转换失败携带原始值、描述符和原因，
//! 便于上层按行定位问题。

use thiserror::Error;

use crate::core::value::ValueType;

/// 值转换失败的详细信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    /// 无法转换的原始值（文本形式）
    pub value: String,
    /// 描述符的简短说明，形如 `amount Number(9,2)`
    pub meta: String,
    /// 期望得到的逻辑类型
    pub target: ValueType,
    /// 底层原因
    pub reason: String,
}

impl ConversionError {
    pub fn new(
        value: impl Into<String>,
        meta: impl Into<String>,
        target: ValueType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            meta: meta.into(),
            target,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unable to convert [{}] of {} to {}: {}",
            self.value,
            self.meta,
            self.target.desc(),
            self.reason
        )
    }
}

#[derive(Debug, Error)]
pub enum RowError {
    #[error("Conversion error: {0}")]
    Conversion(ConversionError),

    #[error("Truncated stream while reading field '{field}'")]
    TruncatedStream { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RowError {
    /// 结构错误在构造时记录日志
    pub fn structural(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::warn!("structural error: {}", msg);
        RowError::Structural(msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        RowError::Config(msg.into())
    }

    /// 是否为数据流提前结束
    pub fn is_truncated(&self) -> bool {
        matches!(self, RowError::TruncatedStream { .. })
    }

    /// 是否为转换类错误
    pub fn is_conversion(&self) -> bool {
        matches!(self, RowError::Conversion(_))
    }
}

impl From<ConversionError> for RowError {
    fn from(err: ConversionError) -> Self {
        RowError::Conversion(err)
    }
}

pub type RowResult<T> = std::result::Result<T, RowError>;
