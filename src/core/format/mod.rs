//! 格式掩码
//!
//! 数值与日期的文本表示都由掩码决定。掩码编译有一定开销，
//! [`MaskCache`] 按“掩码 + 符号”缓存编译结果，可在多个线程间共享。

pub mod date_mask;
pub mod number_mask;
pub mod zone;

use moka::sync::Cache;
use std::sync::Arc;

pub use date_mask::DateMask;
pub use number_mask::{DecimalDigits, NumberMask, Symbols};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NumberKey {
    pattern: String,
    symbols: Symbols,
}

/// 编译后掩码的缓存
#[derive(Clone)]
pub struct MaskCache {
    numbers: Cache<NumberKey, Arc<NumberMask>>,
    dates: Cache<String, Arc<DateMask>>,
}

impl MaskCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            numbers: Cache::new(capacity),
            dates: Cache::new(capacity),
        }
    }

    pub fn number(&self, pattern: &str, symbols: &Symbols) -> Result<Arc<NumberMask>, String> {
        let key = NumberKey {
            pattern: pattern.to_string(),
            symbols: symbols.clone(),
        };
        if let Some(mask) = self.numbers.get(&key) {
            return Ok(mask);
        }
        let mask = Arc::new(NumberMask::compile(pattern, symbols.clone())?);
        self.numbers.insert(key, mask.clone());
        Ok(mask)
    }

    pub fn date(&self, pattern: &str) -> Result<Arc<DateMask>, String> {
        if let Some(mask) = self.dates.get(pattern) {
            return Ok(mask);
        }
        let mask = Arc::new(DateMask::compile(pattern)?);
        self.dates.insert(pattern.to_string(), mask.clone());
        Ok(mask)
    }
}

impl std::fmt::Debug for MaskCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskCache")
            .field("numbers", &self.numbers.entry_count())
            .field("dates", &self.dates.entry_count())
            .finish()
    }
}
