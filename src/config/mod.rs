use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{RowError, RowResult};
use crate::core::format::zone;

/// 全局配置
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub conversion: ConversionConfig,
    pub log: LogConfig,
}

/// 值转换的全局默认值
///
/// 描述符没有设置对应属性时使用这里的值。
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConversionConfig {
    pub default_integer_mask: String,
    pub default_number_mask: String,
    pub default_big_number_mask: String,
    pub default_date_mask: String,
    pub default_timestamp_mask: String,
    /// 字符串列解析为数值/日期时使用的掩码
    pub parse_integer_mask: String,
    pub parse_number_mask: String,
    pub parse_big_number_mask: String,
    pub parse_date_mask: String,
    pub parse_timestamp_mask: String,
    pub decimal_symbol: String,
    pub grouping_symbol: String,
    pub currency_symbol: String,
    /// `UTC` 或 `±HH:MM`
    pub default_time_zone: String,
    /// 非字符串类型的空值文本
    pub null_string: String,
    pub empty_string_differs_from_null: bool,
    pub lenient_string_to_number: bool,
    pub mask_cache_capacity: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_integer_mask: "####0;-####0".to_string(),
            default_number_mask: "####0.0#########;-####0.0#########".to_string(),
            default_big_number_mask:
                "######0.0###################;-######0.0###################".to_string(),
            default_date_mask: "yyyy/MM/dd HH:mm:ss.SSS".to_string(),
            default_timestamp_mask: "yyyy/MM/dd HH:mm:ss.SSSSSSSSS".to_string(),
            parse_integer_mask: "####0".to_string(),
            parse_number_mask: "####0.0#########".to_string(),
            parse_big_number_mask: "######0.0###################".to_string(),
            parse_date_mask: "yyyy/MM/dd HH:mm:ss.SSS".to_string(),
            parse_timestamp_mask: "yyyy/MM/dd HH:mm:ss.SSSSSSSSS".to_string(),
            decimal_symbol: ".".to_string(),
            grouping_symbol: ",".to_string(),
            currency_symbol: "$".to_string(),
            default_time_zone: "UTC".to_string(),
            null_string: "<null>".to_string(),
            empty_string_differs_from_null: false,
            lenient_string_to_number: false,
            mask_cache_capacity: 256,
        }
    }
}

impl ConversionConfig {
    /// 检查取值是否可用
    pub fn validate(&self) -> RowResult<()> {
        if zone::parse_offset(&self.default_time_zone).is_none() {
            return Err(RowError::config(format!(
                "unsupported default_time_zone '{}'",
                self.default_time_zone
            )));
        }
        if self.decimal_symbol.is_empty() {
            return Err(RowError::config("decimal_symbol must not be empty"));
        }
        if self.decimal_symbol == self.grouping_symbol {
            return Err(RowError::config(
                "decimal_symbol and grouping_symbol must differ",
            ));
        }
        if self.mask_cache_capacity == 0 {
            return Err(RowError::config("mask_cache_capacity must be positive"));
        }
        Ok(())
    }
}

/// 日志配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
    /// 同时输出到标准错误
    pub to_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "rowmeta".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
            to_stderr: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> RowResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> RowResult<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| RowError::config(e.to_string()))?;
        config.conversion.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> RowResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RowError::config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}
