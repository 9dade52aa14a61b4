//! 时区偏移的解析与格式化
//!
//! 只支持固定偏移：`UTC`、`GMT`、`Z`，以及 `±HH`、`±HHMM`、`±HH:MM`
//! （可带 `UTC`/`GMT` 前缀）。

use chrono::{FixedOffset, Offset, Utc};

pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// 解析完整的时区字符串
pub fn parse_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    match parse_offset_prefix(text) {
        Some((offset, used)) if used == text.len() => Some(offset),
        _ => None,
    }
}

/// 从文本开头解析时区，返回偏移和消耗的字节数
pub fn parse_offset_prefix(text: &str) -> Option<(FixedOffset, usize)> {
    let bytes = text.as_bytes();
    if bytes.first() == Some(&b'Z') {
        return Some((utc(), 1));
    }

    let mut pos = 0;
    let mut named = false;
    for prefix in ["UTC", "GMT"] {
        if text.get(..3).is_some_and(|head| head.eq_ignore_ascii_case(prefix)) {
            pos = 3;
            named = true;
            break;
        }
    }

    let sign = match bytes.get(pos) {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return if named { Some((utc(), pos)) } else { None },
    };
    pos += 1;

    let (hours, used) = read_digits(&bytes[pos..], 2)?;
    pos += used;
    let mut minutes = 0;
    if used == 2 {
        let mut p = pos;
        if bytes.get(p) == Some(&b':') {
            p += 1;
        }
        if let Some((m, 2)) = read_digits(&bytes[p..], 2) {
            minutes = m;
            pos = p + 2;
        }
    }

    if hours > 18 || minutes > 59 {
        return None;
    }
    let seconds = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(seconds).map(|o| (o, pos))
}

fn read_digits(bytes: &[u8], max: usize) -> Option<(i32, usize)> {
    let mut value = 0i32;
    let mut used = 0;
    while used < max {
        match bytes.get(used) {
            Some(b) if b.is_ascii_digit() => {
                value = value * 10 + (b - b'0') as i32;
                used += 1;
            }
            _ => break,
        }
    }
    if used == 0 {
        None
    } else {
        Some((value, used))
    }
}

/// 格式化为 `UTC` 或 `+HH:MM`
pub fn format_offset(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    if secs == 0 {
        return "UTC".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// `Option<FixedOffset>` 的 serde 适配，序列化为字符串
pub mod serde_opt {
    use chrono::FixedOffset;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value
            .as_ref()
            .map(super::format_offset)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<FixedOffset>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        match text {
            None => Ok(None),
            Some(t) => super::parse_offset(&t)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time zone: {}", t))),
        }
    }
}
