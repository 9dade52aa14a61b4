//! 日期格式掩码
//!
//! 掩码字母与常见的日期格式约定一致：
//!
//! | 字母 | 含义 | 字母 | 含义 |
//! |------|------|------|------|
//! | y    | 年（`yy` 为两位年） | M | 月（`MMM` 简称，`MMMM` 全称） |
//! | d    | 日   | D    | 一年中的第几天 |
//! | H    | 时 0-23 | k | 时 1-24 |
//! | h    | 时 1-12 | K | 时 0-11 |
//! | m    | 分   | s    | 秒 |
//! | S    | 秒的小数部分，`S` 的个数即位数 | a | 上午/下午 |
//! | E    | 星期名 | u   | 星期编号（周一为 1） |
//! | z    | `UTC` / `GMT+hh:mm` | Z | `+hhmm` |
//! | X    | ISO 偏移：`X` `XX` `XXX` | '  | 引用字面量 |
//!
//! 解析完成后剩余的输入：空白被忽略；时区后缀（`Z`、`UTC`、`±HH:MM`、
//! `±HHMM`、`±HH`）作为偏移生效；以 `T` 开头的 ISO 时间部分被忽略；
//! 其他内容一律报错。

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};

use super::zone;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Field { letter: char, count: usize },
}

impl Token {
    fn is_numeric(&self) -> bool {
        match self {
            Token::Field { letter, count } => match letter {
                'M' => *count <= 2,
                'y' | 'd' | 'D' | 'H' | 'k' | 'K' | 'h' | 'm' | 's' | 'S' | 'u' => true,
                _ => false,
            },
            Token::Literal(_) => false,
        }
    }
}

/// 编译后的日期掩码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMask {
    pattern: String,
    tokens: Vec<Token>,
}

/// 解析过程中收集到的各个字段
#[derive(Debug, Default)]
struct Fields {
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    day_of_year: Option<i64>,
    hour: Option<i64>,
    hour12: Option<i64>,
    pm: Option<bool>,
    minute: i64,
    second: i64,
    nanos: i64,
    offset: Option<FixedOffset>,
}

impl DateMask {
    pub fn compile(pattern: &str) -> Result<Self, String> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    literal.push('\'');
                    continue;
                }
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            literal.push('\'');
                        }
                        Some('\'') => break,
                        Some(q) => literal.push(q),
                        None => return Err(format!("unterminated quote in '{}'", pattern)),
                    }
                }
                continue;
            }

            if c.is_ascii_alphabetic() {
                let letter = match c {
                    'Y' => 'y',
                    'L' => 'M',
                    'y' | 'M' | 'd' | 'D' | 'H' | 'k' | 'K' | 'h' | 'm' | 's' | 'S' | 'a'
                    | 'E' | 'u' | 'z' | 'Z' | 'X' => c,
                    other => {
                        return Err(format!("illegal pattern character '{}'", other));
                    }
                };
                let mut count = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    count += 1;
                }
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Field { letter, count });
                continue;
            }

            literal.push(c);
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            tokens,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 是否包含时区字段
    pub fn has_zone(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, Token::Field { letter: 'z' | 'Z' | 'X', .. }))
    }

    pub fn format(&self, value: &DateTime<Utc>, offset: FixedOffset) -> String {
        let local = value.with_timezone(&offset);
        let mut out = String::with_capacity(self.pattern.len() + 8);

        for token in &self.tokens {
            let (letter, count) = match token {
                Token::Literal(s) => {
                    out.push_str(s);
                    continue;
                }
                Token::Field { letter, count } => (*letter, *count),
            };
            match letter {
                'y' => {
                    let year = local.year();
                    if count == 2 {
                        pad(&mut out, year.rem_euclid(100) as i64, 2);
                    } else {
                        pad(&mut out, year as i64, count);
                    }
                }
                'M' => {
                    let m = local.month() as usize;
                    match count {
                        1 | 2 => pad(&mut out, m as i64, count),
                        3 => out.push_str(&MONTHS[m - 1][..3]),
                        _ => out.push_str(MONTHS[m - 1]),
                    }
                }
                'd' => pad(&mut out, local.day() as i64, count),
                'D' => pad(&mut out, local.ordinal() as i64, count),
                'H' => pad(&mut out, local.hour() as i64, count),
                'k' => {
                    let h = local.hour();
                    pad(&mut out, (if h == 0 { 24 } else { h }) as i64, count)
                }
                'K' => pad(&mut out, (local.hour() % 12) as i64, count),
                'h' => {
                    let h = local.hour() % 12;
                    pad(&mut out, (if h == 0 { 12 } else { h }) as i64, count)
                }
                'm' => pad(&mut out, local.minute() as i64, count),
                's' => pad(&mut out, local.second() as i64, count),
                'S' => {
                    // 闰秒时纳秒可能超过 10^9，截断到合法范围
                    let nanos = (local.nanosecond() % 1_000_000_000) as i64;
                    if count <= 9 {
                        let scaled = nanos / 10_i64.pow((9 - count) as u32);
                        pad(&mut out, scaled, count);
                    } else {
                        pad(&mut out, nanos, 9);
                        out.extend(std::iter::repeat('0').take(count - 9));
                    }
                }
                'a' => out.push_str(if local.hour() < 12 { "AM" } else { "PM" }),
                'E' => {
                    let w = local.weekday().num_days_from_monday() as usize;
                    if count >= 4 {
                        out.push_str(WEEKDAYS[w]);
                    } else {
                        out.push_str(&WEEKDAYS[w][..3]);
                    }
                }
                'u' => pad(&mut out, local.weekday().number_from_monday() as i64, count),
                'z' => {
                    if offset.local_minus_utc() == 0 {
                        out.push_str("UTC");
                    } else {
                        out.push_str("GMT");
                        out.push_str(&zone::format_offset(&offset));
                    }
                }
                'Z' => out.push_str(&iso_offset(&offset, false, false)),
                'X' => match count {
                    1 => out.push_str(&iso_offset(&offset, true, true)),
                    2 => out.push_str(&iso_offset(&offset, true, false)),
                    _ => {
                        if offset.local_minus_utc() == 0 {
                            out.push('Z');
                        } else {
                            out.push_str(&zone::format_offset(&offset));
                        }
                    }
                },
                _ => {}
            }
        }
        out
    }

    /// 解析文本，没有显式时区时按 `default_offset` 解释
    pub fn parse(
        &self,
        text: &str,
        default_offset: FixedOffset,
        lenient: bool,
    ) -> Result<DateTime<Utc>, String> {
        let mut fields = Fields::default();
        let mut pos = 0usize;

        for (idx, token) in self.tokens.iter().enumerate() {
            let rest = &text[pos..];
            match token {
                Token::Literal(lit) => {
                    if rest.starts_with(lit.as_str()) {
                        pos += lit.len();
                    } else {
                        return Err(format!(
                            "expected '{}' at position {} in '{}'",
                            lit, pos, text
                        ));
                    }
                }
                Token::Field { letter, count } => {
                    let next_numeric = self
                        .tokens
                        .get(idx + 1)
                        .map(Token::is_numeric)
                        .unwrap_or(false);
                    if token.is_numeric() {
                        let max = if next_numeric { *count } else { 10 };
                        let (value, used) = read_number(rest, max).ok_or_else(|| {
                            format!("expected digits at position {} in '{}'", pos, text)
                        })?;
                        pos += used;
                        self.assign_numeric(&mut fields, *letter, *count, value, used, &rest[..used]);
                    } else {
                        pos += self.parse_text_field(&mut fields, *letter, rest, pos, text)?;
                    }
                }
            }
        }

        self.parse_trailing(&mut fields, &text[pos..], text)?;
        build(&fields, default_offset, lenient)
            .ok_or_else(|| format!("invalid date '{}' for mask '{}'", text, self.pattern))
    }

    fn assign_numeric(
        &self,
        fields: &mut Fields,
        letter: char,
        count: usize,
        value: i64,
        used: usize,
        digits: &str,
    ) {
        match letter {
            'y' => {
                fields.year = Some(if count <= 2 && used == 2 {
                    two_digit_year(value)
                } else {
                    value
                })
            }
            'M' => fields.month = Some(value),
            'd' => fields.day = Some(value),
            'D' => fields.day_of_year = Some(value),
            'H' => fields.hour = Some(value),
            'k' => fields.hour = Some(if value == 24 { 0 } else { value }),
            'K' => fields.hour12 = Some(value),
            'h' => fields.hour12 = Some(if value == 12 { 0 } else { value }),
            'm' => fields.minute = value,
            's' => fields.second = value,
            'S' => {
                let significant: String = digits.chars().take(9).collect();
                let n = significant.len() as u32;
                let v: i64 = significant.parse().unwrap_or(0);
                fields.nanos = v * 10_i64.pow(9 - n);
            }
            _ => {}
        }
    }

    fn parse_text_field(
        &self,
        fields: &mut Fields,
        letter: char,
        rest: &str,
        pos: usize,
        text: &str,
    ) -> Result<usize, String> {
        let fail = || format!("unparseable field '{}' at position {} in '{}'", letter, pos, text);
        match letter {
            'M' => {
                let (i, used) = match_name(rest, &MONTHS).ok_or_else(fail)?;
                fields.month = Some(i as i64 + 1);
                Ok(used)
            }
            'E' => {
                let (_, used) = match_name(rest, &WEEKDAYS).ok_or_else(fail)?;
                Ok(used)
            }
            'a' => {
                let head = rest.get(..2).ok_or_else(fail)?;
                if head.eq_ignore_ascii_case("AM") {
                    fields.pm = Some(false);
                } else if head.eq_ignore_ascii_case("PM") {
                    fields.pm = Some(true);
                } else {
                    return Err(fail());
                }
                Ok(2)
            }
            'z' | 'Z' | 'X' => {
                let (offset, used) = zone::parse_offset_prefix(rest).ok_or_else(fail)?;
                fields.offset = Some(offset);
                Ok(used)
            }
            _ => Err(fail()),
        }
    }

    fn parse_trailing(&self, fields: &mut Fields, rest: &str, text: &str) -> Result<(), String> {
        let rest = rest.trim();
        if rest.is_empty() || rest.starts_with('T') {
            return Ok(());
        }
        if fields.offset.is_none() {
            if let Some(offset) = zone::parse_offset(rest) {
                fields.offset = Some(offset);
                return Ok(());
            }
        }
        Err(format!(
            "unexpected trailing text '{}' in '{}' for mask '{}'",
            rest, text, self.pattern
        ))
    }
}

fn pad(out: &mut String, value: i64, width: usize) {
    if value < 0 {
        out.push('-');
    }
    let digits = value.unsigned_abs().to_string();
    for _ in digits.len()..width {
        out.push('0');
    }
    out.push_str(&digits);
}

fn iso_offset(offset: &FixedOffset, zulu: bool, hours_only: bool) -> String {
    let secs = offset.local_minus_utc();
    if zulu && secs == 0 {
        return "Z".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    if hours_only {
        format!("{}{:02}", sign, abs / 3600)
    } else {
        format!("{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }
}

fn read_number(text: &str, max: usize) -> Option<(i64, usize)> {
    let used = text
        .bytes()
        .take(max.min(18))
        .take_while(u8::is_ascii_digit)
        .count();
    if used == 0 {
        return None;
    }
    text[..used].parse().ok().map(|v| (v, used))
}

fn match_name(text: &str, names: &[&str]) -> Option<(usize, usize)> {
    for (i, name) in names.iter().enumerate() {
        if text
            .get(..name.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(name))
        {
            return Some((i, name.len()));
        }
    }
    for (i, name) in names.iter().enumerate() {
        if text
            .get(..3)
            .is_some_and(|head| head.eq_ignore_ascii_case(&name[..3]))
        {
            return Some((i, 3));
        }
    }
    None
}

/// 两位年份放到以当前年份为基准的 [-80, +20) 窗口中
fn two_digit_year(yy: i64) -> i64 {
    let now = Utc::now().year() as i64;
    let start = now - 80;
    let mut year = start - start.rem_euclid(100) + yy;
    if year < start {
        year += 100;
    }
    year
}

fn build(fields: &Fields, default_offset: FixedOffset, lenient: bool) -> Option<DateTime<Utc>> {
    let year = fields.year.unwrap_or(1970);
    let month = fields.month.unwrap_or(1);
    let day = fields.day.unwrap_or(1);
    let hour = match (fields.hour, fields.hour12) {
        (Some(h), _) => h,
        (None, Some(h12)) => h12 + if fields.pm == Some(true) { 12 } else { 0 },
        (None, None) => 0,
    };

    if !lenient {
        let hour12_ok = fields.hour12.map_or(true, |h| (0..12).contains(&h));
        if !(1..=12).contains(&month)
            || !(0..24).contains(&hour)
            || !hour12_ok
            || !(0..60).contains(&fields.minute)
            || !(0..60).contains(&fields.second)
        {
            return None;
        }
    }

    let date = match fields.day_of_year {
        Some(ordinal) if fields.month.is_none() && fields.day.is_none() => {
            let jan1 = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 1, 1)?;
            if !lenient {
                NaiveDate::from_yo_opt(jan1.year(), u32::try_from(ordinal).ok()?)?
            } else {
                jan1.checked_add_signed(Duration::try_days(ordinal - 1)?)?
            }
        }
        _ if !lenient => NaiveDate::from_ymd_opt(
            i32::try_from(year).ok()?,
            u32::try_from(month).ok()?,
            u32::try_from(day).ok()?,
        )?,
        _ => {
            let total_months = year.checked_mul(12)?.checked_add(month - 1)?;
            let first = NaiveDate::from_ymd_opt(
                i32::try_from(total_months.div_euclid(12)).ok()?,
                (total_months.rem_euclid(12) + 1) as u32,
                1,
            )?;
            first.checked_add_signed(Duration::try_days(day - 1)?)?
        }
    };

    let time = Duration::try_hours(hour)?
        .checked_add(&Duration::try_minutes(fields.minute)?)?
        .checked_add(&Duration::try_seconds(fields.second)?)?
        .checked_add(&Duration::nanoseconds(fields.nanos))?;
    let local: NaiveDateTime = date.and_hms_opt(0, 0, 0)?.checked_add_signed(time)?;

    let offset = fields.offset.unwrap_or(default_offset);
    let utc = local.checked_sub_signed(Duration::try_seconds(offset.local_minus_utc() as i64)?)?;
    Some(Utc.from_utc_datetime(&utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap() + Duration::milliseconds(ms as i64)
    }

    fn mask(p: &str) -> DateMask {
        DateMask::compile(p).expect("掩码编译失败")
    }

    #[test]
    fn test_format_default_mask() {
        let m = mask("yyyy/MM/dd HH:mm:ss.SSS");
        let d = utc_dt(2007, 5, 7, 13, 4, 13, 203);
        assert_eq!(m.format(&d, zone::utc()), "2007/05/07 13:04:13.203");
    }

    #[test]
    fn test_format_with_offset_and_names() {
        let m = mask("EEE, d MMM yyyy hh:mm a XXX");
        let d = utc_dt(2017, 2, 24, 23, 30, 0, 0);
        let plus2 = FixedOffset::east_opt(7200).unwrap();
        assert_eq!(m.format(&d, plus2), "Sat, 25 Feb 2017 01:30 AM +02:00");
        assert_eq!(mask("MMMM").format(&d, zone::utc()), "February");
        assert_eq!(mask("yy").format(&d, zone::utc()), "17");
        assert_eq!(mask("'at' HH'h'").format(&d, zone::utc()), "at 23h");
    }

    #[test]
    fn test_format_nanosecond_fraction() {
        let m = mask("HH:mm:ss.SSSSSSSSS");
        let d = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 1).unwrap() + Duration::nanoseconds(123_456_789);
        assert_eq!(m.format(&d, zone::utc()), "00:00:01.123456789");
    }

    #[test]
    fn test_parse_roundtrip_default_mask() {
        let m = mask("yyyy/MM/dd HH:mm:ss.SSS");
        let d = utc_dt(2007, 5, 7, 13, 4, 13, 203);
        let parsed = m.parse("2007/05/07 13:04:13.203", zone::utc(), false).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn test_parse_iso_suffixes() {
        let m = mask("yyyy-MM-dd HH:mm:ss.SSS");
        let expected = utc_dt(2017, 2, 24, 10, 0, 0, 0);
        let plus1 = FixedOffset::east_opt(3600).unwrap();
        for text in [
            "2017-02-24 10:00:00.000Z",
            "2017-02-24 10:00:00.000 UTC",
            "2017-02-24 11:00:00.000+01:00",
            "2017-02-24 11:00:00.000+0100",
            "2017-02-24 11:00:00.000 +01",
        ] {
            assert_eq!(m.parse(text, plus1, false).unwrap(), expected, "{}", text);
        }
        // 没有后缀时使用默认时区
        assert_eq!(
            m.parse("2017-02-24 11:00:00.000", plus1, false).unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_variable_width_fields() {
        let m = mask("MM/dd/yyyy HH:mm");
        let parsed = m.parse("2/24/2017 0:00", zone::utc(), false).unwrap();
        assert_eq!(parsed, utc_dt(2017, 2, 24, 0, 0, 0, 0));
    }

    #[test]
    fn test_parse_adjacent_fixed_width() {
        let m = mask("yyyyMMddHHmmss");
        let parsed = m.parse("20170224153000", zone::utc(), false).unwrap();
        assert_eq!(parsed, utc_dt(2017, 2, 24, 15, 30, 0, 0));
    }

    #[test]
    fn test_parse_date_only_ignores_iso_time() {
        let m = mask("yyyy-MM-dd");
        let parsed = m.parse("2021-03-04T10:11:12Z", zone::utc(), false).unwrap();
        assert_eq!(parsed, utc_dt(2021, 3, 4, 0, 0, 0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage_and_invalid_dates() {
        let m = mask("yyyy-MM-dd");
        assert!(m.parse("2021-03-04 junk", zone::utc(), false).is_err());
        assert!(m.parse("2021-02-30", zone::utc(), false).is_err());
        assert!(m.parse("2021-13-01", zone::utc(), false).is_err());
        assert!(m.parse("abcd-01-01", zone::utc(), false).is_err());
    }

    #[test]
    fn test_lenient_rollover() {
        let m = mask("yyyy-MM-dd");
        let parsed = m.parse("2021-02-30", zone::utc(), true).unwrap();
        assert_eq!(parsed, utc_dt(2021, 3, 2, 0, 0, 0, 0));
        let parsed = m.parse("2021-13-01", zone::utc(), true).unwrap();
        assert_eq!(parsed, utc_dt(2022, 1, 1, 0, 0, 0, 0));
    }

    #[test]
    fn test_parse_twelve_hour_clock() {
        let m = mask("hh:mm a");
        let pm = m.parse("01:30 PM", zone::utc(), false).unwrap();
        assert_eq!(pm, utc_dt(1970, 1, 1, 13, 30, 0, 0));
        let midnight = m.parse("12:00 am", zone::utc(), false).unwrap();
        assert_eq!(midnight, utc_dt(1970, 1, 1, 0, 0, 0, 0));
    }

    #[test]
    fn test_parse_month_names() {
        let m = mask("dd MMM yyyy");
        let parsed = m.parse("07 may 2007", zone::utc(), false).unwrap();
        assert_eq!(parsed, utc_dt(2007, 5, 7, 0, 0, 0, 0));
        let full = mask("MMMM d, yyyy").parse("September 3, 2010", zone::utc(), false);
        assert_eq!(full.unwrap(), utc_dt(2010, 9, 3, 0, 0, 0, 0));
    }

    #[test]
    fn test_compile_errors() {
        assert!(DateMask::compile("yyyy-MM-dd 'oops").is_err());
        assert!(DateMask::compile("yyyy-qq").is_err());
        assert!(!mask("yyyy 'at' HH").has_zone());
        assert!(mask("yyyy XXX").has_zone());
    }

    #[test]
    fn test_two_digit_year_window() {
        let now = Utc::now().year() as i64;
        let y = two_digit_year(now.rem_euclid(100));
        assert_eq!(y, now);
        let far = two_digit_year((now + 30).rem_euclid(100));
        assert_eq!(far, now + 30 - 100);
    }
}
