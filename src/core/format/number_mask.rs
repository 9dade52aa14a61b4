//! 数值格式掩码
//!
//! 支持的掩码语法与常见的十进制格式一致：
//!
//! ```text
//!   [前缀] 整数部分 [. 小数部分] [E 指数] [后缀] [; 负数子模式]
//!   0  必须出现的数字      #  可选数字
//!   ,  分组分隔符          .  小数分隔符
//!   %  乘以 100            ‰  乘以 1000
//!   ¤  货币符号            '  引用字面量
//! ```
//!
//! 格式化按 HALF_EVEN 舍入。数值先转为十进制数字序列 [`DecimalDigits`]，
//! 所以 i64、f64 与 BigDecimal 共用同一套格式化逻辑，不会经过二进制浮点。

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::Signed;

/// 格式化和解析时使用的符号
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbols {
    pub decimal: char,
    pub grouping: Option<char>,
    pub currency: String,
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            decimal: '.',
            grouping: Some(','),
            currency: "$".to_string(),
        }
    }
}

impl Symbols {
    /// 由配置中的字符串构建，空字符串表示不使用该符号
    pub fn from_strings(decimal: &str, grouping: &str, currency: &str) -> Self {
        Self {
            decimal: decimal.chars().next().unwrap_or('.'),
            grouping: grouping.chars().next(),
            currency: currency.to_string(),
        }
    }
}

/// 十进制数字序列：值 = 0.d1d2d3... × 10^point
///
/// 规范化后 `digits` 没有前导零和尾随零，零值的 `digits` 为空。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecimalDigits {
    pub negative: bool,
    pub digits: Vec<u8>,
    pub point: i32,
}

impl DecimalDigits {
    pub fn zero() -> Self {
        Self::default()
    }

    fn from_ascii(negative: bool, ascii: &str, point: i32) -> Self {
        let digits = ascii.bytes().filter(u8::is_ascii_digit).map(|b| b - b'0').collect();
        let mut d = Self {
            negative,
            digits,
            point,
        };
        d.normalize();
        d
    }

    pub fn from_i64(value: i64) -> Self {
        let abs = (value as i128).abs().to_string();
        let len = abs.len() as i32;
        Self::from_ascii(value < 0, &abs, len)
    }

    /// 有限浮点数按最短可往返表示展开，非有限值返回 `None`
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let sci = format!("{:e}", value.abs());
        let (mantissa, exp) = sci.split_once('e')?;
        let exp: i32 = exp.parse().ok()?;
        Some(Self::from_ascii(value.is_sign_negative(), mantissa, exp + 1))
    }

    pub fn from_big(value: &BigDecimal) -> Self {
        let (int_val, scale) = value.as_bigint_and_exponent();
        let abs = int_val.abs().to_string();
        let point = abs.len() as i64 - scale;
        Self::from_ascii(int_val.sign() == Sign::Minus, &abs, point as i32)
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    fn normalize(&mut self) {
        let lead = self.digits.iter().take_while(|d| **d == 0).count();
        if lead == self.digits.len() {
            self.digits.clear();
            self.point = 0;
            self.negative = false;
            return;
        }
        self.digits.drain(..lead);
        self.point -= lead as i32;
        while self.digits.last() == Some(&0) {
            self.digits.pop();
        }
    }

    fn ascii(&self) -> String {
        self.digits.iter().map(|d| (b'0' + d) as char).collect()
    }

    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let text = format!("0.{}e{}", self.ascii(), self.point);
        let v: f64 = text.parse().unwrap_or(f64::NAN);
        if self.negative {
            -v
        } else {
            v
        }
    }

    /// 截断小数部分后的整数值，溢出返回 `None`
    pub fn to_i64_truncated(&self) -> Option<i64> {
        let mut acc: i128 = 0;
        for i in 0..self.point.max(0) as usize {
            let d = self.digits.get(i).copied().unwrap_or(0) as i128;
            acc = acc.checked_mul(10)?.checked_add(d)?;
            if acc > i64::MAX as i128 + 1 {
                return None;
            }
        }
        let signed = if self.negative { -acc } else { acc };
        i64::try_from(signed).ok()
    }

    pub fn to_big(&self) -> BigDecimal {
        if self.is_zero() {
            return BigDecimal::from(0);
        }
        let ascii = self.ascii();
        let scale = ascii.len() as i64 - self.point as i64;
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        let magnitude = BigInt::parse_bytes(ascii.as_bytes(), 10).unwrap_or_default();
        BigDecimal::new(BigInt::from_biguint(sign, magnitude.magnitude().clone()), scale)
    }

    /// 按 HALF_EVEN 舍入到 `frac` 位小数
    pub fn round_half_even(&mut self, frac: i32) {
        let keep = self.point + frac;
        if keep >= self.digits.len() as i32 {
            return;
        }
        if keep < 0 {
            self.digits.clear();
            self.normalize();
            return;
        }
        let keep = keep as usize;
        let first_dropped = self.digits[keep];
        let rest_nonzero = self.digits[keep + 1..].iter().any(|d| *d != 0);
        let last_kept_odd = keep > 0 && self.digits[keep - 1] % 2 == 1;
        let round_up = first_dropped > 5
            || (first_dropped == 5 && (rest_nonzero || last_kept_odd));
        self.digits.truncate(keep);

        if round_up {
            let mut i = keep;
            loop {
                if i == 0 {
                    self.digits.insert(0, 1);
                    self.point += 1;
                    break;
                }
                i -= 1;
                if self.digits[i] == 9 {
                    self.digits[i] = 0;
                } else {
                    self.digits[i] += 1;
                    break;
                }
            }
        }
        self.normalize();
    }
}

/// 编译后的数值掩码
#[derive(Debug, Clone, PartialEq)]
pub struct NumberMask {
    pattern: String,
    pos_prefix: String,
    pos_suffix: String,
    neg_prefix: String,
    neg_suffix: String,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    grouping_size: usize,
    decimal_shown: bool,
    min_exp_digits: Option<usize>,
    scale_shift: i32,
    symbols: Symbols,
}

struct SubPattern {
    prefix: String,
    suffix: String,
    number: String,
    scale_shift: i32,
}

fn split_subpatterns(pattern: &str) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut quoted = false;
    for c in pattern.chars() {
        if c == '\'' {
            quoted = !quoted;
        }
        if c == ';' && !quoted {
            parts.push(String::new());
            continue;
        }
        if let Some(last) = parts.last_mut() {
            last.push(c);
        }
    }
    parts
}

fn parse_subpattern(sub: &str, symbols: &Symbols) -> SubPattern {
    // 0: 前缀  1: 数字部分  2: 后缀
    let mut phase = 0;
    let mut prefix = String::new();
    let mut suffix = String::new();
    let mut number = String::new();
    let mut scale_shift = 0;
    let mut quoted = false;
    let mut chars = sub.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    quoted = false;
                    continue;
                }
            }
            if phase == 0 { prefix.push(c) } else { suffix.push(c) }
            continue;
        }

        if phase < 2 && matches!(c, '0' | '#' | ',' | '.') {
            phase = 1;
            number.push(c);
            continue;
        }
        if phase == 1 && c == 'E' {
            number.push(c);
            while let Some('0') = chars.peek() {
                number.push('0');
                chars.next();
            }
            continue;
        }
        if phase == 1 {
            phase = 2;
        }

        let affix = if phase == 0 { &mut prefix } else { &mut suffix };
        match c {
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    affix.push('\'');
                } else {
                    quoted = true;
                }
            }
            '%' => {
                scale_shift = 2;
                affix.push('%');
            }
            '\u{2030}' => {
                scale_shift = 3;
                affix.push('\u{2030}');
            }
            '\u{00A4}' => affix.push_str(&symbols.currency),
            other => affix.push(other),
        }
    }

    SubPattern {
        prefix,
        suffix,
        number,
        scale_shift,
    }
}

impl NumberMask {
    pub fn compile(pattern: &str, symbols: Symbols) -> Result<Self, String> {
        let subs = split_subpatterns(pattern);
        let positive = parse_subpattern(&subs[0], &symbols);
        if positive.number.is_empty() {
            return Err(format!("malformed number pattern '{}'", pattern));
        }

        let (int_part, rest) = match positive.number.find('.') {
            Some(i) => (&positive.number[..i], Some(&positive.number[i + 1..])),
            None => (positive.number.as_str(), None),
        };
        let (int_part, exp_part) = match int_part.find('E') {
            Some(i) => (&int_part[..i], Some(&int_part[i + 1..])),
            None => (int_part, None),
        };
        let (frac_part, exp_part) = match rest {
            Some(r) => match r.find('E') {
                Some(i) => (&r[..i], Some(&r[i + 1..])),
                None => (r, exp_part),
            },
            None => ("", exp_part),
        };

        let min_int = int_part.chars().filter(|c| *c == '0').count();
        let grouping_size = match int_part.rfind(',') {
            Some(i) => int_part[i + 1..]
                .chars()
                .filter(|c| matches!(c, '0' | '#'))
                .count(),
            None => 0,
        };
        let min_frac = frac_part.chars().filter(|c| *c == '0').count();
        let max_frac = frac_part
            .chars()
            .filter(|c| matches!(c, '0' | '#'))
            .count();
        let decimal_shown = rest.is_some() && max_frac == 0;
        let min_exp_digits = exp_part.map(|e| e.len().max(1));

        let (neg_prefix, neg_suffix) = match subs.get(1) {
            Some(neg) => {
                let n = parse_subpattern(neg, &symbols);
                (n.prefix, n.suffix)
            }
            None => (format!("-{}", positive.prefix), positive.suffix.clone()),
        };

        Ok(Self {
            pattern: pattern.to_string(),
            pos_prefix: positive.prefix,
            pos_suffix: positive.suffix,
            neg_prefix,
            neg_suffix,
            min_int,
            min_frac,
            max_frac,
            grouping_size,
            decimal_shown,
            min_exp_digits,
            scale_shift: positive.scale_shift,
            symbols,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn max_fraction_digits(&self) -> usize {
        self.max_frac
    }

    pub fn format_i64(&self, value: i64) -> String {
        self.format(&DecimalDigits::from_i64(value))
    }

    pub fn format_big(&self, value: &BigDecimal) -> String {
        self.format(&DecimalDigits::from_big(value))
    }

    pub fn format_f64(&self, value: f64) -> String {
        match DecimalDigits::from_f64(value) {
            Some(d) => self.format(&d),
            None if value.is_nan() => "NaN".to_string(),
            None if value > 0.0 => format!("{}\u{221E}{}", self.pos_prefix, self.pos_suffix),
            None => format!("{}\u{221E}{}", self.neg_prefix, self.neg_suffix),
        }
    }

    pub fn format(&self, value: &DecimalDigits) -> String {
        let mut d = value.clone();
        if !d.is_zero() {
            d.point += self.scale_shift;
        }

        let body = match self.min_exp_digits {
            Some(min_exp) => self.format_scientific(&mut d, min_exp),
            None => {
                d.round_half_even(self.max_frac as i32);
                self.format_plain(&d, true)
            }
        };

        if d.negative && !d.is_zero() {
            format!("{}{}{}", self.neg_prefix, body, self.neg_suffix)
        } else {
            format!("{}{}{}", self.pos_prefix, body, self.pos_suffix)
        }
    }

    fn format_scientific(&self, d: &mut DecimalDigits, min_exp: usize) -> String {
        let int_digits = self.min_int.max(1) as i32;
        let mut exponent = 0;
        if !d.is_zero() {
            exponent = d.point - int_digits;
            d.point = int_digits;
            d.round_half_even(self.max_frac as i32);
            if d.point > int_digits {
                exponent += d.point - int_digits;
                d.point = int_digits;
            }
        }
        let mantissa = self.format_plain(d, false);
        let exp_digits = format!("{:0width$}", exponent.abs(), width = min_exp);
        if exponent < 0 {
            format!("{}E-{}", mantissa, exp_digits)
        } else {
            format!("{}E{}", mantissa, exp_digits)
        }
    }

    fn format_plain(&self, d: &DecimalDigits, grouping: bool) -> String {
        let len = d.digits.len() as i32;
        let mut int_str = String::new();
        for i in 0..d.point.max(0) {
            let digit = if i < len { d.digits[i as usize] } else { 0 };
            int_str.push((b'0' + digit) as char);
        }
        while int_str.len() < self.min_int {
            int_str.insert(0, '0');
        }

        let mut frac_str = String::new();
        if d.point < 0 {
            frac_str.extend(std::iter::repeat('0').take((-d.point) as usize));
        }
        for i in d.point.max(0)..len {
            frac_str.push((b'0' + d.digits[i as usize]) as char);
        }
        while frac_str.len() < self.min_frac {
            frac_str.push('0');
        }

        if int_str.is_empty() && frac_str.is_empty() {
            int_str.push('0');
        }

        let mut out = String::with_capacity(int_str.len() + frac_str.len() + 8);
        match (grouping, self.symbols.grouping) {
            (true, Some(sep)) if self.grouping_size > 0 => {
                let n = int_str.len();
                for (i, c) in int_str.chars().enumerate() {
                    if i > 0 && (n - i) % self.grouping_size == 0 {
                        out.push(sep);
                    }
                    out.push(c);
                }
            }
            _ => out.push_str(&int_str),
        }
        if !frac_str.is_empty() || self.decimal_shown {
            out.push(self.symbols.decimal);
            out.push_str(&frac_str);
        }
        out
    }

    /// 解析文本
    ///
    /// 非宽松模式下，数字之后（去掉后缀）还有剩余字符即报错；
    /// 宽松模式忽略剩余字符。
    pub fn parse(&self, text: &str, lenient: bool) -> Result<DecimalDigits, String> {
        let mut candidates: Vec<(bool, &str, &str)> = Vec::with_capacity(3);
        if text.starts_with(self.neg_prefix.as_str()) && !self.neg_prefix.is_empty() {
            candidates.push((true, self.neg_prefix.as_str(), self.neg_suffix.as_str()));
        }
        if text.starts_with(self.pos_prefix.as_str()) {
            candidates.push((false, self.pos_prefix.as_str(), self.pos_suffix.as_str()));
        }
        candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        if candidates.is_empty() && self.pos_prefix.trim().is_empty() {
            candidates.push((false, "", self.pos_suffix.as_str()));
        }

        let mut last_err = format!("unparseable number '{}'", text);
        for (negative, prefix, suffix) in candidates {
            match self.parse_body(text, prefix.len(), negative, suffix, lenient) {
                Ok(d) => return Ok(d),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn parse_body(
        &self,
        text: &str,
        start: usize,
        negative: bool,
        suffix: &str,
        lenient: bool,
    ) -> Result<DecimalDigits, String> {
        let body = &text[start..];
        let mut ascii = String::new();
        let mut point: Option<i32> = None;
        let mut exponent: i32 = 0;
        let mut consumed = 0;
        let mut chars = body.char_indices().peekable();

        while let Some(&(i, c)) = chars.peek() {
            if c.is_ascii_digit() {
                ascii.push(c);
                chars.next();
                consumed = i + c.len_utf8();
            } else if c == self.symbols.decimal && point.is_none() {
                point = Some(ascii.len() as i32);
                chars.next();
                consumed = i + c.len_utf8();
            } else if Some(c) == self.symbols.grouping
                && self.grouping_size > 0
                && point.is_none()
                && !ascii.is_empty()
            {
                chars.next();
                consumed = i + c.len_utf8();
            } else if (c == 'E' || c == 'e') && !ascii.is_empty() {
                let tail = &body[i + 1..];
                let (sign, digits_start) = match tail.chars().next() {
                    Some('-') => (-1, 1),
                    Some('+') => (1, 1),
                    _ => (1, 0),
                };
                let exp_digits: String = tail[digits_start..]
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                if exp_digits.is_empty() {
                    break;
                }
                exponent = sign * exp_digits.parse::<i32>().map_err(|e| e.to_string())?;
                consumed = i + 1 + digits_start + exp_digits.len();
                break;
            } else {
                break;
            }
        }

        if ascii.is_empty() {
            return Err(format!("unparseable number '{}'", text));
        }

        let mut end = start + consumed;
        if !suffix.is_empty() {
            if text[end..].starts_with(suffix) {
                end += suffix.len();
            } else if !lenient {
                return Err(format!("expected suffix '{}' at position {}", suffix, end));
            }
        }
        if end < text.len() && !lenient {
            let position = text[..end].chars().count();
            return Err(format!(
                "non-numeric character found at position {}",
                position + 1
            ));
        }

        let int_len = point.unwrap_or(ascii.len() as i32);
        let mut shift = exponent;
        if suffix.contains('%') || text[..start].contains('%') {
            shift -= 2;
        } else if suffix.contains('\u{2030}') || text[..start].contains('\u{2030}') {
            shift -= 3;
        }
        Ok(DecimalDigits::from_ascii(negative, &ascii, int_len + shift))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn mask(p: &str) -> NumberMask {
        NumberMask::compile(p, Symbols::default()).expect("掩码编译失败")
    }

    #[test]
    fn test_format_grouping_and_fraction() {
        let m = mask("#,##0.00");
        assert_eq!(m.format_f64(9123.0), "9,123.00");
        assert_eq!(m.format_f64(-1234567.891), "-1,234,567.89");
        assert_eq!(m.format_f64(0.0), "0.00");
    }

    #[test]
    fn test_format_zero_padding() {
        let m = mask("0000000");
        assert_eq!(m.format_i64(12345), "0012345");
        assert_eq!(m.format_i64(-12), "-0000012");
        assert_eq!(m.format_i64(i64::MIN), "-9223372036854775808");
    }

    #[test]
    fn test_format_default_masks() {
        assert_eq!(mask("####0;-####0").format_i64(-42), "-42");
        let n = mask("####0.0#########;-####0.0#########");
        assert_eq!(n.format_f64(1.5), "1.5");
        assert_eq!(n.format_f64(2.0), "2.0");
        let b = mask("######0.0###################;-######0.0###################");
        let big = BigDecimal::from_str("123456789012345678.9349").unwrap();
        assert_eq!(b.format_big(&big), "123456789012345678.9349");
    }

    #[test]
    fn test_rounding_uses_shortest_decimal_form() {
        // 2.675 的最短十进制形式是 "2.675"，HALF_EVEN 进到 2.68，而不是按二进制近似值 2.67499... 舍掉
        let m = mask("00.00");
        assert_eq!(m.format_f64(2.675), "02.68");
        assert_eq!(m.format_f64(2.665), "02.66");
    }

    #[test]
    fn test_half_even_rounding() {
        let m = mask("0");
        assert_eq!(m.format_f64(0.5), "0");
        assert_eq!(m.format_f64(1.5), "2");
        assert_eq!(m.format_f64(2.5), "2");
        assert_eq!(m.format_f64(2.51), "3");
        assert_eq!(mask("0.0").format_f64(9.96), "10.0");
    }

    #[test]
    fn test_optional_integer_digits() {
        let m = mask("#.##");
        assert_eq!(m.format_f64(0.0), "0");
        assert_eq!(m.format_f64(0.5), ".5");
        assert_eq!(m.format_f64(12.346), "12.35");
    }

    #[test]
    fn test_percent_and_literal_affixes() {
        let m = mask("0.0%");
        assert_eq!(m.format_f64(0.256), "25.6%");
        assert_eq!(m.parse("25.6%", false).unwrap().to_f64(), 0.256);
        let c = mask("'EUR' #,##0");
        assert_eq!(c.format_i64(1000), "EUR 1,000");
        let cur = mask("\u{00A4}0.00");
        assert_eq!(cur.format_f64(3.0), "$3.00");
    }

    #[test]
    fn test_negative_subpattern() {
        let m = mask("0.00;(0.00)");
        assert_eq!(m.format_f64(-3.5), "(3.50)");
        let parsed = m.parse("(3.50)", false).unwrap();
        assert!(parsed.negative);
        assert_eq!(parsed.to_f64(), -3.5);
    }

    #[test]
    fn test_scientific() {
        let m = mask("0.###E0");
        assert_eq!(m.format_f64(12345.0), "1.234E4");
        assert_eq!(m.format_f64(0.00012), "1.2E-4");
        assert_eq!(m.format_f64(0.0), "0E0");
    }

    #[test]
    fn test_parse_strict_and_lenient() {
        let m = mask("####0");
        assert_eq!(m.parse("123", false).unwrap().to_i64_truncated(), Some(123));
        assert_eq!(m.parse("-5", false).unwrap().to_i64_truncated(), Some(-5));
        let err = m.parse("12abc", false).unwrap_err();
        assert!(err.contains("position 3"));
        assert_eq!(m.parse("12abc", true).unwrap().to_i64_truncated(), Some(12));
        assert!(m.parse("abc", true).is_err());
        assert!(m.parse("", false).is_err());
    }

    #[test]
    fn test_parse_grouping() {
        let m = mask("#,##0.00");
        assert_eq!(m.parse("1,234.50", false).unwrap().to_f64(), 1234.5);
        assert!(mask("####0").parse("1,234", false).is_err());
    }

    #[test]
    fn test_custom_symbols() {
        let symbols = Symbols::from_strings(",", ".", "\u{20AC}");
        let m = NumberMask::compile("#,##0.00", symbols).unwrap();
        assert_eq!(m.format_f64(1234.5), "1.234,50");
        assert_eq!(m.parse("1.234,50", false).unwrap().to_f64(), 1234.5);
    }

    #[test]
    fn test_digits_conversions() {
        let d = DecimalDigits::from_f64(-0.001).unwrap();
        assert!(d.negative);
        assert_eq!(d.digits, vec![1]);
        assert_eq!(d.point, -2);
        assert_eq!(d.to_big(), BigDecimal::from_str("-0.001").unwrap());

        let big = DecimalDigits::from_big(&BigDecimal::from_str("1200.50").unwrap());
        assert_eq!(big.digits, vec![1, 2, 0, 0, 5]);
        assert_eq!(big.point, 4);
        assert_eq!(big.to_i64_truncated(), Some(1200));

        let huge = DecimalDigits::from_ascii(false, "99999999999999999999", 20);
        assert_eq!(huge.to_i64_truncated(), None);
        assert_eq!(DecimalDigits::from_i64(i64::MIN).to_i64_truncated(), Some(i64::MIN));
    }
}
