//! Display helpers for numbers, percentages, dates and table text.
//!
//! Output follows the `ru-RU` conventions the exchange data is published in:
//! a no-break space groups thousands and a comma separates decimals.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::TRADING_STATUS;

/// Rendered in place of an absent value.
pub const PLACEHOLDER: &str = "-";

/// Rendered when a date field is empty.
pub const NO_DATA: &str = "Нет данных";

const GROUP_SEPARATOR: char = '\u{a0}';
const DECIMAL_SEPARATOR: char = ',';
const ELLIPSIS: &str = "...";

fn group_int_digits(int_part: &str) -> String {
    let len = int_part.chars().count();
    let mut out = String::with_capacity(int_part.len() + len / 3 * 2);
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
    }
    out
}

fn round_half_away_from_zero(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Format a number with thousands grouping and exactly `decimals` fraction digits.
///
/// Absent values render as [`PLACEHOLDER`].
pub fn format_number(value: Option<f64>, decimals: u32) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let rounded = round_half_away_from_zero(value, decimals);
    let negative = rounded < 0.0;
    let fixed = format!("{:.*}", decimals as usize, rounded.abs());

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_int_digits(int_part));
    if let Some(frac) = frac_part {
        out.push(DECIMAL_SEPARATOR);
        out.push_str(frac);
    }
    out
}

/// Format a percentage change with an explicit sign for non-negative values.
///
/// ```
/// use etfdash::format::format_percent;
///
/// assert_eq!(format_percent(Some(5.1), 2), "+5.10");
/// assert_eq!(format_percent(Some(-3.0), 2), "-3.00");
/// assert_eq!(format_percent(None, 2), "-");
/// ```
pub fn format_percent(value: Option<f64>, decimals: u32) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    // -0.0 compares equal to zero; drop its sign so it renders as "+0.00".
    let value = if value == 0.0 { 0.0 } else { value };
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.*}", decimals as usize)
}

/// Render a date string as `DD.MM.YYYY`.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and
/// already-localized `DD.MM.YYYY`. Anything else is returned unchanged.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NO_DATA.to_string();
    };

    match parse_date(raw) {
        Some(date) => date.format("%d.%m.%Y").to_string(),
        None => raw.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .ok()
}

/// Shorten `text` to at most `max_len` characters, ending in `...` when cut.
///
/// ```
/// use etfdash::format::truncate;
///
/// assert_eq!(truncate("abcdefgh", 5), "ab...");
/// assert_eq!(truncate("abc", 5), "abc");
/// ```
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len < ELLIPSIS.len() {
        return ELLIPSIS[..max_len].to_string();
    }
    let mut out: String = text.chars().take(max_len - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Direction of a price change, used to pick a display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTrend {
    Up,
    Down,
    Neutral,
}

impl PriceTrend {
    pub fn classify(value: Option<f64>) -> Self {
        match value {
            None => Self::Neutral,
            Some(v) if v.is_nan() => Self::Neutral,
            Some(v) if v >= 0.0 => Self::Up,
            Some(_) => Self::Down,
        }
    }
}

/// Badge category for a fund's trade status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatusClass {
    Trading,
    Halted,
    Neutral,
}

impl TradeStatusClass {
    pub fn classify(status: &str) -> Self {
        let status = status.trim();
        if status.is_empty() {
            Self::Neutral
        } else if status == TRADING_STATUS {
            Self::Trading
        } else {
            Self::Halted
        }
    }
}
