//! Display formatting for application fields
//!
//! Amounts follow the Russian locale: digits grouped by a non-breaking
//! space, decimal comma, rouble sign suffix.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thousands::{digits, Separable, SeparatorPolicy};

/// Shown in place of missing values
pub const PLACEHOLDER: &str = "—";

const CURRENCY_SUFFIX: &str = "\u{a0}₽";

const GROUPING: SeparatorPolicy<'static> = SeparatorPolicy {
    separator: "\u{a0}",
    groups: &[3],
    digits: digits::ASCII_DECIMAL,
};

const DATE_DISPLAY: &str = "%d.%m.%Y, %H:%M";

/// Format a number with grouped thousands and at most two fraction digits
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_number(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let mut out = String::new();
    if value.is_sign_negative() && cents > 0 {
        out.push('-');
    }
    out.push_str(&whole.separate_by_policy(GROUPING));
    if fraction != 0 {
        out.push(',');
        out.push_str(format!("{fraction:02}").trim_end_matches('0'));
    }
    out
}

/// Format a whole rouble amount, e.g. `100 000 ₽`
#[must_use]
pub fn format_rubles(amount: u64) -> String {
    format!("{}{CURRENCY_SUFFIX}", amount.separate_by_policy(GROUPING))
}

/// Format an optional loan amount; missing or zero becomes the placeholder
#[must_use]
pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) if value.is_finite() && value != 0.0 => {
            format!("{}{CURRENCY_SUFFIX}", format_number(value))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Format an optional loan term in months
#[must_use]
pub fn format_term(term: Option<u32>) -> String {
    match term {
        Some(months) if months > 0 => format!("{months} mo."),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Free text, or the placeholder when empty
#[must_use]
pub fn format_text(text: Option<&str>) -> &str {
    match text.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => PLACEHOLDER,
    }
}

/// Format a creation timestamp as `dd.mm.yyyy, hh:mm`
///
/// The timestamp is shown in its own offset. Input that doesn't parse is
/// returned unchanged.
#[must_use]
pub fn format_created_at(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DATE_DISPLAY).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.format(DATE_DISPLAY).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(DATE_DISPLAY).to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%d.%m.%Y, 00:00").to_string();
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Some(100_000.0)), "100\u{a0}000\u{a0}₽");
        assert_eq!(format_amount(Some(1_250_000.0)), "1\u{a0}250\u{a0}000\u{a0}₽");
        assert_eq!(format_amount(Some(999.0)), "999\u{a0}₽");
        assert_eq!(format_amount(Some(1234.5)), "1\u{a0}234,5\u{a0}₽");
        assert_eq!(format_amount(Some(0.0)), PLACEHOLDER);
        assert_eq!(format_amount(None), PLACEHOLDER);
    }

    #[test]
    fn test_format_term() {
        assert_eq!(format_term(Some(12)), "12 mo.");
        assert_eq!(format_term(None), PLACEHOLDER);
        assert_eq!(format_term(Some(0)), PLACEHOLDER);
    }

    #[test]
    fn test_format_text() {
        assert_eq!(format_text(Some("Car repair")), "Car repair");
        assert_eq!(format_text(Some("   ")), PLACEHOLDER);
        assert_eq!(format_text(None), PLACEHOLDER);
    }

    #[test]
    fn test_format_rubles() {
        assert_eq!(format_rubles(8_333), "8\u{a0}333\u{a0}₽");
        assert_eq!(format_rubles(0), "0\u{a0}₽");
    }

    #[test]
    fn test_format_created_at() {
        assert_eq!(format_created_at("2024-05-01T09:05:00"), "01.05.2024, 09:05");
        assert_eq!(
            format_created_at("2024-05-01 21:30:15.123456"),
            "01.05.2024, 21:30"
        );
        assert_eq!(
            format_created_at("2024-12-31T23:59:00+03:00"),
            "31.12.2024, 23:59"
        );
        assert_eq!(
            format_created_at("Wed, 01 May 2024 10:00:00 GMT"),
            "01.05.2024, 10:00"
        );
        assert_eq!(format_created_at("2024-05-01"), "01.05.2024, 00:00");
        assert_eq!(format_created_at("yesterday"), "yesterday");
    }
}
