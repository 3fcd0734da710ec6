// Utility helpers for parsing, date labels and number formatting.
//
// This module centralizes the "dirty" CSV/number/date handling so the rest of
// the code can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches time-series headers such as `1/22/20` or `01/02/21`.
static DATE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}/\d{1,2}/\d{2}$").unwrap_or_else(|e| panic!("date label regex: {e}"))
});

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Parse a count cell. Integral floats like `12.0` are accepted.
pub fn parse_count_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned = s.replace(',', "");
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    let f = parse_f64_safe(Some(&cleaned))?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn is_date_label(s: &str) -> bool {
    DATE_LABEL.is_match(s.trim())
}

/// Parse an `mm/dd/yy` header, padded or not.
pub fn parse_date_label(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if !is_date_label(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%m/%d/%y").ok()
}

/// Zero-pad-stripped header form, e.g. `1/2/21`.
pub fn display_label(date: NaiveDate) -> String {
    date.format("%-m/%-d/%y").to_string()
}

/// Long form used in replies, e.g. `Jan 2, 2021`.
pub fn long_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Short form used for chart ticks, e.g. `Jan 2, 21`.
pub fn tick_date(date: NaiveDate) -> String {
    date.format("%b %-d, %y").to_string()
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values (counts in
    // replies such as `1,234 new cases`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_strips_separators_and_accepts_integral_floats() {
        assert_eq!(parse_count_safe(Some(" 1,234 ")), Some(1234));
        assert_eq!(parse_count_safe(Some("12.0")), Some(12));
        assert_eq!(parse_count_safe(Some("-3")), Some(-3));
        assert_eq!(parse_count_safe(Some("12.5")), None);
        assert_eq!(parse_count_safe(Some("n/a")), None);
        assert_eq!(parse_count_safe(Some("")), None);
        assert_eq!(parse_count_safe(None), None);
    }

    #[test]
    fn date_labels_parse_padded_and_unpadded() {
        let d = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        assert_eq!(parse_date_label("01/02/21"), Some(d));
        assert_eq!(parse_date_label("1/2/21"), Some(d));
        assert_eq!(parse_date_label("Province_State"), None);
        assert_eq!(parse_date_label("2021-01-02"), None);
        assert!(!is_date_label("1/2/2021"));
    }

    #[test]
    fn display_forms_strip_zero_padding() {
        let d = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        assert_eq!(display_label(d), "1/2/21");
        assert_eq!(long_date(d), "Jan 2, 2021");
        assert_eq!(tick_date(d), "Jan 2, 21");
    }

    #[test]
    fn format_number_inserts_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(-0.0001, 2), "0.00");
        assert_eq!(format_int(9855), "9,855");
    }

    #[test]
    fn average_of_empty_slice_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 3.0]), 2.0);
    }
}
