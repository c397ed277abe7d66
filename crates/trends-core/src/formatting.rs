/// Round `value` to `decimals` decimal places (half away from zero).
///
/// # Examples
///
/// ```
/// use trends_core::formatting::round_to;
///
/// assert_eq!(round_to(45.456, 2), 45.46);
/// assert_eq!(round_to(10.0 / 3.0, 2), 3.33);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Format a search total as a whole number with comma thousands separators.
///
/// # Examples
///
/// ```
/// use trends_core::formatting::format_total;
///
/// assert_eq!(format_total(1280.0), "1,280");
/// assert_eq!(format_total(1234567.4), "1,234,567");
/// assert_eq!(format_total(999.5), "1,000");
/// ```
pub fn format_total(value: f64) -> String {
    let whole = value.round();
    let digits = format!("{:.0}", whole.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format an interest value the way it reads on a dashboard: at most two
/// decimals, trailing zeros dropped, no thousands separators.
///
/// # Examples
///
/// ```
/// use trends_core::formatting::format_value;
///
/// assert_eq!(format_value(80.0), "80");
/// assert_eq!(format_value(45.5), "45.5");
/// assert_eq!(format_value(33.333), "33.33");
/// ```
pub fn format_value(value: f64) -> String {
    let rounded = round_to(value, 2);
    let text = format!("{:.2}", rounded);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use trends_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    round_to((part / whole) * 100.0, decimal_places)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
