/// Format a floating-point number with a fixed number of decimal places and
/// no grouping, rounding half away from zero.
///
/// This is the format used for exported artifacts.
///
/// # Examples
///
/// ```
/// use meter_core::formatting::format_fixed;
///
/// assert_eq!(format_fixed(12.345, 2), "12.35");
/// assert_eq!(format_fixed(0.5, 2), "0.50");
/// assert_eq!(format_fixed(1234.5, 0), "1235");
/// ```
pub fn format_fixed(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let rounded = round_half_away(value.abs(), decimals);
    let body = format!("{:.prec$}", rounded, prec = decimals as usize);
    if negative && rounded != 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use meter_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let fixed = format_fixed(value, decimals);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let grouped = group_thousands(int_part);
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format a consumption figure with two decimals and its unit.
///
/// # Examples
///
/// ```
/// use meter_core::formatting::format_consumption;
///
/// assert_eq!(format_consumption(1234.5, "m³"), "1,234.50 m³");
/// assert_eq!(format_consumption(3.0, ""), "3.00");
/// ```
pub fn format_consumption(value: f64, unit: &str) -> String {
    let number = format_number(value, 2);
    if unit.is_empty() {
        number
    } else {
        format!("{} {}", number, unit)
    }
}

/// Format a signed percentage change with one decimal, e.g. `"+12.5%"`.
///
/// # Examples
///
/// ```
/// use meter_core::formatting::format_change;
///
/// assert_eq!(format_change(12.54), "+12.5%");
/// assert_eq!(format_change(-3.0), "-3.0%");
/// assert_eq!(format_change(0.0), "0.0%");
/// ```
pub fn format_change(percent: f64) -> String {
    let body = format_number(percent, 1);
    if percent > 0.0 && body != "0.0" {
        format!("+{}%", body)
    } else {
        format!("{}%", body)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Round a non-negative value to `decimals` places, halves away from zero.
///
/// A tiny epsilon (scaled to the value) is added before rounding so that
/// decimal midpoints such as `12.345`, whose binary form lies just below the
/// midpoint, still round up.
fn round_half_away(abs_value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    ((abs_value * factor) + epsilon).round() / factor
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_fixed ─────────────────────────────────────────────────────────

    #[test]
    fn test_format_fixed_midpoint_rounds_up() {
        assert_eq!(format_fixed(12.345, 2), "12.35");
        assert_eq!(format_fixed(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_fixed_pads_decimals() {
        assert_eq!(format_fixed(0.5, 2), "0.50");
        assert_eq!(format_fixed(7.0, 2), "7.00");
    }

    #[test]
    fn test_format_fixed_no_grouping() {
        assert_eq!(format_fixed(1_234_567.891, 2), "1234567.89");
    }

    #[test]
    fn test_format_fixed_negative() {
        assert_eq!(format_fixed(-2.5, 1), "-2.5");
    }

    #[test]
    fn test_format_fixed_negative_rounding_to_zero_has_no_sign() {
        assert_eq!(format_fixed(-0.001, 2), "0.00");
    }

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_no_thousands() {
        assert_eq!(format_number(123.456, 2), "123.46");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
    }

    #[test]
    fn test_format_number_millions() {
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_exact_thousands() {
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_rounding_carries_into_thousands() {
        assert_eq!(format_number(999.999, 2), "1,000.00");
    }

    // ── format_consumption ───────────────────────────────────────────────────

    #[test]
    fn test_format_consumption_with_unit() {
        assert_eq!(format_consumption(12.0, "GJ"), "12.00 GJ");
    }

    #[test]
    fn test_format_consumption_without_unit() {
        assert_eq!(format_consumption(1_500.25, ""), "1,500.25");
    }

    // ── format_change ────────────────────────────────────────────────────────

    #[test]
    fn test_format_change_positive() {
        assert_eq!(format_change(100.0), "+100.0%");
    }

    #[test]
    fn test_format_change_negative() {
        assert_eq!(format_change(-25.0), "-25.0%");
    }

    #[test]
    fn test_format_change_zero() {
        assert_eq!(format_change(0.0), "0.0%");
    }

    #[test]
    fn test_format_change_tiny_positive_has_no_plus() {
        assert_eq!(format_change(0.01), "0.0%");
    }

    // ── group_thousands ──────────────────────────────────────────────────────

    #[test]
    fn test_group_thousands_one_digit() {
        assert_eq!(group_thousands("5"), "5");
    }

    #[test]
    fn test_group_thousands_four_digits() {
        assert_eq!(group_thousands("1234"), "1,234");
    }

    #[test]
    fn test_group_thousands_seven_digits() {
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
