/// Placeholder rendered for values that are not known (yet).
pub const MISSING: &str = "-";

const GROUP_SEPARATOR: char = '\u{00A0}';
const DECIMAL_SEPARATOR: char = ',';

/// Render a number the way Russian-locale views do: digits grouped by three
/// with a non-breaking space, comma as the decimal separator and exactly
/// `fraction_digits` decimals.
///
/// `None` and non-finite values render as `"-"`, never as `0`.
pub fn format_number(value: Option<f64>, fraction_digits: usize) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return MISSING.to_string();
    };

    let fixed = format!("{:.*}", fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    // "-0,00" is not a useful rendering of a tiny negative number.
    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(digit);
    }
    if let Some(frac_part) = frac_part {
        out.push(DECIMAL_SEPARATOR);
        out.push_str(frac_part);
    }
    out
}

/// Day-change style percentage: two decimals and a `%` suffix.
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{}%", format_number(Some(v), 2)),
        None => MISSING.to_string(),
    }
}
