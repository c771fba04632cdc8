/// Rounds a value to the given number of decimal places, using the usual
/// half-away-from-zero rule.
#[inline]
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Parses the leading number off a string like `"144.4 MBit/s"` or `"5180 MHz"`,
/// returning the number and whatever token follows it.
pub(crate) fn leading_number(value: &str) -> Result<(f64, Option<&str>), std::num::ParseFloatError> {
    let mut parts = value.split_whitespace();
    let number = parts.next().unwrap_or_default().parse::<f64>()?;

    Ok((number, parts.next()))
}
