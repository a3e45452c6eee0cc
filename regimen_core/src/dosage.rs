//! Dosage text helpers.
//!
//! Dosages are free-form strings. Simple values look like "40" or "2.5";
//! combination drugs use paired values such as "49/51". Only the leading
//! number is ever used for numeric comparison.

/// Join a dosage and unit for display, e.g. ("40", "mg") -> "40 mg"
pub fn format_dosage(dosage: &str, unit: &str) -> String {
    let dosage = dosage.trim();
    let unit = unit.trim();
    match (dosage.is_empty(), unit.is_empty()) {
        (_, true) => dosage.to_string(),
        (true, false) => unit.to_string(),
        (false, false) => format!("{} {}", dosage, unit),
    }
}

/// Parse the leading numeric value of a dosage string.
///
/// "49/51" yields 49.0 and "12.5" yields 12.5. Returns `None` when the text
/// does not start with a number.
pub fn leading_value(dosage: &str) -> Option<f64> {
    let first = dosage.trim().split('/').next()?.trim();

    let numeric: String = first
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if numeric.is_empty() {
        return None;
    }

    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether two (dosage, unit) pairs are textually identical
pub fn same_dosage(a_dosage: &str, a_unit: &str, b_dosage: &str, b_unit: &str) -> bool {
    a_dosage.trim() == b_dosage.trim() && a_unit.trim() == b_unit.trim()
}
