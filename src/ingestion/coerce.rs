//! Scalar type coercion for CSV cells.

use serde_json::{Number, Value};

/// Convert a raw CSV cell into a typed JSON value.
///
/// The cell is trimmed first, then:
///
/// - empty → `null`
/// - `true` / `false` (any case) → boolean
/// - a finite number → integer if it has no fractional part and fits `i64`, else float
/// - anything else → the trimmed string
pub fn coerce_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    match parse_number(trimmed) {
        Some(n) => Value::Number(n),
        None => Value::String(trimmed.to_owned()),
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }

    // `f64::from_str` also accepts "inf"/"nan"; those stay strings.
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else {
        Number::from_f64(f)
    }
}
