use std::fmt;

/// A single CIF value.
///
/// Tokens that look like plain decimal numbers (optional sign, optional
/// integer part, optional fractional part, at least one digit) are stored as
/// numbers; everything else, including exponents and standard uncertainties
/// such as `1.234(5)`, stays text. [`CifValue::as_f64`] still reads those.
///
/// Numbers keep the token as written, so `01` still labels as `01`. Two
/// numbers compare equal when their values do.
#[derive(Debug, Clone)]
pub enum CifValue {
    Number { value: f64, raw: String },
    Text(String),
}

impl CifValue {
    /// Coerces a raw token.
    pub fn parse(token: &str) -> Self {
        if looks_numeric(token) {
            if let Ok(value) = token.parse::<f64>() {
                return CifValue::Number {
                    value,
                    raw: token.to_string(),
                };
            }
        }
        CifValue::Text(token.to_string())
    }

    /// `.` (inapplicable) and `?` (unknown).
    pub fn is_null(&self) -> bool {
        matches!(self, CifValue::Text(t) if t == "." || t == "?")
    }

    /// Numeric reading of the value, tolerating a trailing uncertainty in
    /// parentheses. Null markers read as `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CifValue::Number { value, .. } => Some(*value),
            CifValue::Text(_) if self.is_null() => None,
            CifValue::Text(t) => {
                let t = t.trim();
                let t = match t.find('(') {
                    Some(i) if t.ends_with(')') => &t[..i],
                    _ => t,
                };
                t.parse().ok()
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CifValue::Text(t) => Some(t),
            CifValue::Number { .. } => None,
        }
    }

    /// String form for use as a label; null markers become the empty string.
    pub fn to_label(&self) -> String {
        if self.is_null() {
            String::new()
        } else {
            self.to_string()
        }
    }
}

impl PartialEq for CifValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CifValue::Number { value: a, .. }, CifValue::Number { value: b, .. }) => a == b,
            (CifValue::Text(a), CifValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CifValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CifValue::Number { raw, .. } => f.write_str(raw),
            CifValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<f64> for CifValue {
    fn from(value: f64) -> Self {
        CifValue::Number {
            value,
            raw: value.to_string(),
        }
    }
}

impl From<&str> for CifValue {
    fn from(t: &str) -> Self {
        CifValue::Text(t.to_string())
    }
}

/// `^[+-]?(\d+)?(\.\d+)?$` with at least one digit.
pub(crate) fn looks_numeric(token: &str) -> bool {
    let body = token.strip_prefix(['+', '-']).unwrap_or(token);
    let (int, frac) = match body.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (body, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let int_ok = all_digits(int);
    let frac_ok = frac.is_none_or(|f| !f.is_empty() && all_digits(f));
    int_ok && frac_ok && (!int.is_empty() || frac.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_plain_decimals_only() {
        assert_eq!(CifValue::parse("-1.2"), CifValue::from(-1.2));
        assert_eq!(CifValue::parse("+4.5"), CifValue::from(4.5));
        assert_eq!(CifValue::parse(".5"), CifValue::from(0.5));
        assert_eq!(CifValue::parse("42"), CifValue::from(42.0));
        assert_eq!(CifValue::parse("1."), CifValue::Text("1.".into()));
        assert_eq!(CifValue::parse("1e5"), CifValue::Text("1e5".into()));
        assert_eq!(CifValue::parse("."), CifValue::Text(".".into()));
        assert_eq!(CifValue::parse("-"), CifValue::Text("-".into()));
        assert_eq!(CifValue::parse("CA"), CifValue::Text("CA".into()));
    }

    #[test]
    fn numeric_reading_handles_uncertainty_and_nulls() {
        assert_eq!(CifValue::parse("10.234(3)").as_f64(), Some(10.234));
        assert_eq!(CifValue::parse("1e-2").as_f64(), Some(0.01));
        assert_eq!(CifValue::parse("?").as_f64(), None);
        assert_eq!(CifValue::parse(".").as_f64(), None);
        assert_eq!(CifValue::parse("abc").as_f64(), None);
    }

    #[test]
    fn labels_drop_null_markers() {
        assert_eq!(CifValue::parse(".").to_label(), "");
        assert_eq!(CifValue::parse("12").to_label(), "12");
        assert_eq!(CifValue::parse("A").to_label(), "A");
    }

    #[test]
    fn numbers_keep_their_spelling() {
        let padded = CifValue::parse("01");
        assert_eq!(padded.as_f64(), Some(1.0));
        assert_eq!(padded.to_label(), "01");
        assert_eq!(CifValue::parse("+4.50").to_string(), "+4.50");
        assert_eq!(padded, CifValue::from(1.0));
        assert_ne!(padded, CifValue::Text("01".into()));
    }
}
