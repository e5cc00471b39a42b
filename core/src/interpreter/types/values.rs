//! Runtime value type
//!
//! The value domain is closed: number, string, boolean and null. Coercions
//! between them are spelled out here rather than borrowed from any host
//! language.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Runtime value type
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// `false`, `null`, `0`, `NaN` and `""` are falsy; everything else is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Numeric view used by arithmetic and loose comparison
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) =>
        {
            trimmed.parse::<f64>().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

/// Render a number the way the language prints it: integral values without a
/// fractional part, `NaN`, `Infinity`, `-Infinity`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
        }
    }
}

/// Numbers serialize as JSON integers when integral. JSON has no NaN or
/// infinity, so non-finite numbers become `{"number": "NaN"}` (or
/// `"Infinity"` / `"-Infinity"`) and never collide with strings.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Number(n) if !n.is_finite() => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("number", &format_number(*n))?;
                map.end()
            }
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

#[derive(Deserialize)]
enum NonFinite {
    NaN,
    Infinity,
    #[serde(rename = "-Infinity")]
    NegInfinity,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    NonFinite { number: NonFinite },
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ValueRepr::deserialize(deserializer)? {
            ValueRepr::Null => Value::Null,
            ValueRepr::Boolean(b) => Value::Boolean(b),
            ValueRepr::Number(n) => Value::Number(n),
            ValueRepr::String(s) => Value::String(s),
            ValueRepr::NonFinite { number } => Value::Number(match number {
                NonFinite::NaN => f64::NAN,
                NonFinite::Infinity => f64::INFINITY,
                NonFinite::NegInfinity => f64::NEG_INFINITY,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::String("0".to_string()).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(Value::String(" 42 ".to_string()).to_number(), 42.0);
        assert_eq!(Value::String("".to_string()).to_number(), 0.0);
        assert_eq!(Value::String("1e3".to_string()).to_number(), 1000.0);
        assert!(Value::String("abc".to_string()).to_number().is_nan());
        assert!(Value::String("inf".to_string()).to_number().is_nan());
        assert_eq!(Value::String("-Infinity".to_string()).to_number(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(1.0 / 0.0).to_string(), "Infinity");
    }

    #[test]
    fn test_json_shape() {
        let values = vec![
            Value::Number(5.0),
            Value::Number(0.5),
            Value::String("s".to_string()),
            Value::Boolean(true),
            Value::Null,
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[5,0.5,"s",true,null]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_non_finite_numbers_stay_numbers() {
        let values = vec![
            Value::Number(f64::NAN),
            Value::Number(f64::INFINITY),
            Value::Number(f64::NEG_INFINITY),
            Value::String("NaN".to_string()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(
            json,
            r#"[{"number":"NaN"},{"number":"Infinity"},{"number":"-Infinity"},"NaN"]"#
        );

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert!(matches!(back[0], Value::Number(n) if n.is_nan()));
        assert_eq!(back[1..], values[1..]);
    }
}
