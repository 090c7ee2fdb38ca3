//! Kubernetes `IntOrString`
//!
//! Ports and similar fields accept either a number or a name. The variant the user
//! picked is kept as-is: `8080` encodes as a bare integer and `"8080"` as a
//! string scalar.

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;

use crate::dynamic::DynamicValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntOrString {
    Int(i64),
    String(String),
}

impl IntOrString {
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }
}

impl Default for IntOrString {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl fmt::Display for IntOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for IntOrString {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for IntOrString {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for IntOrString {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<IntOrString> for DynamicValue {
    fn from(value: IntOrString) -> Self {
        match value {
            IntOrString::Int(i) => DynamicValue::Int(i),
            IntOrString::String(s) => DynamicValue::String(s),
        }
    }
}

impl TryFrom<&DynamicValue> for IntOrString {
    type Error = String;

    fn try_from(value: &DynamicValue) -> Result<Self, Self::Error> {
        if let Some(i) = value.as_integer() {
            return Ok(Self::Int(i));
        }
        match value {
            DynamicValue::String(s) => Ok(Self::String(s.clone())),
            DynamicValue::Float(f) => Err(format!("{} is not an integer in the int64 range", f)),
            other => Err(format!(
                "expected an integer or a string, got {}",
                other.type_name()
            )),
        }
    }
}

impl Serialize for IntOrString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for IntOrString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntOrStringVisitor;

        impl Visitor<'_> for IntOrStringVisitor {
            type Value = IntOrString;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<IntOrString, E> {
                Ok(IntOrString::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<IntOrString, E> {
                i64::try_from(v)
                    .map(IntOrString::Int)
                    .map_err(|_| E::custom(format!("integer {} is out of range", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<IntOrString, E> {
                Ok(IntOrString::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<IntOrString, E> {
                Ok(IntOrString::String(v))
            }
        }

        deserializer.deserialize_any(IntOrStringVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_encodes_as_bare_integer() {
        let yaml = serde_yaml::to_string(&IntOrString::Int(8080)).unwrap();
        assert_eq!(yaml.trim(), "8080");
    }

    #[test]
    fn test_numeric_string_stays_a_string() {
        let yaml = serde_yaml::to_string(&IntOrString::String("8080".into())).unwrap();
        assert_ne!(yaml.trim(), "8080");

        let back: IntOrString = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, IntOrString::String("8080".into()));
    }

    #[test]
    fn test_deserialize_both_variants() {
        let int: IntOrString = serde_yaml::from_str("443").unwrap();
        let name: IntOrString = serde_yaml::from_str("https").unwrap();
        assert_eq!(int, IntOrString::Int(443));
        assert_eq!(name, IntOrString::String("https".into()));
    }

    #[test]
    fn test_rejects_other_types() {
        let err = serde_yaml::from_str::<IntOrString>("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an integer or a string"));

        let err = IntOrString::try_from(&DynamicValue::Bool(true)).unwrap_err();
        assert!(err.contains("got bool"));
    }

    #[test]
    fn test_out_of_range_float_rejected() {
        let err = IntOrString::try_from(&DynamicValue::Float(1.0e20)).unwrap_err();
        assert!(err.contains("int64 range"));
        assert!(IntOrString::try_from(&DynamicValue::Float(2.5)).is_err());
        assert_eq!(
            IntOrString::try_from(&DynamicValue::Float(8080.0)).unwrap(),
            IntOrString::Int(8080)
        );
    }

    #[test]
    fn test_dynamic_conversion_keeps_variant() {
        let from_int = IntOrString::try_from(&DynamicValue::Int(9090)).unwrap();
        let from_str = IntOrString::try_from(&DynamicValue::from("9090")).unwrap();
        assert!(from_int.is_int());
        assert!(!from_str.is_int());
        assert_eq!(DynamicValue::from(from_str), DynamicValue::String("9090".into()));
    }
}
