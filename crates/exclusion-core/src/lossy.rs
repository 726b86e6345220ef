//! Serde helpers for floats that may be NaN or infinite.
//!
//! JSON has no representation for non-finite numbers. These modules write
//! them as the strings `"NaN"`, `"inf"` and `"-inf"` and accept either those
//! strings, plain numbers or `null` (read as NaN) on the way back, so a run
//! with a degenerate probe or a degenerate null quantile can still be stored
//! and reloaded.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Point {
//!     #[serde(with = "exclusion_core::lossy::float")]
//!     metric: f64,
//! }
//! ```

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

fn encode<S: Serializer>(value: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value == f64::INFINITY {
        serializer.serialize_str("inf")
    } else if value == f64::NEG_INFINITY {
        serializer.serialize_str("-inf")
    } else {
        serializer.serialize_f64(value)
    }
}

fn decode<E: de::Error>(repr: Option<Repr>) -> Result<f64, E> {
    match repr {
        None => Ok(f64::NAN),
        Some(Repr::Number(value)) => Ok(value),
        Some(Repr::Text(text)) => match text.as_str() {
            "NaN" | "nan" => Ok(f64::NAN),
            "inf" | "Infinity" | "+inf" => Ok(f64::INFINITY),
            "-inf" | "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid float '{other}'"))),
        },
    }
}

/// `#[serde(with)]` module for a single `f64`.
pub mod float {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        encode(*value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        decode(Option::<Repr>::deserialize(deserializer)?)
    }
}

/// `#[serde(with)]` module for `Vec<f64>`.
pub mod float_vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for &value in values {
            seq.serialize_element(&Lossy(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Option<Repr>>::deserialize(deserializer)?
            .into_iter()
            .map(decode)
            .collect()
    }

    struct Lossy(f64);

    impl serde::Serialize for Lossy {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            encode(self.0, serializer)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super::float")]
        value: f64,
        #[serde(with = "super::float_vec")]
        trace: Vec<f64>,
    }

    #[test]
    fn test_non_finite_written_as_strings() {
        let sample = Sample {
            value: f64::NAN,
            trace: vec![1.5, f64::INFINITY, f64::NEG_INFINITY],
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"value":"NaN","trace":[1.5,"inf","-inf"]}"#);

        let back: Sample = serde_json::from_str(&json).unwrap();
        assert!(back.value.is_nan());
        assert_eq!(back.trace[0], 1.5);
        assert_eq!(back.trace[1], f64::INFINITY);
        assert_eq!(back.trace[2], f64::NEG_INFINITY);
    }

    #[test]
    fn test_null_reads_as_nan() {
        let back: Sample = serde_json::from_str(r#"{"value":null,"trace":[null,2]}"#).unwrap();
        assert!(back.value.is_nan());
        assert!(back.trace[0].is_nan());
        assert_eq!(back.trace[1], 2.0);
    }

    #[test]
    fn test_garbage_string_rejected() {
        let result: Result<Sample, _> = serde_json::from_str(r#"{"value":"abc","trace":[]}"#);
        assert!(result.is_err());
    }
}
