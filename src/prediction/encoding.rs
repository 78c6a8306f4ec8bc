//! Codec for the legacy `predicted_disease` column.
//!
//! The production table cannot grow a confidence column, so the disease
//! name and its confidence score travel together in one text field as
//! `"{disease}|{confidence}"`. This module is the only place that knows
//! about the packing; everything else works with the two typed fields.

use std::fmt;

use serde::{Serialize, Serializer};

/// Confidence assumed for records written before the packing existed,
/// and for records whose confidence tail cannot be parsed.
pub const DEFAULT_CONFIDENCE: f64 = 70.0;

/// Separator between disease name and confidence in the packed column.
/// Disease names must not contain it; the codec does not escape.
pub const DELIMITER: char = '|';

/// A confidence score in [0, 100]. Whole values render as integers,
/// fractional values are held at one decimal place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Self {
        if value.fract() == 0.0 {
            Self(value)
        } else {
            Self((value * 10.0).round() / 10.0)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_integral(&self) -> bool {
        self.0.fract() == 0.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integral() {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{:.1}", self.0)
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_integral() {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

/// Result of unpacking a stored `predicted_disease` value.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDisease {
    pub name: String,
    pub confidence: Confidence,
}

/// Pack a disease name and confidence into the storage representation.
pub fn encode(disease_name: &str, confidence: Confidence) -> String {
    format!("{disease_name}{DELIMITER}{confidence}")
}

/// Unpack a stored value. Splits on the first delimiter; a missing
/// delimiter means a pre-packing record and a non-numeric tail means a
/// corrupt one — both degrade to the default confidence instead of
/// failing, so history listings stay available over legacy data.
pub fn decode(stored: &str) -> DecodedDisease {
    match stored.split_once(DELIMITER) {
        None => DecodedDisease {
            name: stored.to_string(),
            confidence: Confidence::default(),
        },
        Some((name, tail)) => {
            let confidence = match tail.trim().parse::<f64>() {
                Ok(value) => Confidence::new(value),
                Err(_) => {
                    tracing::debug!(tail, "Non-numeric confidence tail, using default");
                    Confidence::default()
                }
            };
            DecodedDisease {
                name: name.to_string(),
                confidence,
            }
        }
    }
}
