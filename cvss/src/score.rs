use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// The type of score, indicating the scoring system and version used.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Eq, PartialEq, strum::VariantArray)]
pub enum ScoreType {
    /// CVSS v2.0 score
    #[serde(rename = "2.0")]
    V2,
    /// CVSS v3.0 score
    #[serde(rename = "3.0")]
    V3,
    /// CVSS v3.1 score
    #[serde(rename = "3.1")]
    V3_1,
    /// CVSS v4.0 score
    #[serde(rename = "4.0")]
    V4,
}

#[derive(Debug, thiserror::Error)]
#[error("score {0} is outside the 0.0..=10.0 range")]
pub struct OutOfRange(pub f64);

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Score {
    /// The score type
    pub r#type: ScoreType,
    /// The actual value
    pub value: f64,
    /// The derived severity
    pub severity: Severity,
}

impl Score {
    pub fn new(r#type: ScoreType, value: f64) -> Result<Self, OutOfRange> {
        if !(0.0..=10.0).contains(&value) {
            return Err(OutOfRange(value));
        }

        // Scores carry one decimal of precision; round off upstream
        // float artifacts before deriving the severity band
        let value = (value * 10.0).round() / 10.0;

        Ok(Score {
            r#type,
            value,
            severity: value.into(),
        })
    }
}
