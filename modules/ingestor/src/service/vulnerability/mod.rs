use super::{Error, optional_str, required_str};
use crate::graph::vulnerability::{Provenance, VulnerabilityRecord};
use serde_json::Value;
use vigil_common::date::parse_timestamp;
use vigil_cvss::score::{Score, ScoreType};

/// Normalize a vulnerability-shaped payload.
///
/// Expected shape: `{id, severity_score, score_type, published_at,
/// description}`; a missing score yields an unscored record, which is a
/// valid state rather than an error.
pub fn load(value: &Value) -> Result<VulnerabilityRecord, Error> {
    let id = required_str(value, "id")?.parse()?;

    let score = match value.get("severity_score").and_then(Value::as_f64) {
        Some(score) => Some(Score::new(score_type(value)?, score)?),
        None => None,
    };

    let published = optional_str(value, "published_at")
        .map(parse_timestamp)
        .transpose()?;

    let description = optional_str(value, "description").map(ToOwned::to_owned);

    Ok(VulnerabilityRecord {
        id,
        score,
        published,
        description,
        provenance: Provenance::Live,
        raw: value.clone(),
    })
}

/// Scoring system tag of the payload, defaulting to v3.1 when absent.
fn score_type(value: &Value) -> Result<ScoreType, Error> {
    match value.get("score_type") {
        Some(tag) => Ok(serde_json::from_value(tag.clone())?),
        None => Ok(ScoreType::V3_1),
    }
}
