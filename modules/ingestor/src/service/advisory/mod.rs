use super::{Error, optional_str, required_str};
use crate::graph::advisory::{AdvisoryRecord, Risk};
use itertools::Itertools;
use regex::Regex;
use serde_json::Value;
use std::{collections::BTreeSet, sync::LazyLock};
use vigil_common::{date::parse_timestamp, id::VulnerabilityId};

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CVE-\d{4}-\d{4,7}").expect("hard-coded pattern"));

/// Normalize an advisory-shaped payload.
///
/// Expected shape: `{id, title, body, published_at, risks}`, with
/// everything beyond `id` optional.
pub fn load(value: &Value) -> Result<AdvisoryRecord, Error> {
    let id = required_str(value, "id")?.parse()?;

    let title = optional_str(value, "title").map(ToOwned::to_owned);

    let published = optional_str(value, "published_at")
        .map(parse_timestamp)
        .transpose()?;

    let body = optional_str(value, "body").unwrap_or_default();

    let risks = value
        .get("risks")
        .and_then(Value::as_array)
        .map(|risks| {
            risks
                .iter()
                .filter_map(Value::as_str)
                .map(Risk::parse)
                .collect()
        })
        .unwrap_or_default();

    Ok(AdvisoryRecord {
        id,
        keywords: extract_keywords(title.as_deref().unwrap_or_default()),
        references: extract_references(body),
        title,
        published,
        risks,
        raw: value.clone(),
    })
}

/// Extract referenced vulnerability identifiers from free text.
///
/// Case-insensitive, deduplicated, first-seen order preserved.
pub fn extract_references(text: &str) -> Vec<VulnerabilityId> {
    REFERENCE
        .find_iter(text)
        .filter_map(|candidate| candidate.as_str().parse().ok())
        .unique()
        .collect()
}

/// Normalize a title into lower-case keyword tokens.
///
/// Short tokens carry no filtering signal and are skipped.
pub fn extract_keywords(title: &str) -> BTreeSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 3)
        .map(ToOwned::to_owned)
        .collect()
}
