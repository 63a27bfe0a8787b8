use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use vigil_common::id::VulnerabilityId;
use vigil_cvss::severity::Severity;
use vigil_module_ingestor::graph::vulnerability::VulnerabilityRecord;

/// One output row of a direct vulnerability run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilitySummary {
    pub vulnerability_id: VulnerabilityId,
    pub severity_score: Option<f64>,
    pub severity: Option<Severity>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl From<&VulnerabilityRecord> for VulnerabilitySummary {
    fn from(record: &VulnerabilityRecord) -> Self {
        Self {
            vulnerability_id: record.id.clone(),
            severity_score: record.score.map(|score| score.value),
            severity: record.score.map(|score| score.severity),
            published_at: record.published,
        }
    }
}
