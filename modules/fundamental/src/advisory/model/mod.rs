use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use vigil_common::id::{AdvisoryId, VulnerabilityId};
use vigil_cvss::severity::Severity;
use vigil_module_ingestor::graph::advisory::{AdvisoryRecord, MaxSeverity};

/// One output row of an advisory run.
///
/// `max_severity_score` stays empty when no referenced vulnerability is
/// scored; that is different from a score of zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvisorySummary {
    pub advisory_id: AdvisoryId,
    pub title: Option<String>,
    pub max_severity_id: Option<VulnerabilityId>,
    pub max_severity_score: Option<f64>,
    pub severity: Option<Severity>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl AdvisorySummary {
    pub fn new(advisory: &AdvisoryRecord, max: Option<&MaxSeverity>) -> Self {
        Self {
            advisory_id: advisory.id.clone(),
            title: advisory.title.clone(),
            max_severity_id: max.map(|max| max.id.clone()),
            max_severity_score: max.map(|max| max.score.value),
            severity: max.map(|max| max.score.severity),
            published_at: advisory.published,
        }
    }
}
