use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use time::OffsetDateTime;
use vigil_common::id::{AdvisoryId, VulnerabilityId};
use vigil_cvss::score::Score;

/// Risk categories used by the advisory source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Risk {
    RemoteCodeExecution,
    PrivilegeEscalation,
    DenialOfService,
    SecurityBypass,
    Spoofing,
    DataConfidentiality,
    DataIntegrity,
    CodeInjection,
    Unspecified,
}

impl Risk {
    /// Map a source risk label onto the taxonomy by keyword.
    ///
    /// The source publishes labels in French; anything unrecognized maps
    /// to [`Risk::Unspecified`] rather than failing the record.
    pub fn parse(label: &str) -> Self {
        let label = label.to_lowercase();

        if label.contains("exécution de code") || label.contains("code execution") {
            Self::RemoteCodeExecution
        } else if label.contains("élévation de privilèges") || label.contains("privilege") {
            Self::PrivilegeEscalation
        } else if label.contains("déni de service") || label.contains("denial of service") {
            Self::DenialOfService
        } else if label.contains("contournement") || label.contains("bypass") {
            Self::SecurityBypass
        } else if label.contains("usurpation") || label.contains("spoofing") {
            Self::Spoofing
        } else if label.contains("confidentialité") || label.contains("confidentiality") {
            Self::DataConfidentiality
        } else if label.contains("intégrité") || label.contains("integrity") {
            Self::DataIntegrity
        } else if label.contains("injection") {
            Self::CodeInjection
        } else {
            Self::Unspecified
        }
    }
}

/// Worst-case resolved vulnerability for an advisory.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaxSeverity {
    pub id: VulnerabilityId,
    pub score: Score,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published: Option<OffsetDateTime>,
}

/// A published security notice referencing one or more vulnerabilities.
#[derive(Clone, Debug)]
pub struct AdvisoryRecord {
    pub id: AdvisoryId,
    pub title: Option<String>,
    pub published: Option<OffsetDateTime>,
    /// Normalized lower-case tokens from the title, used by keyword
    /// filtering.
    pub keywords: BTreeSet<String>,
    pub risks: Vec<Risk>,
    /// Referenced vulnerability identifiers in first-seen order, already
    /// deduplicated. Resolution treats this as a set.
    pub references: Vec<VulnerabilityId>,
    /// Original payload, kept verbatim for output rendering.
    pub raw: Value,
}

impl AdvisoryRecord {
    /// Merge a re-fetch of the same identifier into this record.
    ///
    /// Scalar fields follow the incoming record; references are unioned,
    /// keeping the first-seen order of the existing list. Returns whether
    /// the reference list changed.
    pub fn merge(&mut self, incoming: AdvisoryRecord) -> bool {
        let AdvisoryRecord {
            id: _,
            title,
            published,
            keywords,
            risks,
            references,
            raw,
        } = incoming;

        let mut changed = false;
        for reference in references {
            if !self.references.contains(&reference) {
                self.references.push(reference);
                changed = true;
            }
        }

        self.title = title.or(self.title.take());
        self.published = published.or(self.published);
        if !keywords.is_empty() {
            self.keywords = keywords;
        }
        if !risks.is_empty() {
            self.risks = risks;
        }
        self.raw = raw;

        changed
    }
}
