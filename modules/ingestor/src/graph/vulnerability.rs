use serde_json::Value;
use time::OffsetDateTime;
use vigil_common::id::VulnerabilityId;
use vigil_cvss::score::Score;

/// Which kind of source produced a record.
///
/// Catalog entries come from the offline reference list and outrank
/// anything fetched live, so a re-fetch can never clobber them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    Live,
    Catalog,
}

/// A scored entry identifying a specific flaw.
#[derive(Clone, Debug)]
pub struct VulnerabilityRecord {
    pub id: VulnerabilityId,
    /// Absent means unscored, which is distinct from a zero score.
    pub score: Option<Score>,
    pub published: Option<OffsetDateTime>,
    pub description: Option<String>,
    pub provenance: Provenance,
    /// Original payload, kept verbatim for output rendering.
    pub raw: Value,
}

impl VulnerabilityRecord {
    /// Merge a re-fetch of the same identifier into this record.
    ///
    /// The incoming record wins field by field, except that a live
    /// record never replaces catalog data.
    pub fn merge(&mut self, incoming: VulnerabilityRecord) {
        if self.provenance == Provenance::Catalog && incoming.provenance == Provenance::Live {
            // keep the authoritative entry, only fill gaps
            if self.published.is_none() {
                self.published = incoming.published;
            }
            if self.description.is_none() {
                self.description = incoming.description;
            }
            return;
        }

        *self = incoming;
    }
}
