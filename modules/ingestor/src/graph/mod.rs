pub mod advisory;
pub mod vulnerability;

use advisory::{AdvisoryRecord, MaxSeverity};
use std::collections::{BTreeMap, btree_map::Entry};
use vigil_common::id::{AdvisoryId, VulnerabilityId};
use vulnerability::VulnerabilityRecord;

#[derive(Clone, Debug)]
struct RankCache {
    generation: u64,
    value: Option<MaxSeverity>,
}

/// Run-scoped arena owning every record of one invocation.
///
/// Records are keyed by identifier. The advisory→vulnerability reference
/// graph is an index of identifiers rather than links between records,
/// so either side can be replaced independently and the graph rebuilt
/// cheaply after a merge.
#[derive(Debug, Default)]
pub struct RecordSet {
    advisories: BTreeMap<AdvisoryId, AdvisoryRecord>,
    vulnerabilities: BTreeMap<VulnerabilityId, VulnerabilityRecord>,
    references: BTreeMap<AdvisoryId, Vec<VulnerabilityId>>,
    ranks: BTreeMap<AdvisoryId, RankCache>,
    /// Bumped whenever vulnerability membership or content changes,
    /// invalidating every cached rank at once.
    generation: u64,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge an advisory, returning `true` when the id was new.
    pub fn upsert_advisory(&mut self, record: AdvisoryRecord) -> bool {
        let id = record.id.clone();

        let new = match self.advisories.entry(id.clone()) {
            Entry::Vacant(entry) => {
                self.references.insert(id.clone(), record.references.clone());
                entry.insert(record);
                true
            }
            Entry::Occupied(mut entry) => {
                entry.get_mut().merge(record);
                self.references
                    .insert(id.clone(), entry.get().references.clone());
                false
            }
        };

        // the reference list may have changed either way
        self.ranks.remove(&id);

        new
    }

    /// Insert or merge a vulnerability, returning `true` when the id was
    /// new.
    pub fn upsert_vulnerability(&mut self, record: VulnerabilityRecord) -> bool {
        self.generation += 1;

        match self.vulnerabilities.entry(record.id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
            Entry::Occupied(mut entry) => {
                entry.get_mut().merge(record);
                false
            }
        }
    }

    pub fn advisory(&self, id: &AdvisoryId) -> Option<&AdvisoryRecord> {
        self.advisories.get(id)
    }

    pub fn vulnerability(&self, id: &VulnerabilityId) -> Option<&VulnerabilityRecord> {
        self.vulnerabilities.get(id)
    }

    pub fn contains_vulnerability(&self, id: &VulnerabilityId) -> bool {
        self.vulnerabilities.contains_key(id)
    }

    /// Advisories in stable identifier order.
    pub fn advisories(&self) -> impl Iterator<Item = &AdvisoryRecord> {
        self.advisories.values()
    }

    /// Vulnerabilities in stable identifier order.
    pub fn vulnerabilities(&self) -> impl Iterator<Item = &VulnerabilityRecord> {
        self.vulnerabilities.values()
    }

    /// Referenced vulnerability ids for an advisory; empty for unknown
    /// ids, never an error.
    pub fn references(&self, id: &AdvisoryId) -> &[VulnerabilityId] {
        self.references.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn advisory_count(&self) -> usize {
        self.advisories.len()
    }

    pub fn vulnerability_count(&self) -> usize {
        self.vulnerabilities.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cached worst-case annotation for an advisory, if still valid for
    /// the current vulnerability generation.
    pub fn cached_rank(&self, id: &AdvisoryId) -> Option<Option<MaxSeverity>> {
        self.ranks
            .get(id)
            .filter(|cache| cache.generation == self.generation)
            .map(|cache| cache.value.clone())
    }

    /// Store the worst-case annotation for an advisory under the current
    /// generation.
    pub fn store_rank(&mut self, id: &AdvisoryId, value: Option<MaxSeverity>) {
        self.ranks.insert(
            id.clone(),
            RankCache {
                generation: self.generation,
                value,
            },
        );
    }
}
