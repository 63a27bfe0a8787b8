use crate::model::KpiSnapshot;
use std::collections::BTreeMap;
use strum::VariantArray;
use time::OffsetDateTime;
use vigil_cvss::severity::Severity;

/// Accumulates one run's severity counts.
///
/// Two states: collecting while the run processes advisories, closed
/// once the snapshot is taken. Closing is one-way; a closed aggregator
/// keeps handing out the same snapshot and ignores further counts.
#[derive(Clone, Debug)]
pub enum KpiAggregator {
    Collecting { counts: BTreeMap<Severity, u64> },
    Closed { snapshot: KpiSnapshot },
}

impl Default for KpiAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl KpiAggregator {
    /// A collecting aggregator with every band present at zero, so a
    /// quiet run still reports all bands.
    pub fn new() -> Self {
        Self::Collecting {
            counts: Severity::VARIANTS
                .iter()
                .map(|severity| (*severity, 0))
                .collect(),
        }
    }

    /// Bucket one advisory by its resolved worst-case severity.
    ///
    /// Absence counts under the `none` band; an advisory without a
    /// scored reference is an expected state, not an error.
    pub fn observe(&mut self, severity: Option<Severity>) {
        match self {
            Self::Collecting { counts } => {
                *counts.entry(severity.unwrap_or(Severity::None)).or_default() += 1;
            }
            Self::Closed { .. } => {
                log::debug!("ignoring observation after close");
            }
        }
    }

    /// Finalize the counts into a snapshot.
    pub fn close(&mut self, timestamp: OffsetDateTime) -> KpiSnapshot {
        match self {
            Self::Collecting { counts } => {
                let snapshot = KpiSnapshot {
                    timestamp,
                    counts: std::mem::take(counts),
                };
                *self = Self::Closed {
                    snapshot: snapshot.clone(),
                };
                snapshot
            }
            Self::Closed { snapshot } => snapshot.clone(),
        }
    }
}
