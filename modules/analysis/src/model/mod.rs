use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use time::OffsetDateTime;
use vigil_cvss::severity::Severity;

/// Point-in-time advisory counts by severity band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub counts: BTreeMap<Severity, u64>,
}

impl KpiSnapshot {
    /// Weighted exposure used for trend comparison: each advisory
    /// contributes its band's rank, so a rising critical count outweighs
    /// a rising low count.
    pub fn exposure(&self) -> u64 {
        self.counts
            .iter()
            .map(|(severity, count)| (*severity as u64) * count)
            .sum()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Flattened snapshot row for tabular export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiRow {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub none: u64,
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl From<&KpiSnapshot> for KpiRow {
    fn from(snapshot: &KpiSnapshot) -> Self {
        let count = |severity| snapshot.counts.get(&severity).copied().unwrap_or_default();

        Self {
            timestamp: snapshot.timestamp,
            none: count(Severity::None),
            low: count(Severity::Low),
            medium: count(Severity::Medium),
            high: count(Severity::High),
            critical: count(Severity::Critical),
        }
    }
}

/// Direction of change between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Tendency {
    Increasing,
    Decreasing,
    Stable,
}

impl Tendency {
    pub fn between(earlier: &KpiSnapshot, later: &KpiSnapshot) -> Self {
        match later.exposure().cmp(&earlier.exposure()) {
            std::cmp::Ordering::Greater => Self::Increasing,
            std::cmp::Ordering::Less => Self::Decreasing,
            std::cmp::Ordering::Equal => Self::Stable,
        }
    }
}

/// Append-only, bounded sequence of snapshots.
///
/// The depth bound evicts strictly oldest-first; reading never refreshes
/// anything.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiHistory {
    snapshots: VecDeque<KpiSnapshot>,
    depth: usize,
}

impl KpiHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            depth,
        }
    }

    /// Append a snapshot, honoring the configured minimum gap.
    ///
    /// When the most recent entry is closer than `gap`, the new snapshot
    /// replaces it instead of extending the sequence, so closely-spaced
    /// runs do not bloat the history. Anything beyond the depth bound is
    /// evicted oldest-first.
    pub fn append(&mut self, snapshot: KpiSnapshot, gap: Option<Duration>) {
        if let (Some(gap), Some(last)) = (gap, self.snapshots.back())
            && (snapshot.timestamp - last.timestamp).unsigned_abs() < gap
        {
            self.snapshots.pop_back();
        }

        self.snapshots.push_back(snapshot);

        while self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
        }
    }

    /// Change the depth bound, evicting oldest-first when shrinking.
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth;

        while self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
        }
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &KpiSnapshot> {
        self.snapshots.iter()
    }

    pub fn latest(&self) -> Option<&KpiSnapshot> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Majority tendency over consecutive snapshot pairs.
    ///
    /// Ties lean towards reporting movement over stability, and growth
    /// over decline, so a flapping history is never reported as quiet.
    pub fn tendency(&self) -> Tendency {
        let mut increasing = 0usize;
        let mut decreasing = 0usize;
        let mut stable = 0usize;

        for (earlier, later) in self.snapshots.iter().zip(self.snapshots.iter().skip(1)) {
            match Tendency::between(earlier, later) {
                Tendency::Increasing => increasing += 1,
                Tendency::Decreasing => decreasing += 1,
                Tendency::Stable => stable += 1,
            }
        }

        let mut best = (Tendency::Stable, stable);
        for candidate in [
            (Tendency::Decreasing, decreasing),
            (Tendency::Increasing, increasing),
        ] {
            if candidate.1 >= best.1 {
                best = candidate;
            }
        }

        best.0
    }
}
