use crate::vulnerability::model::VulnerabilitySummary;
use tracing::instrument;
use vigil_module_ingestor::graph::RecordSet;

#[derive(Clone, Copy, Debug, Default)]
pub struct VulnerabilityService;

impl VulnerabilityService {
    pub fn new() -> Self {
        Self
    }

    /// Summary rows for every vulnerability of a run, in stable
    /// identifier order.
    #[instrument(skip_all, fields(vulnerabilities = records.vulnerability_count()))]
    pub fn summarize(&self, records: &RecordSet) -> Vec<VulnerabilitySummary> {
        records
            .vulnerabilities()
            .map(VulnerabilitySummary::from)
            .collect()
    }
}
