use crate::{
    catalog::Catalog,
    runner::{
        RunReport, Runner,
        common::{SourceAdapter, Target},
    },
};
use itertools::Itertools;
use parking_lot::Mutex;
use tracing::instrument;
use vigil_common::id::{AdvisoryId, VulnerabilityId};
use vigil_module_ingestor::graph::RecordSet;

/// Seed the record set with the offline catalog.
///
/// Catalog entries are merged before anything is fetched so they win any
/// later merge and their identifiers are skipped by the runner.
pub fn seed(catalog: &Catalog, records: &Mutex<RecordSet>) {
    let mut records = records.lock();

    for record in catalog.records() {
        records.upsert_vulnerability(record.clone());
    }
}

/// Fetch advisories, then resolve the vulnerabilities they reference.
///
/// The second phase only fetches identifiers that neither the catalog
/// nor the first phase already produced.
#[instrument(skip_all, fields(targets = targets.len()))]
pub async fn import_advisories<A, V>(
    runner: &Runner,
    advisories: &A,
    vulnerabilities: &V,
    catalog: &Catalog,
    targets: Vec<AdvisoryId>,
    records: &Mutex<RecordSet>,
) -> RunReport
where
    A: SourceAdapter,
    V: SourceAdapter,
{
    seed(catalog, records);

    let targets = targets.into_iter().map(Target::Advisory).collect();
    let mut report = runner.run(advisories, catalog, targets, records).await;

    if report.cancelled {
        return report;
    }

    let referenced: Vec<Target> = {
        let records = records.lock();
        records
            .advisories()
            .flat_map(|advisory| records.references(&advisory.id))
            .unique()
            .filter(|id| !records.contains_vulnerability(id))
            .cloned()
            .map(Target::Vulnerability)
            .collect()
    };

    report.merge(runner.run(vulnerabilities, catalog, referenced, records).await);
    report
}

/// Fetch vulnerability records directly.
#[instrument(skip_all, fields(targets = targets.len()))]
pub async fn import_vulnerabilities<V>(
    runner: &Runner,
    vulnerabilities: &V,
    catalog: &Catalog,
    targets: Vec<VulnerabilityId>,
    records: &Mutex<RecordSet>,
) -> RunReport
where
    V: SourceAdapter,
{
    seed(catalog, records);

    let targets = targets.into_iter().map(Target::Vulnerability).collect();
    runner.run(vulnerabilities, catalog, targets, records).await
}
