use crate::{advisory::model::AdvisorySummary, filter};
use std::cmp::Ordering;
use tracing::instrument;
use vigil_common::{config::FilterConfig, id::AdvisoryId};
use vigil_cvss::score::Score;
use vigil_module_ingestor::graph::{
    RecordSet,
    advisory::MaxSeverity,
    vulnerability::VulnerabilityRecord,
};

/// Read-model operations over a populated [`RecordSet`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AdvisoryService;

impl AdvisoryService {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the worst-case vulnerability for one advisory.
    ///
    /// Among the resolvable, scored references the highest score wins;
    /// ties fall to the more recently published record, then to the
    /// lexicographically greatest identifier, so the result is total and
    /// deterministic. Unscored and unresolved references are skipped;
    /// with no scored reference at all the result is absent.
    ///
    /// The result is cached on the record set and reused until either
    /// the advisory's references or the vulnerability membership change.
    pub fn max_severity(&self, records: &mut RecordSet, id: &AdvisoryId) -> Option<MaxSeverity> {
        if let Some(cached) = records.cached_rank(id) {
            return cached;
        }

        let value = Self::compute(records, id);
        records.store_rank(id, value.clone());
        value
    }

    fn compute(records: &RecordSet, id: &AdvisoryId) -> Option<MaxSeverity> {
        let mut best: Option<(&Score, &VulnerabilityRecord)> = None;

        for reference in records.references(id) {
            let Some(vulnerability) = records.vulnerability(reference) else {
                // unresolved references degrade the result, never error
                continue;
            };
            let Some(score) = &vulnerability.score else {
                continue;
            };

            best = Some(match best {
                Some(current) if !Self::outranks((score, vulnerability), current) => current,
                _ => (score, vulnerability),
            });
        }

        best.map(|(score, vulnerability)| MaxSeverity {
            id: vulnerability.id.clone(),
            score: *score,
            published: vulnerability.published,
        })
    }

    fn outranks(
        candidate: (&Score, &VulnerabilityRecord),
        incumbent: (&Score, &VulnerabilityRecord),
    ) -> bool {
        match candidate.0.value.partial_cmp(&incumbent.0.value) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Less) | None => false,
            Some(Ordering::Equal) => match (candidate.1.published, incumbent.1.published) {
                (Some(newer), Some(older)) if newer != older => newer > older,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                _ => candidate.1.id > incumbent.1.id,
            },
        }
    }

    /// Annotate, filter and summarize the advisories of a run.
    ///
    /// Annotation happens first so the later filtering works on an
    /// immutable view; rows come out in stable identifier order.
    #[instrument(skip_all, fields(advisories = records.advisory_count()))]
    pub fn summarize(
        &self,
        records: &mut RecordSet,
        config: &FilterConfig,
    ) -> Vec<AdvisorySummary> {
        let ids: Vec<AdvisoryId> = records.advisories().map(|a| a.id.clone()).collect();
        for id in &ids {
            self.max_severity(records, id);
        }

        filter::apply(records, config)
            .into_iter()
            .map(|advisory| {
                let max = records.cached_rank(&advisory.id).flatten();
                AdvisorySummary::new(advisory, max.as_ref())
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use vigil_module_ingestor::service::{IngestorService, RawRecord};

    fn ingest(records: &mut RecordSet, batch: Vec<RawRecord>) {
        assert_eq!(IngestorService::new().ingest(records, batch), 0);
    }

    fn advisory(id: &str, references: &[&str]) -> RawRecord {
        RawRecord::Advisory(json!({
            "id": id,
            "body": references.join(" "),
        }))
    }

    fn vulnerability(id: &str, score: Option<f64>, published: Option<&str>) -> RawRecord {
        RawRecord::Vulnerability(json!({
            "id": id,
            "severity_score": score,
            "published_at": published,
        }))
    }

    #[test]
    fn highest_score_wins() {
        let mut records = RecordSet::new();
        ingest(
            &mut records,
            vec![
                advisory("CERTFR-2024-AVI-0001", &["CVE-2024-0001", "CVE-2024-0002"]),
                vulnerability("CVE-2024-0001", Some(7.2), None),
                vulnerability("CVE-2024-0002", Some(9.8), None),
            ],
        );

        let id = "CERTFR-2024-AVI-0001".parse().expect("must parse");
        let max = AdvisoryService::new()
            .max_severity(&mut records, &id)
            .expect("must resolve");

        assert_eq!(max.id.as_str(), "CVE-2024-0002");
        assert_eq!(max.score.value, 9.8);
    }

    #[test]
    fn score_tie_breaks_on_recency() {
        let mut records = RecordSet::new();
        ingest(
            &mut records,
            vec![
                advisory(
                    "CERTFR-2024-AVI-0001",
                    &["CVE-2024-0001", "CVE-2024-0002", "CVE-2024-0003"],
                ),
                vulnerability("CVE-2024-0001", Some(7.2), Some("2024-01-01")),
                vulnerability("CVE-2024-0002", Some(7.2), Some("2024-06-01")),
                // unscored, excluded from the comparison
                vulnerability("CVE-2024-0003", None, Some("2024-12-01")),
            ],
        );

        let id = "CERTFR-2024-AVI-0001".parse().expect("must parse");
        let max = AdvisoryService::new()
            .max_severity(&mut records, &id)
            .expect("must resolve");

        assert_eq!(max.id.as_str(), "CVE-2024-0002");
    }

    #[test]
    fn full_tie_breaks_on_identifier() {
        let mut records = RecordSet::new();
        ingest(
            &mut records,
            vec![
                advisory("CERTFR-2024-AVI-0001", &["CVE-2024-0002", "CVE-2024-0001"]),
                vulnerability("CVE-2024-0001", Some(9.8), Some("2024-03-21")),
                vulnerability("CVE-2024-0002", Some(9.8), Some("2024-03-21")),
            ],
        );

        let id = "CERTFR-2024-AVI-0001".parse().expect("must parse");
        let max = AdvisoryService::new()
            .max_severity(&mut records, &id)
            .expect("must resolve");

        // lexicographically greatest identifier wins the final tie
        assert_eq!(max.id.as_str(), "CVE-2024-0002");
    }

    #[rstest]
    #[case::unresolved(&["CVE-2024-0001"], vec![])]
    #[case::unscored(&["CVE-2024-0001"], vec![("CVE-2024-0001", None)])]
    fn absence_is_not_zero(
        #[case] references: &[&str],
        #[case] vulnerabilities: Vec<(&str, Option<f64>)>,
    ) {
        let mut records = RecordSet::new();
        let mut batch = vec![advisory("CERTFR-2024-AVI-0001", references)];
        for (id, score) in vulnerabilities {
            batch.push(vulnerability(id, score, None));
        }
        ingest(&mut records, batch);

        let id = "CERTFR-2024-AVI-0001".parse().expect("must parse");
        assert_eq!(AdvisoryService::new().max_severity(&mut records, &id), None);
    }

    #[test]
    fn cache_is_recomputed_after_membership_changes() {
        let mut records = RecordSet::new();
        let service = AdvisoryService::new();
        ingest(
            &mut records,
            vec![
                advisory("CERTFR-2024-AVI-0001", &["CVE-2024-0001", "CVE-2024-0002"]),
                vulnerability("CVE-2024-0001", Some(5.0), None),
            ],
        );

        let id = "CERTFR-2024-AVI-0001".parse().expect("must parse");
        let first = service
            .max_severity(&mut records, &id)
            .expect("must resolve");
        assert_eq!(first.id.as_str(), "CVE-2024-0001");

        // a later fetch resolves the second reference with a higher score
        ingest(
            &mut records,
            vec![vulnerability("CVE-2024-0002", Some(8.1), None)],
        );

        let second = service
            .max_severity(&mut records, &id)
            .expect("must resolve");
        assert_eq!(second.id.as_str(), "CVE-2024-0002");
    }

    #[test]
    fn summarize_keeps_unscored_rows() {
        let mut records = RecordSet::new();
        ingest(
            &mut records,
            vec![
                advisory("CERTFR-2024-AVI-0001", &["CVE-2024-0001"]),
                advisory("CERTFR-2024-AVI-0002", &[]),
                vulnerability("CVE-2024-0001", Some(9.8), None),
            ],
        );

        let rows = AdvisoryService::new().summarize(&mut records, &FilterConfig::default());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].max_severity_score, Some(9.8));
        assert_eq!(rows[1].max_severity_score, None);
        assert_eq!(rows[1].severity, None);
    }
}
