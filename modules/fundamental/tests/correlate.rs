use serde_json::json;
use vigil_common::config::FilterConfig;
use vigil_module_fundamental::{advisory::service::AdvisoryService, filter};
use vigil_module_ingestor::{
    graph::RecordSet,
    service::{IngestorService, RawRecord},
};

/// End-to-end correlation over raw payloads: dedup, reference
/// resolution, ranking and filtering working together.
#[test_log::test]
fn correlate_advisories_with_references() {
    let mut records = RecordSet::new();
    let ingestor = IngestorService::new();

    let dropped = ingestor.ingest(
        &mut records,
        vec![
            RawRecord::Advisory(json!({
                "id": "CERTFR-2024-AVI-0001",
                "title": "Multiples vulnérabilités dans le noyau Linux",
                "body": "Correctifs pour CVE-2024-0001 et CVE-2024-0002.",
                "published_at": "2024-07-02",
            })),
            // the same advisory arriving again from a re-fetch
            RawRecord::Advisory(json!({
                "id": "certfr-2024-avi-0001",
                "title": "Multiples vulnérabilités dans le noyau Linux",
                "body": "Correctifs pour CVE-2024-0001 et CVE-2024-0002.",
                "published_at": "2024-07-02",
            })),
            RawRecord::Vulnerability(json!({
                "id": "CVE-2024-0001",
                "severity_score": 9.8,
                "published_at": "2024-06-01",
            })),
            RawRecord::Vulnerability(json!({
                "id": "CVE-2024-0002",
                "severity_score": 9.8,
                "published_at": "2024-06-15",
            })),
        ],
    );
    assert_eq!(dropped, 0);

    // the duplicate advisory merged into one record
    assert_eq!(records.advisory_count(), 1);

    let id = "CERTFR-2024-AVI-0001".parse().expect("must parse");
    let max = AdvisoryService::new()
        .max_severity(&mut records, &id)
        .expect("must resolve");

    // equal scores: the later publication wins
    assert_eq!(max.id.as_str(), "CVE-2024-0002");

    // filtering is a view; the records and their annotations stay put
    let matched = filter::apply(
        &records,
        &FilterConfig {
            keywords: vec!["linux".into()],
            ..Default::default()
        },
    );
    assert_eq!(matched.len(), 1);
    assert_eq!(records.advisory_count(), 1);
    assert_eq!(records.cached_rank(&id), Some(Some(max)));
}

#[test_log::test]
fn summaries_order_and_degrade_gracefully() {
    let mut records = RecordSet::new();
    IngestorService::new().ingest(
        &mut records,
        vec![
            RawRecord::Advisory(json!({
                "id": "CERTFR-2024-AVI-0002",
                "title": "Vulnérabilité dans Exemple",
                "body": "Aucune référence publiée.",
            })),
            RawRecord::Advisory(json!({
                "id": "CERTFR-2024-AVI-0001",
                "title": "Vulnérabilité dans Autre",
                "body": "Voir CVE-2024-0404.",
            })),
        ],
    );

    let rows = AdvisoryService::new().summarize(&mut records, &FilterConfig::default());

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].advisory_id.as_str(), "CERTFR-2024-AVI-0001");
    // CVE-2024-0404 never resolved: absent severity, not an error
    assert_eq!(rows[0].max_severity_score, None);
    assert_eq!(rows[1].advisory_id.as_str(), "CERTFR-2024-AVI-0002");
}
