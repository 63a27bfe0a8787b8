use std::collections::BTreeSet;
use vigil_common::config::FilterConfig;
use vigil_module_ingestor::graph::{RecordSet, advisory::AdvisoryRecord};

/// Non-destructive advisory filtering.
///
/// Returns references into the record set rather than copies; nothing in
/// the set, including cached annotations, is touched. Keyword and date
/// criteria combine as a logical AND.
pub fn apply<'a>(records: &'a RecordSet, config: &FilterConfig) -> Vec<&'a AdvisoryRecord> {
    let keywords = config.normalized_keywords();

    records
        .advisories()
        .filter(|advisory| matches(advisory, &keywords, config))
        .collect()
}

fn matches(advisory: &AdvisoryRecord, keywords: &BTreeSet<String>, config: &FilterConfig) -> bool {
    // an empty keyword set means no keyword filtering at all
    if !keywords.is_empty() && advisory.keywords.is_disjoint(keywords) {
        return false;
    }

    if let Some(from) = config.date_from {
        match advisory.published {
            Some(published) if published >= from => {}
            _ => return false,
        }
    }

    if let Some(to) = config.date_to {
        match advisory.published {
            Some(published) if published <= to => {}
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;
    use vigil_module_ingestor::service::{IngestorService, RawRecord};

    fn records() -> RecordSet {
        let mut records = RecordSet::new();
        let ingestor = IngestorService::new();

        let dropped = ingestor.ingest(
            &mut records,
            vec![
                RawRecord::Advisory(json!({
                    "id": "CERTFR-2024-AVI-0001",
                    "title": "Multiples vulnérabilités dans le noyau Linux",
                    "published_at": "2024-01-10",
                })),
                RawRecord::Advisory(json!({
                    "id": "CERTFR-2024-AVI-0002",
                    "title": "Vulnérabilité dans OpenSSL",
                    "published_at": "2024-03-15",
                })),
                RawRecord::Advisory(json!({
                    "id": "CERTFR-2024-AVI-0003",
                    "title": "Vulnérabilité dans Exemple",
                })),
            ],
        );
        assert_eq!(dropped, 0);

        records
    }

    #[test]
    fn empty_filter_passes_everything_through() {
        let records = records();

        let matched = apply(&records, &FilterConfig::default());
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn unmatched_keyword_yields_empty_without_mutation() {
        let records = records();
        let before = records.advisory_count();

        let matched = apply(
            &records,
            &FilterConfig {
                keywords: vec!["kubernetes".into()],
                ..Default::default()
            },
        );

        assert!(matched.is_empty());
        assert_eq!(records.advisory_count(), before);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let records = records();

        let matched = apply(
            &records,
            &FilterConfig {
                keywords: vec!["OpenSSL".into()],
                ..Default::default()
            },
        );

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id.as_str(), "CERTFR-2024-AVI-0002");
    }

    #[test]
    fn date_bounds_are_inclusive_and_anded_with_keywords() {
        let records = records();

        let matched = apply(
            &records,
            &FilterConfig {
                date_from: Some(datetime!(2024-01-10 00:00:00 UTC)),
                date_to: Some(datetime!(2024-01-10 00:00:00 UTC)),
                ..Default::default()
            },
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id.as_str(), "CERTFR-2024-AVI-0001");

        let matched = apply(
            &records,
            &FilterConfig {
                keywords: vec!["openssl".into()],
                date_to: Some(datetime!(2024-01-31 00:00:00 UTC)),
                ..Default::default()
            },
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn undated_advisories_fail_date_bounds() {
        let records = records();

        let matched = apply(
            &records,
            &FilterConfig {
                date_from: Some(datetime!(2024-01-01 00:00:00 UTC)),
                ..Default::default()
            },
        );

        assert_eq!(matched.len(), 2);
    }
}
