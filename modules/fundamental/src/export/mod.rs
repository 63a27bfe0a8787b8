use crate::Error;
use serde::Serialize;
use std::io::Write;

/// Write rows as CSV, one record per row, headers derived from the row
/// type.
pub fn to_csv<S: Serialize>(rows: &[S], writer: impl Write) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write rows as a pretty-printed JSON array.
pub fn to_json<S: Serialize>(rows: &[S], writer: impl Write) -> Result<(), Error> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::advisory::model::AdvisorySummary;
    use time::macros::datetime;
    use vigil_cvss::severity::Severity;

    fn rows() -> Vec<AdvisorySummary> {
        vec![
            AdvisorySummary {
                advisory_id: "CERTFR-2024-AVI-0001".parse().expect("must parse"),
                title: Some("Multiples vulnérabilités dans Exemple".into()),
                max_severity_id: Some("CVE-2024-0002".parse().expect("must parse")),
                max_severity_score: Some(9.8),
                severity: Some(Severity::Critical),
                published_at: Some(datetime!(2024-07-02 00:00:00 UTC)),
            },
            AdvisorySummary {
                advisory_id: "CERTFR-2024-AVI-0002".parse().expect("must parse"),
                title: None,
                max_severity_id: None,
                max_severity_score: None,
                severity: None,
                published_at: None,
            },
        ]
    }

    #[test]
    fn csv_keeps_absent_scores_empty() {
        let mut buffer = Vec::new();
        to_csv(&rows(), &mut buffer).expect("must serialize");

        let text = String::from_utf8(buffer).expect("must be utf-8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(
                "advisory_id,title,max_severity_id,max_severity_score,severity,published_at"
            )
        );
        let first = lines.next().expect("must have a row");
        assert!(first.contains("CVE-2024-0002"));
        assert!(first.contains("critical"));
        let second = lines.next().expect("must have a row");
        assert_eq!(second, "CERTFR-2024-AVI-0002,,,,,");
    }

    #[test]
    fn json_round_trips() {
        let mut buffer = Vec::new();
        to_json(&rows(), &mut buffer).expect("must serialize");

        let parsed: Vec<AdvisorySummary> =
            serde_json::from_slice(&buffer).expect("must deserialize");
        assert_eq!(parsed, rows());
    }
}
