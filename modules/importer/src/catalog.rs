use serde_json::json;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};
use vigil_common::{date::parse_timestamp, id::VulnerabilityId};
use vigil_cvss::score::{Score, ScoreType};
use vigil_module_ingestor::graph::vulnerability::{Provenance, VulnerabilityRecord};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Offline reference list of vulnerability scores.
///
/// Entries are merged into the record set up front and their identifiers
/// are skipped by the runner, so a catalog both seeds the run and keeps
/// request volume down. Malformed entries are dropped with a warning,
/// like any other malformed record.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: BTreeMap<VulnerabilityId, VulnerabilityRecord>,
}

impl Catalog {
    /// Load a catalog file, dispatching on the extension: `.json` files
    /// hold an array of vulnerability payloads, anything else one
    /// `CVE-id,score[,published]` entry per line.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(file)
        } else {
            Self::from_lines(BufReader::new(file))
        }
    }

    /// Parse the line format. Blank lines and `#` comments are skipped.
    pub fn from_lines(reader: impl BufRead) -> Result<Self, Error> {
        let mut entries = BTreeMap::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Some(record) => {
                    entries.insert(record.id.clone(), record);
                }
                None => log::warn!("dropping malformed catalog entry at line {}", number + 1),
            }
        }

        Ok(Self { entries })
    }

    /// Parse a JSON array of `{id, severity_score, published_at}`
    /// payloads, the same shape the vulnerability loader accepts.
    pub fn from_json(reader: impl Read) -> Result<Self, Error> {
        let values: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
        let mut entries = BTreeMap::new();

        for value in values {
            match vigil_module_ingestor::service::vulnerability::load(&value) {
                Ok(mut record) => {
                    record.provenance = Provenance::Catalog;
                    entries.insert(record.id.clone(), record);
                }
                Err(err) => log::warn!("dropping malformed catalog entry: {err}"),
            }
        }

        Ok(Self { entries })
    }

    pub fn contains(&self, id: &VulnerabilityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &VulnerabilityRecord> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> Option<VulnerabilityRecord> {
    let mut parts = line.split(',').map(str::trim);

    let id: VulnerabilityId = parts.next()?.parse().ok()?;
    let value: f64 = parts.next()?.parse().ok()?;
    let score = Score::new(ScoreType::V3_1, value).ok()?;
    let published = match parts.next() {
        Some(text) => Some(parse_timestamp(text).ok()?),
        None => None,
    };

    Some(VulnerabilityRecord {
        raw: json!({
            "id": id.as_str(),
            "severity_score": score.value,
        }),
        id,
        score: Some(score),
        published,
        description: None,
        provenance: Provenance::Catalog,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn line_format() {
        let catalog = Catalog::from_lines(Cursor::new(
            "# reference scores\n\
             CVE-2024-0001,9.8\n\
             \n\
             cve-2024-0002,5.0,2024-03-01\n\
             not-an-id,1.0\n\
             CVE-2024-0003,eleven\n",
        ))
        .expect("must load");

        assert_eq!(catalog.len(), 2);
        let id = "CVE-2024-0002".parse().expect("must parse");
        assert!(catalog.contains(&id));

        let record = catalog.records().next().expect("must have entries");
        assert_eq!(record.provenance, Provenance::Catalog);
    }

    #[test]
    fn json_format() {
        let catalog = Catalog::from_json(Cursor::new(
            r#"[
                { "id": "CVE-2024-0001", "severity_score": 7.5 },
                { "id": "CVE-2024-0002" }
            ]"#,
        ))
        .expect("must load");

        assert_eq!(catalog.len(), 2);
        assert!(
            catalog
                .records()
                .all(|record| record.provenance == Provenance::Catalog)
        );
    }

    #[test]
    fn path_dispatch() {
        let dir = tempfile::tempdir().expect("must create");
        let path = dir.path().join("scores.txt");
        std::fs::write(&path, "CVE-2024-0001,4.4\n").expect("must write");

        let catalog = Catalog::from_path(&path).expect("must load");
        assert_eq!(catalog.len(), 1);
    }
}
