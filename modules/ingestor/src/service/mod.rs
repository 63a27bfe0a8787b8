pub mod advisory;
pub mod vulnerability;

use crate::graph::RecordSet;
use serde_json::Value;
use vigil_common::id::IdError;

/// Errors raised while normalizing a raw payload into a record.
///
/// Each one invalidates a single record, never a run: the ingestor drops
/// the offending payload and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] time::error::Parse),
    #[error(transparent)]
    Score(#[from] vigil_cvss::score::OutOfRange),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Raw payload handed over by a source adapter, tagged with its shape.
#[derive(Clone, Debug)]
pub enum RawRecord {
    Advisory(Value),
    Vulnerability(Value),
}

/// Normalizes raw adapter payloads and merges them into a [`RecordSet`].
///
/// Normalization happens right at this boundary, so upstream format
/// drift never leaks past the loaders.
#[derive(Clone, Copy, Debug, Default)]
pub struct IngestorService;

impl IngestorService {
    pub fn new() -> Self {
        Self
    }

    /// Ingest a batch of raw records in arrival order, returning how many
    /// were dropped as malformed.
    pub fn ingest(&self, records: &mut RecordSet, batch: Vec<RawRecord>) -> usize {
        let mut dropped = 0;

        for raw in batch {
            if let Err(err) = self.ingest_one(records, raw) {
                log::warn!("dropping malformed record: {err}");
                dropped += 1;
            }
        }

        dropped
    }

    fn ingest_one(&self, records: &mut RecordSet, raw: RawRecord) -> Result<(), Error> {
        match raw {
            RawRecord::Advisory(value) => {
                records.upsert_advisory(advisory::load(&value)?);
            }
            RawRecord::Vulnerability(value) => {
                records.upsert_vulnerability(vulnerability::load(&value)?);
            }
        }

        Ok(())
    }
}

fn required_str<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, Error> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or(Error::MissingField(field))
}

fn optional_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}
