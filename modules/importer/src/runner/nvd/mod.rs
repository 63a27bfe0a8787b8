use super::common::{FetchError, SourceAdapter, Target};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;
use vigil_common::id::VulnerabilityId;
use vigil_cvss::score::ScoreType;
use vigil_module_ingestor::service::RawRecord;

/// Client for the vulnerability database's REST API.
pub struct Client {
    http: reqwest::Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    vulnerabilities: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    cve: Cve,
}

#[derive(Debug, Deserialize)]
struct Cve {
    id: String,
    published: Option<String>,
    #[serde(default)]
    descriptions: Vec<Description>,
    metrics: Option<Metrics>,
}

#[derive(Debug, Deserialize)]
struct Description {
    lang: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct Metrics {
    #[serde(rename = "cvssMetricV31")]
    v3_1: Option<Vec<Metric>>,
    #[serde(rename = "cvssMetricV30")]
    v3_0: Option<Vec<Metric>>,
    #[serde(rename = "cvssMetricV2")]
    v2: Option<Vec<Metric>>,
}

#[derive(Debug, Deserialize)]
struct Metric {
    #[serde(rename = "cvssData")]
    data: CvssData,
}

#[derive(Debug, Deserialize)]
struct CvssData {
    #[serde(rename = "baseScore")]
    base_score: f64,
}

impl Cve {
    /// Pick the base score to carry, preferring the newest scoring
    /// system the record was rated under.
    fn base_score(&self) -> Option<(ScoreType, f64)> {
        let metrics = self.metrics.as_ref()?;

        [
            (ScoreType::V3_1, &metrics.v3_1),
            (ScoreType::V3, &metrics.v3_0),
            (ScoreType::V2, &metrics.v2),
        ]
        .into_iter()
        .find_map(|(r#type, metric)| {
            let metric = metric.as_ref()?.first()?;
            Some((r#type, metric.data.base_score))
        })
    }

    fn description(&self) -> Option<&str> {
        self.descriptions
            .iter()
            .find(|description| description.lang == "en")
            .or(self.descriptions.first())
            .map(|description| description.value.as_str())
    }
}

impl Client {
    pub const BASE: &'static str = "https://services.nvd.nist.gov/rest/json/cves/2.0";

    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    async fn record(&self, id: &VulnerabilityId) -> Result<RawRecord, FetchError> {
        let response = self
            .http
            .get(self.base.clone())
            .query(&[("cveId", id.as_str())])
            .send()
            .await?;

        let response = match response.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
            _ => response.error_for_status()?,
        };

        let response: Response = response.json().await?;

        // an empty result set means the identifier is unknown upstream
        let entry = response
            .vulnerabilities
            .into_iter()
            .next()
            .ok_or(FetchError::NotFound)?;

        Ok(normalize(&entry.cve))
    }
}

/// Flatten an API record into the vulnerability shape the ingestor
/// understands.
fn normalize(cve: &Cve) -> RawRecord {
    let score = cve.base_score();

    RawRecord::Vulnerability(json!({
        "id": cve.id,
        "severity_score": score.map(|(_, value)| value),
        "score_type": score.map(|(r#type, _)| r#type),
        "published_at": cve.published,
        "description": cve.description(),
    }))
}

impl SourceAdapter for Client {
    async fn fetch(&self, target: &Target) -> Result<Vec<RawRecord>, FetchError> {
        match target {
            Target::Vulnerability(id) => Ok(vec![self.record(id).await?]),
            // advisories live on the CERT side, not in this database
            Target::Advisory(_) => Err(FetchError::NotFound),
        }
    }
}
