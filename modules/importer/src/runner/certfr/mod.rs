use super::common::{FetchError, SourceAdapter, Target};
use regex::Regex;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::LazyLock;
use time::OffsetDateTime;
use url::Url;
use vigil_common::{
    date::parse_feed_timestamp,
    id::{AdvisoryId, AdvisoryKind},
};
use vigil_module_ingestor::service::RawRecord;

static FEED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<item>.*?<link>(.*?)</link>.*?<pubDate>(.*?)</pubDate>.*?</item>")
        .expect("hard-coded pattern")
});

static FEED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CERTFR-\d{4}-(?:AVI|ALE|CTI|IOC|DUR)-\d{3,4}").expect("hard-coded pattern")
});

/// Client for the CERT authority's published pages.
///
/// Each advisory page is fetched as its JSON document; the feed listing
/// yields the most recent references per publication series.
pub struct Client {
    http: reqwest::Client,
    base: Url,
}

impl Client {
    pub const BASE: &'static str = "https://www.cert.ssi.gouv.fr";

    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// Fetch one advisory page as its JSON document.
    async fn document(&self, id: &AdvisoryId) -> Result<Value, FetchError> {
        let url = format!(
            "{}/{}/{}/json/",
            self.base.as_str().trim_end_matches('/'),
            id.kind().path_segment(),
            id
        );

        let response = self.http.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            _ => Ok(response.error_for_status()?.json().await?),
        }
    }

    /// List advisory references from the series feed, keeping only items
    /// published after `since` when given.
    pub async fn feed(
        &self,
        kind: AdvisoryKind,
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<AdvisoryId>, FetchError> {
        let url = format!(
            "{}/feed/{}/",
            self.base.as_str().trim_end_matches('/'),
            kind.path_segment()
        );

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_feed(&body, since))
    }
}

/// Scan a feed document for advisory references and their publication
/// dates. Items without a recognizable reference or date are skipped.
pub fn parse_feed(body: &str, since: Option<OffsetDateTime>) -> Vec<AdvisoryId> {
    FEED_ITEM
        .captures_iter(body)
        .filter_map(|item| {
            let id: AdvisoryId = FEED_REFERENCE
                .find(item.get(1)?.as_str())?
                .as_str()
                .parse()
                .ok()?;
            let published = parse_feed_timestamp(item.get(2)?.as_str()).ok()?;

            match since {
                Some(cutoff) if published <= cutoff => None,
                _ => Some(id),
            }
        })
        .collect()
}

/// Flatten a page document into the advisory shape the ingestor
/// understands: reference extraction happens downstream over `body`, so
/// everything mentioning CVEs is folded into it.
fn normalize(id: &AdvisoryId, document: &Value) -> Value {
    let mut body = String::new();

    for field in ["summary", "content"] {
        if let Some(text) = document.get(field).and_then(Value::as_str) {
            body.push_str(text);
            body.push('\n');
        }
    }

    for cve in named_entries(document, "cves") {
        body.push_str(&cve);
        body.push('\n');
    }

    let published = document
        .get("revisions")
        .and_then(Value::as_array)
        .and_then(|revisions| revisions.first())
        .and_then(|revision| revision.get("revision_date"))
        .and_then(Value::as_str);

    json!({
        "id": id.as_str(),
        "title": document.get("title"),
        "body": body,
        "published_at": published,
        "risks": named_entries(document, "risks").collect::<Vec<_>>(),
    })
}

/// Entries of a list field that are either plain strings or objects
/// carrying a `name`/`description`.
fn named_entries<'a>(document: &'a Value, field: &str) -> impl Iterator<Item = String> + 'a {
    document
        .get(field)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            entry
                .as_str()
                .or_else(|| entry.get("name").and_then(Value::as_str))
                .or_else(|| entry.get("description").and_then(Value::as_str))
                .map(ToOwned::to_owned)
        })
}

impl SourceAdapter for Client {
    async fn fetch(&self, target: &Target) -> Result<Vec<RawRecord>, FetchError> {
        match target {
            Target::Advisory(id) => {
                let document = self.document(id).await?;
                Ok(vec![RawRecord::Advisory(normalize(id, &document))])
            }
            // this source only publishes advisories
            Target::Vulnerability(_) => Err(FetchError::NotFound),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::datetime;

    const FEED: &str = r#"<?xml version="1.0"?>
        <rss><channel>
        <item>
            <title>Vuln A</title>
            <link>https://www.cert.ssi.gouv.fr/avis/CERTFR-2024-AVI-0100/</link>
            <pubDate>Tue, 02 Jul 2024 14:00:00 +0000</pubDate>
        </item>
        <item>
            <title>Vuln B</title>
            <link>https://www.cert.ssi.gouv.fr/avis/CERTFR-2024-AVI-0099/</link>
            <pubDate>Mon, 01 Jul 2024 08:00:00 +0000</pubDate>
        </item>
        </channel></rss>"#;

    #[test]
    fn feed_yields_references() {
        let ids = parse_feed(FEED, None);

        assert_eq!(
            ids.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            vec!["CERTFR-2024-AVI-0100", "CERTFR-2024-AVI-0099"]
        );
    }

    #[test]
    fn feed_honors_cutoff() {
        let ids = parse_feed(FEED, Some(datetime!(2024-07-01 12:00:00 UTC)));

        assert_eq!(
            ids.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            vec!["CERTFR-2024-AVI-0100"]
        );
    }

    #[test]
    fn normalize_folds_cves_into_body() {
        let id: AdvisoryId = "CERTFR-2024-AVI-0100".parse().expect("must parse");
        let document = serde_json::json!({
            "title": "Multiples vulnérabilités dans Exemple",
            "summary": "De multiples vulnérabilités ont été découvertes.",
            "content": "Se référer au bulletin de l'éditeur.",
            "cves": [
                { "name": "CVE-2024-0001", "url": "https://nvd.example/CVE-2024-0001" },
                { "name": "CVE-2024-0002", "url": "https://nvd.example/CVE-2024-0002" }
            ],
            "risks": [ { "description": "Déni de service à distance" } ],
            "revisions": [ { "revision_date": "2024-07-02", "description": "version initiale" } ],
        });

        let raw = normalize(&id, &document);

        assert_eq!(raw["id"], "CERTFR-2024-AVI-0100");
        assert_eq!(raw["published_at"], "2024-07-02");
        let body = raw["body"].as_str().expect("must be text");
        assert!(body.contains("CVE-2024-0001"));
        assert!(body.contains("CVE-2024-0002"));
        assert_eq!(raw["risks"][0], "Déni de service à distance");
    }
}
