use anyhow::Context;
use parking_lot::Mutex;
use std::{fs, path::PathBuf, process::ExitCode, str::FromStr, time::Duration};
use time::OffsetDateTime;
use url::Url;
use vigil_common::{config::FilterConfig, date::parse_timestamp, id::AdvisoryKind};
use vigil_module_importer::{
    catalog::Catalog,
    runner::{RunReport, Runner, RunnerOptions, certfr, nvd},
    service,
};
use vigil_module_ingestor::graph::RecordSet;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Target selection and transport options shared by advisory-driven
/// commands.
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Advisory references, e.g. CERTFR-2024-AVI-0123
    #[arg(value_name = "REFERENCE", required_unless_present = "feed")]
    pub targets: Vec<String>,

    /// Seed targets from the publication feed instead of explicit references
    #[arg(long)]
    pub feed: bool,

    /// Publication series to read the feed from
    #[arg(long, value_enum, default_value_t = AdvisoryKind::Advisory)]
    pub feed_kind: AdvisoryKind,

    /// With --feed, keep only items published after this date
    #[arg(long, value_parser = parse_timestamp)]
    pub since: Option<OffsetDateTime>,

    /// Offline reference list of vulnerability scores
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Concurrent fetches
    #[arg(long, default_value_t = 5)]
    pub concurrency: usize,
}

impl FetchArgs {
    /// Fetch advisories and the vulnerabilities they reference into a
    /// fresh record set.
    pub async fn fetch_advisories(
        &self,
        filter: &FilterConfig,
    ) -> anyhow::Result<(RecordSet, RunReport)> {
        // configuration problems are fatal before the first fetch
        filter.validate()?;

        let catalog = load_catalog(self.catalog.as_deref())?;
        let http = http_client()?;
        let certfr = certfr::Client::new(http.clone(), Url::parse(certfr::Client::BASE)?);
        let nvd = nvd::Client::new(http, Url::parse(nvd::Client::BASE)?);

        let targets = if self.feed {
            let targets = certfr
                .feed(self.feed_kind, self.since)
                .await
                .context("feed listing failed")?;
            log::info!("{} references listed by the feed", targets.len());
            targets
        } else {
            parse_targets(&self.targets)?
        };

        let runner = Runner::new(RunnerOptions {
            concurrency: self.concurrency,
        });
        let records = Mutex::new(RecordSet::new());
        let report =
            service::import_advisories(&runner, &certfr, &nvd, &catalog, targets, &records).await;

        log_report(&report);
        Ok((records.into_inner(), report))
    }
}

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

pub fn load_catalog(path: Option<&std::path::Path>) -> anyhow::Result<Catalog> {
    match path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display())),
        None => Ok(Catalog::default()),
    }
}

/// Parse explicit targets, skipping invalid references with a warning.
/// Only a fully unusable target list is an error.
pub fn parse_targets<T: FromStr>(targets: &[String]) -> anyhow::Result<Vec<T>>
where
    T::Err: std::fmt::Display,
{
    let mut parsed = Vec::new();

    for target in targets {
        match target.parse() {
            Ok(target) => parsed.push(target),
            Err(err) => log::warn!("skipping target: {err}"),
        }
    }

    anyhow::ensure!(!parsed.is_empty(), "no usable target");
    Ok(parsed)
}

/// Merge keyword tokens from a file, one per line, into the filter.
pub fn load_keywords(filter: &mut FilterConfig, path: &std::path::Path) -> anyhow::Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading keywords {}", path.display()))?;

    for line in content.lines() {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            filter.keywords.push(line.to_owned());
        }
    }

    Ok(())
}

pub fn log_report(report: &RunReport) {
    log::info!(
        "{} fetched, {} from catalog, {} failed, {} records dropped",
        report.fetched,
        report.skipped.len(),
        report.errors.len(),
        report.dropped,
    );

    for (target, error) in &report.errors {
        log::warn!("{target}: {error}");
    }
}

/// A run that produced nothing at all is a failure; partial results are
/// success, matching the per-target isolation of the runner.
pub fn exit_code(report: &RunReport) -> ExitCode {
    if report.fetched == 0 && report.skipped.is_empty() && !report.errors.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
