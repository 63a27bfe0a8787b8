use crate::{
    fetch::{exit_code, http_client, load_catalog, log_report, parse_targets},
    output::OutputConfig,
};
use parking_lot::Mutex;
use std::{path::PathBuf, process::ExitCode};
use url::Url;
use vigil_module_fundamental::vulnerability::service::VulnerabilityService;
use vigil_module_importer::{
    runner::{Runner, RunnerOptions, nvd},
    service,
};
use vigil_module_ingestor::graph::RecordSet;

#[derive(clap::Args, Debug)]
pub struct Run {
    /// Vulnerability identifiers, e.g. CVE-2024-28834
    #[arg(value_name = "CVE", required = true)]
    pub targets: Vec<String>,

    /// Offline reference list of vulnerability scores
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Concurrent fetches
    #[arg(long, default_value_t = 5)]
    pub concurrency: usize,

    #[command(flatten)]
    pub output: OutputConfig,
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let targets = parse_targets(&self.targets)?;
        let catalog = load_catalog(self.catalog.as_deref())?;
        let nvd = nvd::Client::new(http_client()?, Url::parse(nvd::Client::BASE)?);

        let runner = Runner::new(RunnerOptions {
            concurrency: self.concurrency,
        });
        let records = Mutex::new(RecordSet::new());
        let report =
            service::import_vulnerabilities(&runner, &nvd, &catalog, targets, &records).await;
        log_report(&report);

        let rows = VulnerabilityService::new().summarize(&records.into_inner());
        self.output.write(&rows)?;

        Ok(exit_code(&report))
    }
}
