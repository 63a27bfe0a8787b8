use crate::{
    fetch::{FetchArgs, exit_code, load_keywords},
    output::OutputConfig,
};
use std::{path::PathBuf, process::ExitCode};
use vigil_common::config::FilterConfig;
use vigil_module_fundamental::advisory::service::AdvisoryService;

#[derive(clap::Args, Debug)]
pub struct Run {
    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(flatten)]
    pub filter: FilterConfig,

    /// Load additional keyword tokens from a file, one per line
    #[arg(long, value_name = "FILE")]
    pub keyword_file: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputConfig,
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let Self {
            fetch,
            mut filter,
            keyword_file,
            output,
        } = self;

        if let Some(path) = &keyword_file {
            load_keywords(&mut filter, path)?;
        }

        let (mut records, report) = fetch.fetch_advisories(&filter).await?;

        let rows = AdvisoryService::new().summarize(&mut records, &filter);
        output.write(&rows)?;

        Ok(exit_code(&report))
    }
}
