use crate::{
    fetch::{FetchArgs, exit_code, load_keywords},
    output::OutputConfig,
};
use anyhow::Context;
use std::{
    fs::File,
    path::{Path, PathBuf},
    process::ExitCode,
};
use time::OffsetDateTime;
use vigil_common::config::{FilterConfig, HistoryConfig};
use vigil_module_analysis::{
    model::{KpiHistory, KpiRow},
    service::KpiAggregator,
};
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
    pub history: HistoryConfig,

    /// History file to load and update
    #[arg(long, value_name = "FILE", default_value = "kpi-history.json")]
    pub history_file: PathBuf,

    #[command(flatten)]
    pub output: OutputConfig,
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let Self {
            fetch,
            mut filter,
            keyword_file,
            history: config,
            history_file,
            output,
        } = self;

        config.validate()?;

        if let Some(path) = &keyword_file {
            load_keywords(&mut filter, path)?;
        }

        let (mut records, report) = fetch.fetch_advisories(&filter).await?;
        let rows = AdvisoryService::new().summarize(&mut records, &filter);

        let mut aggregator = KpiAggregator::new();
        for row in &rows {
            aggregator.observe(row.severity);
        }
        let snapshot = aggregator.close(OffsetDateTime::now_utc());

        let mut history = load_history(&history_file, config.depth)?;
        history.append(snapshot, config.gap);
        store_history(&history_file, &history)?;

        log::info!(
            "{} snapshots retained, tendency {}",
            history.len(),
            history.tendency()
        );

        let rows: Vec<KpiRow> = history.snapshots().map(KpiRow::from).collect();
        output.write(&rows)?;

        Ok(exit_code(&report))
    }
}

fn load_history(path: &Path, depth: usize) -> anyhow::Result<KpiHistory> {
    if !path.exists() {
        return Ok(KpiHistory::new(depth));
    }

    let file =
        File::open(path).with_context(|| format!("reading history {}", path.display()))?;
    let mut history: KpiHistory = serde_json::from_reader(file)
        .with_context(|| format!("parsing history {}", path.display()))?;

    // the configured depth wins over whatever the file carried
    history.set_depth(depth);
    Ok(history)
}

fn store_history(path: &Path, history: &KpiHistory) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("writing history {}", path.display()))?;
    serde_json::to_writer_pretty(file, history)?;
    Ok(())
}
