use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod advisory;
mod fetch;
mod kpi;
mod output;
mod vulnerability;

/// Vulnerability-intelligence watcher: fetches CERT advisories and
/// vulnerability records, ranks severity, and tracks KPI trends.
#[derive(Parser, Debug)]
#[command(name = "vigild", version, about)]
struct Cli {
    /// Log filter, e.g. `info` or `vigil=debug`
    #[arg(long, default_value = "info", global = true)]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Fetch and rank CERT advisories
    Advisory(advisory::Run),
    /// Fetch vulnerability records directly
    Vulnerability(vulnerability::Run),
    /// Fold an advisory run into the KPI history
    Kpi(kpi::Run),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log)?)
        .init();

    match cli.command {
        Command::Advisory(run) => run.run().await,
        Command::Vulnerability(run) => run.run().await,
        Command::Kpi(run) => run.run().await,
    }
}
