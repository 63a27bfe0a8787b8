use serde::Serialize;
use std::{fs::File, io::Write, path::PathBuf};
use vigil_module_fundamental::{Error, export};

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Format {
    Json,
    Csv,
}

/// Where and how result rows are written.
#[derive(clap::Args, Debug)]
pub struct OutputConfig {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Write to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl OutputConfig {
    pub fn write<S: Serialize>(&self, rows: &[S]) -> Result<(), Error> {
        match &self.output {
            Some(path) => self.write_to(rows, File::create(path)?),
            None => self.write_to(rows, std::io::stdout().lock()),
        }
    }

    fn write_to<S: Serialize>(&self, rows: &[S], writer: impl Write) -> Result<(), Error> {
        match self.format {
            Format::Csv => export::to_csv(rows, writer),
            Format::Json => export::to_json(rows, writer),
        }
    }
}
