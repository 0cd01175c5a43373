use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use formflow_core::ShapeParams;

#[derive(Parser)]
#[command(
    name = "formflow",
    version,
    about = "Load, validate and fill multi-section forms served over HTTP"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Form server base URL (overrides FORMFLOW_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// YAML config file (base_url, timeout_secs, max_retries)
    #[arg(long, global = true, env = "FORMFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a schema from the server and print its outline
    Fetch(FetchArgs),
    /// List every control binding id in a schema file
    Bindings(BindingsArgs),
    /// Run the final validation sweep over an answers file, offline
    Validate(ValidateArgs),
    /// Fill and submit a form on the server, section by section
    Fill(FillArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Clone, Copy, Debug, Default)]
pub struct ShapeArgs {
    /// Requested number of sections
    #[arg(long)]
    pub section_count: Option<u32>,

    /// Requested number of fields per section
    #[arg(long)]
    pub field_count: Option<u32>,
}

impl ShapeArgs {
    pub fn params(&self) -> ShapeParams {
        ShapeParams::new(self.section_count, self.field_count)
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub shape: ShapeArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct BindingsArgs {
    /// Schema file (JSON, bare or wrapped in "form")
    #[arg(long)]
    pub schema: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Schema file (JSON, bare or wrapped in "form")
    #[arg(long)]
    pub schema: PathBuf,

    /// Answers file: YAML or JSON mapping of field id to value
    #[arg(long)]
    pub answers: PathBuf,

    /// Evaluate age rules as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub today: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct FillArgs {
    /// Answers file: YAML or JSON mapping of field id to value
    #[arg(long)]
    pub answers: PathBuf,

    #[command(flatten)]
    pub shape: ShapeArgs,

    /// Walk every section and run the final sweep, but print the payload
    /// instead of submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Evaluate age rules as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub today: Option<NaiveDate>,
}
