//! CLI argument parsing for promptorch

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

/// Process prompt templates with layered placeholder resolution
#[derive(Parser, Debug)]
#[command(name = "po")]
#[command(author, version, about = "Process prompt templates with layered placeholder resolution", long_about = None)]
#[command(after_help = "Examples:
  po template.md -v ISSUE_NUMBER=123
  po template.md -o output.md
  po template.md -j data.json
  po template.md -k ~/my-knowledge
  po template.md -v NAME=John -v AGE=30")]
pub struct Cli {
    /// Path to template file
    pub template: PathBuf,

    /// Output file path (prints to stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Variables in format NAME=value
    #[arg(short = 'v', long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// JSON files to load as data sources
    #[arg(short = 'j', long = "json", value_name = "JSON_FILE")]
    pub json: Vec<PathBuf>,

    /// Knowledge base directory for INJECT: placeholders
    #[arg(short = 'k', long = "knowledge", value_name = "DIR")]
    pub knowledge: Option<PathBuf>,

    /// Additional search paths for variable files
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

/// Split `NAME=value` on the first `=`
///
/// Returns `None` when there is no `=`. The value may itself contain `=`.
pub fn parse_var(raw: &str) -> Option<(&str, &str)> {
    debug!(%raw, "parse_var: called");
    raw.split_once('=')
}
