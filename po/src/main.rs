//! Promptorch CLI entry point
//!
//! Builds a [`Context`] from flags and config, renders one template, and
//! exits 1 when any placeholder is left unresolved.

use std::fs;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context as _, Result};
use tracing::{debug, info};

use promptorch::cli::{Cli, parse_var};
use promptorch::config::Config;
use promptorch::{Context, PromptError, TemplateProcessor};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > WARN
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    // stdout carries the rendered template, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let ctx = build_context(&cli, &config)?;
    info!(?ctx, "Context built");

    let processor = TemplateProcessor::new(&ctx);
    let rendered = processor.process_file(&cli.template)?;

    let text = match rendered.require_complete() {
        Ok(text) => text,
        Err(PromptError::Unresolved { missing }) => {
            report_missing(&missing, &ctx);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &text).map_err(|source| PromptError::OutputWrite {
                path: path.clone(),
                source,
            })?;
            println!("{} Processed prompt written to {}", "✓".green(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Assemble the resolution context from CLI flags, falling back to config
fn build_context(cli: &Cli, config: &Config) -> Result<Context> {
    let mut ctx = match cli.knowledge.as_ref().or(config.knowledge_base.as_ref()) {
        Some(kb) => Context::new(kb),
        None => Context::default(),
    };
    ctx.set_command_timeout(Duration::from_secs(config.command_timeout_secs));

    for raw in &cli.vars {
        match parse_var(raw) {
            Some((name, value)) => ctx.add_variable(name, value),
            None => eprintln!("{} Invalid variable format: {}", "Warning:".yellow(), raw),
        }
    }

    let mut loaded = 0;
    for path in &cli.json {
        match ctx.add_json_file(path) {
            Ok(_) => loaded += 1,
            Err(e) => eprintln!("{} {}", "Warning:".yellow(), e),
        }
    }
    if !cli.json.is_empty() && loaded == 0 {
        eyre::bail!("None of the {} JSON data file(s) could be loaded", cli.json.len());
    }

    for path in &cli.search_paths {
        ctx.add_search_path(path);
    }
    for path in &config.search_paths {
        ctx.add_search_path(path);
    }
    for path in config.auto_search_paths_for(&cli.template) {
        debug!(?path, "Adding auto search path");
        ctx.add_search_path(path);
    }

    Ok(ctx)
}

fn report_missing(missing: &[String], ctx: &Context) {
    let shown: Vec<&str> = missing
        .iter()
        .map(|p| if p.is_empty() { "{{ }}" } else { p.as_str() })
        .collect();
    eprintln!("{} Unresolved placeholders: {}", "Error:".red(), shown.join(", "));

    eprintln!("\nAvailable variables:");
    for key in ctx.variables().keys() {
        eprintln!("  - {}", key);
    }

    eprintln!("\nAvailable data sources:");
    for key in ctx.data_sources().keys() {
        eprintln!("  - {}", key);
    }
}
