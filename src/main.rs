use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use logstore::config::{self, Config, SinkKind};
use logstore::logging::{self, ConsoleSink, LogLevel, LogStore};

#[derive(Parser, Debug)]
#[command(name = "logstore")]
#[command(about = "Feed log lines from stdin through the log store and print what it keeps as JSON")]
struct Args {
    #[arg(long, help = "Config file path (default: ~/.logstore/config.toml)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Only print entries at or above this level")]
    min_level: Option<LogLevel>,
}

/// Split `LEVEL [context] message` into its parts
///
/// Lines without a recognised level are logged at info in full.
fn parse_line(line: &str) -> (LogLevel, Option<&str>, &str) {
    let line = line.trim();
    let (level, rest) = match line.split_once(' ') {
        Some((head, rest)) => match head.parse::<LogLevel>() {
            Ok(level) => (level, rest.trim_start()),
            Err(_) => (LogLevel::Info, line),
        },
        None => match line.parse::<LogLevel>() {
            Ok(level) => (level, ""),
            Err(_) => (LogLevel::Info, line),
        },
    };

    if let Some(tail) = rest.strip_prefix('[') {
        if let Some((context, message)) = tail.split_once(']') {
            let context = context.trim();
            let context = if context.is_empty() { None } else { Some(context) };
            return (level, context, message.trim_start());
        }
    }
    (level, None, rest)
}

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "logstore=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::load().with_context(|| {
            format!("Failed to load {}", config::config_file_path().display())
        })?,
    };

    let store = LogStore::from_config(&config);
    if config.sink == SinkKind::Console {
        // stdout carries the JSON dump
        store.set_sink(Arc::new(ConsoleSink::stderr_only()));
    }
    let store = logging::init_global(store)?;
    tracing::debug!(
        "Log store ready: threshold {}, capacity {}",
        store.threshold(),
        store.capacity()
    );

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let (level, context, message) = parse_line(&line);
        store.log(level, message, context, None);
    }

    if store.dropped_count() > 0 {
        tracing::info!("Dropped {} entries below threshold", store.dropped_count());
    }

    let entries = store.get_logs(args.min_level);
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &entries).context("Failed to write entries")?;
    writeln!(stdout)?;
    Ok(())
}
