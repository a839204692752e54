use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

const KEPT_LOG_FILES: usize = 5;
const DEFAULT_LEVEL: &str = "debug";

/// Where and how much a single invocation logs.
#[derive(Debug, Clone, Copy)]
pub struct LogSettings<'a> {
    /// Log files are named after the subcommand, so a long running tracker and short cli calls
    /// don't interleave in one file.
    pub file_prefix: &'a str,
    pub application_dir: &'a Path,
    pub level: Option<LevelFilter>,
    /// Stdout is where the check-in form is drawn, so this is off unless debugging.
    pub console: bool,
}

/// Only this crate's events pass. An explicit level wins over `RUST_LOG`.
fn filter_directive(level: Option<LevelFilter>) -> String {
    let level = level
        .map(|v| v.to_string())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LEVEL.into());
    format!("{}={level}", env!("CARGO_PKG_NAME").replace("-", "_"))
}

pub fn enable_logging(settings: LogSettings) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(KEPT_LOG_FILES)
        .filename_prefix(settings.file_prefix)
        .filename_suffix("log")
        .build(settings.application_dir.join("logs"))?;

    let console = settings.console;
    let stdout = std::io::stdout.with_filter(move |_| console);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directive(settings.level)))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
