use std::path::Path;

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt};

/// Console output goes to `console`, never stdout: stdout carries command results.
pub fn get_subscriber<W>(
    debug: bool,
    max_log_files: usize,
    log_dir: impl AsRef<Path>,
    console: W,
) -> Result<(impl tracing::Subscriber + Send + Sync, WorkerGuard), InitError>
where
    W: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
{
    let env_filter = if debug {
        "trace".to_string()
    } else {
        "info".to_string()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(env_filter));

    let json_log = if !debug {
        let json_log = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(console.clone());
        Some(json_log)
    } else {
        None
    };

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_suffix("log")
        .max_log_files(max_log_files)
        .build(log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking);

    let console_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(console);
    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(console_log)
        .with(json_log)
        .with(file_log);

    Ok((subscriber, guard))
}

/// Keep the returned guard alive until exit, or buffered file logs are lost.
pub fn init_subscriber(debug: bool, max_log_files: usize) -> Result<WorkerGuard, String> {
    let (subscriber, guard) = get_subscriber(debug, max_log_files, "./logs", std::io::stderr)
        .map_err(|e| e.to_string())?;
    tracing::subscriber::set_global_default(subscriber).map_err(|e| e.to_string())?;
    Ok(guard)
}
