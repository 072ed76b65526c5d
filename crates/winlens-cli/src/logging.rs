// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Tracing setup for the `winlens` binary.
//!
//! With `WINLENS_LOG=1` log lines go to `winlens.log` under the platform
//! state directory. Headless commands also log to stderr; the terminal UI
//! never does, since stderr shares the screen with the alternate buffer.
//! `RUST_LOG` picks the filter and defaults to `warn`.

use std::env;
use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::APP_NAME;

const LOG_ENV: &str = "WINLENS_LOG";
const LOG_FILE: &str = "winlens.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Headless,
    Interactive,
}

/// Flushes buffered file output when dropped; hold it until exit.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(target: LogTarget) -> LogGuard {
    let (file_writer, file_guard) = match file_writer() {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    let file_layer = file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false));
    let stderr_layer =
        (target == LogTarget::Headless).then(|| fmt::layer().with_writer(std::io::stderr));

    // A second init (tests, repeated runs in one process) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}

fn file_logging_enabled() -> bool {
    env::var(LOG_ENV).as_deref() == Ok("1")
}

fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(env::temp_dir)
        .join(APP_NAME)
}

fn file_writer() -> Option<(NonBlocking, WorkerGuard)> {
    if !file_logging_enabled() {
        return None;
    }

    let dir = log_dir();
    if let Err(error) = std::fs::create_dir_all(&dir) {
        eprintln!(
            "cannot create log directory {} ({error}); unset {LOG_ENV} to silence this",
            dir.display()
        );
        return None;
    }
    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    Some(tracing_appender::non_blocking(appender))
}
