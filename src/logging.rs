// src/logging.rs

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::fs::OpenOptions;
use std::path::PathBuf;
use time::macros::format_description;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase();
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", *PROJECT_NAME);
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

pub(crate) fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "vanguard-probe", env!("CARGO_PKG_NAME"))
}

pub fn get_data_dir() -> PathBuf {
    match project_directory() {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => PathBuf::from(".").join(".data"),
    }
}

/// Where `initialize_logging` writes; scans append to the same file.
pub fn log_path() -> PathBuf {
    get_data_dir().join(&*LOG_FILE)
}

/// Sets up the tracing registry: a timestamped file log filtered by
/// `RUST_LOG` or `VANGUARD_PROBE_LOGLEVEL`, and warnings on stderr.
///
/// Suppressed network errors are logged at debug level, so run with
/// `VANGUARD_PROBE_LOGLEVEL=vanguard_probe=debug` to see why a port was
/// reported closed or a payload inconclusive.
pub fn initialize_logging() -> Result<()> {
    std::fs::create_dir_all(get_data_dir())?;
    let log_file = OpenOptions::new().create(true).append(true).open(log_path())?;

    let file_log_level = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(&*LOG_ENV))
        .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")));

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_timer(timer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(file_log_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(EnvFilter::new(format!("{}=warn", env!("CARGO_CRATE_NAME"))));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}
