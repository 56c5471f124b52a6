// src/main.rs

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vanguard_probe::config::ScanConfig;
use vanguard_probe::core::scanner::run_full_scan;
use vanguard_probe::logging::initialize_logging;

#[derive(Parser, Debug)]
#[command(name = "vanguard-probe", version, about = "Network and web vulnerability scanner")]
struct Cli {
    /// Host, IP or URL to scan
    #[arg(value_name = "TARGET")]
    target: String,

    /// JSON scan configuration (defaults to config.json in the project config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- Setup ---
    let Cli { target, config } = Cli::parse();
    color_eyre::install()?;
    initialize_logging()?;

    let config = match config {
        Some(path) => ScanConfig::load(&path).wrap_err_with(|| format!("loading {}", path.display()))?,
        None => ScanConfig::load_or_default()?,
    };

    // Ctrl-C stops outstanding work; the partial result is still printed.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling scan.");
            eprintln!("Cancelling scan...");
            on_interrupt.cancel();
        }
    });

    eprintln!("Scanning {} ...", target);
    let result = run_full_scan(&target, &config, cancel).await?;
    info!(scanned = %target, "Scan complete, writing report.");

    println!("{}", serde_json::to_string_pretty(&result)?);
    eprintln!(
        "{} open ports, {} web findings, {} known CVEs, {} zero-day candidates",
        result.open_ports.len(),
        result.web_vulnerabilities.len(),
        result.known_vulnerabilities.len(),
        result.zero_day_potential.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn target_with_optional_config() {
        let cli = Cli::try_parse_from(["vanguard-probe", "example.com"]).unwrap();
        assert_eq!(cli.target, "example.com");
        assert_eq!(cli.config, None);

        let cli = Cli::try_parse_from(["vanguard-probe", "https://a.test", "--config", "scan.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("scan.json")));
        assert_eq!(cli.target, "https://a.test");

        let cli = Cli::try_parse_from(["vanguard-probe", "-c", "scan.json", "a.test"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("scan.json")));
    }

    #[test]
    fn missing_or_extra_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["vanguard-probe"]).is_err());
        assert!(Cli::try_parse_from(["vanguard-probe", "a.test", "b.test"]).is_err());
        assert!(Cli::try_parse_from(["vanguard-probe", "a.test", "--config"]).is_err());
    }
}
