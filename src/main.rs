//! PVS6 Logger binary
//!
//! Polls a PVS6 supervisor and writes its telemetry to InfluxDB, either once
//! or on a fixed interval until interrupted.

use anyhow::Context;
use clap::Parser;
use pvs6_logger::{
    Collector, InfluxWriter, PvsClient, PvsConfig, SinkConfig, DEFAULT_INFLUX_DB,
    DEFAULT_INFLUX_URL, DEFAULT_INTERVAL_SECS,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "pvs6_logger")]
#[command(about = "PVS6 InfluxDB Logger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Fetch telemetry from a SunPower PVS6 and write it to InfluxDB")]
struct Cli {
    /// PVS6 hostname or IP address
    host: String,

    /// InfluxDB write URL
    #[arg(long, env = "PVS_INFLUX_URL", default_value = DEFAULT_INFLUX_URL)]
    influx_url: String,

    /// InfluxDB database name
    #[arg(long, env = "PVS_INFLUX_DB", default_value = DEFAULT_INFLUX_DB)]
    influx_db: String,

    /// Collection interval in seconds
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Run once instead of continuously
    #[arg(long)]
    once: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Test InfluxDB connection and exit
    #[arg(long)]
    test_influxdb: bool,

    /// Test with a single InfluxDB line
    #[arg(long)]
    test_single_line: bool,

    /// Test with sample PVS data (no PVS connection needed)
    #[arg(long)]
    test_real_data: bool,

    /// Default serial number to use if retrieval fails
    #[arg(long, env = "PVS_DEFAULT_SERIAL")]
    default_serial: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let sink_config = SinkConfig::new(&cli.influx_url, &cli.influx_db).with_verbose(cli.verbose);
    let sink = InfluxWriter::new(sink_config).context("failed to set up InfluxDB client")?;

    if cli.test_influxdb {
        return Ok(exit_code(sink.test_connection().await));
    }
    if cli.test_single_line {
        return Ok(exit_code(sink.test_single_line().await));
    }
    if cli.test_real_data {
        return Ok(exit_code(sink.test_real_data().await));
    }

    let pvs_config = PvsConfig::new(&cli.host).with_default_serial(cli.default_serial.clone());
    let source = PvsClient::new(pvs_config).context("failed to set up PVS client")?;
    let mut collector = Collector::new(source, sink);

    if cli.once {
        return Ok(match collector.run_once().await {
            Ok(report) => {
                info!(
                    "Collected {} variables into {} records",
                    report.variables, report.records
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Data collection failed: {}", e);
                ExitCode::FAILURE
            }
        });
    }

    collector
        .run_continuous(Duration::from_secs(cli.interval), shutdown_signal())
        .await;
    Ok(ExitCode::SUCCESS)
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn exit_code(result: pvs6_logger::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed the loop simply
/// runs until the process is killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received interrupt, shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "pvs6_logger",
            "192.168.1.50",
            "--interval",
            "30",
            "--once",
            "--default-serial",
            "ZT231385000549F1084",
        ])
        .unwrap();
        assert_eq!(cli.host, "192.168.1.50");
        assert_eq!(cli.interval, 30);
        assert!(cli.once);
        assert_eq!(cli.default_serial.as_deref(), Some("ZT231385000549F1084"));
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["pvs6_logger", "pvs.local"]).unwrap();
        assert_eq!(cli.interval, DEFAULT_INTERVAL_SECS);
        assert!(!cli.once);
        assert!(!cli.verbose);
        assert!(!cli.test_influxdb);
    }

    #[test]
    fn test_host_is_required() {
        assert!(Cli::try_parse_from(["pvs6_logger"]).is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["pvs6_logger", "pvs", "--interval", "0"]).is_err());
    }
}
