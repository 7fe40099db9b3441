//! Batch writer for the InfluxDB 1.x `/write` endpoint.

use crate::collector::traits::RecordSink;
use crate::config::SinkConfig;
use crate::error::{PvsError, Result};
use crate::line::validate::invalid_lines;
use crate::line::Record;
use crate::INFLUX_PRECISION;
use std::time::Duration;
use tracing::{debug, error, info};

/// How much of a failed payload is logged in verbose mode.
const PAYLOAD_PREVIEW_CHARS: usize = 500;

/// Writes validated line-protocol batches to InfluxDB.
pub struct InfluxWriter {
    config: SinkConfig,
    http: reqwest::Client,
}

impl InfluxWriter {
    pub fn new(config: SinkConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .build()
            .map_err(|e| PvsError::config_error(format!("failed to build InfluxDB client: {e}")))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Validate and send a batch of lines in a single POST.
    ///
    /// An empty batch is a no-op. If any line fails validation nothing is sent.
    pub async fn write_lines(&self, lines: &[String]) -> Result<usize> {
        if lines.is_empty() {
            return Ok(0);
        }

        let invalid = invalid_lines(lines);
        if !invalid.is_empty() {
            error!("Found {} invalid InfluxDB lines:", invalid.len());
            for bad in &invalid {
                error!("  Line {}: {}", bad.position, bad.line);
            }
            return Err(PvsError::Validation { invalid });
        }

        if self.config.verbose {
            for (i, line) in lines.iter().enumerate() {
                debug!("{:2}: {}", i + 1, line);
            }
            debug!("Total records: {}", lines.len());
        }

        let payload = lines.join("\n");
        match self.post(payload.clone(), None).await {
            Ok(()) => {
                info!("Successfully wrote {} lines to InfluxDB", lines.len());
                Ok(lines.len())
            }
            Err(err) => {
                if self.config.verbose {
                    let preview: String = payload.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
                    error!("Payload that failed: {}...", preview);
                }
                Err(err)
            }
        }
    }

    /// POST a raw body to the write endpoint. Any 2xx status is success;
    /// error responses are logged with their body.
    pub(crate) async fn post(&self, body: String, timeout: Option<Duration>) -> Result<()> {
        let mut request = self
            .http
            .post(&self.config.url)
            .query(&[
                ("db", self.config.database.as_str()),
                ("precision", INFLUX_PRECISION),
            ])
            .body(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            error!("Failed to write to InfluxDB: {}", e);
            PvsError::sink_error(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        error!("InfluxDB response status: {}", status.as_u16());
        error!("InfluxDB response text: {}", text);
        Err(PvsError::sink_status(status.as_u16(), text))
    }
}

impl RecordSink for InfluxWriter {
    async fn write(&self, records: &[Record]) -> Result<usize> {
        let lines: Vec<String> = records.iter().map(Record::to_line).collect();
        self.write_lines(&lines).await
    }
}
