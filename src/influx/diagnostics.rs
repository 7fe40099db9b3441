//! Connectivity self-tests for the InfluxDB sink.
//!
//! None of these run as part of a collection cycle; they back the
//! `--test-*` command line flags.

use crate::error::{PvsError, Result};
use crate::influx::writer::InfluxWriter;
use crate::line::{self, FieldValue, Record};
use crate::pvs::Snapshot;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

const DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    series: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Database names from a `SHOW DATABASES` response body.
fn database_names(response: QueryResponse) -> Vec<String> {
    response
        .results
        .into_iter()
        .next()
        .map(|result| {
            result
                .series
                .into_iter()
                .flat_map(|series| series.values)
                .filter_map(|row| row.first().and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// A small, representative snapshot as reported by a PVS6 with one meter and
/// one inverter.
pub fn sample_snapshot() -> Snapshot {
    [
        ("/sys/info/serialnum", "ZT231385000549F1084"),
        ("/sys/info/model", "PVS6"),
        ("/sys/info/active_interface", "sta0"),
        ("/sys/info/ssid", "SunPower13084"),
        ("/sys/toggle_cell/broadband_connected", "1"),
        ("/sys/toggle_cell/cell_connected", "0"),
        ("/net/sta0/state", "online"),
        ("/sys/devices/meter/0/sn", "PVS6M23131084p"),
        ("/sys/devices/meter/0/prodMdlNm", "PVS6M0400p"),
        ("/sys/devices/meter/0/ctSclFctr", "50"),
        ("/sys/devices/meter/0/freqHz", "59.992973"),
        ("/sys/devices/meter/0/p3phsumKw", "0.013776"),
        ("/sys/devices/inverter/0/sn", "E00122150014918"),
        ("/sys/devices/inverter/0/prodMdlNm", "AC_Module_Type_H"),
        ("/sys/devices/inverter/0/freqHz", "59.980000"),
        ("/sys/devices/inverter/0/p3phsumKw", "0.000265"),
    ]
    .into_iter()
    .collect()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl InfluxWriter {
    /// Ping the server, make sure the database exists (creating it if needed)
    /// and write one test record.
    pub async fn test_connection(&self) -> Result<()> {
        info!("Testing InfluxDB connection...");

        let ping = self
            .http()
            .get(self.config().ping_url())
            .timeout(DIAGNOSTIC_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!("✗ Cannot connect to InfluxDB: {}", e);
                PvsError::diagnostic_error(format!("cannot connect to InfluxDB: {e}"))
            })?;
        if ping.status() != StatusCode::NO_CONTENT {
            error!("✗ InfluxDB ping failed: {}", ping.status().as_u16());
            return Err(PvsError::diagnostic_error(format!(
                "ping returned status {}",
                ping.status().as_u16()
            )));
        }
        info!("✓ InfluxDB is running");

        self.ensure_database().await?;

        let record = Record::new("test_measurement", now())
            .with_field("test_field", Some(FieldValue::Integer(1)));
        self.post(record.to_line(), Some(DIAGNOSTIC_TIMEOUT))
            .await
            .map_err(|e| {
                error!("✗ InfluxDB write test failed: {}", e);
                PvsError::diagnostic_error(format!("write test failed: {e}"))
            })?;
        info!("✓ InfluxDB write test successful");
        Ok(())
    }

    async fn ensure_database(&self) -> Result<()> {
        let database = &self.config().database;
        let query_url = self.config().query_url();

        let response = self
            .http()
            .get(&query_url)
            .query(&[("q", "SHOW DATABASES")])
            .timeout(DIAGNOSTIC_TIMEOUT)
            .send()
            .await
            .map_err(|e| PvsError::diagnostic_error(format!("database check failed: {e}")))?;
        if response.status() != StatusCode::OK {
            error!("✗ Failed to query databases: {}", response.status().as_u16());
            return Err(PvsError::diagnostic_error(format!(
                "SHOW DATABASES returned status {}",
                response.status().as_u16()
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| PvsError::diagnostic_error(format!("invalid query response: {e}")))?;
        if database_names(body).iter().any(|name| name == database) {
            info!("✓ Database '{}' exists", database);
            return Ok(());
        }

        warn!("Database '{}' does not exist, creating...", database);
        let create = self
            .http()
            .post(&query_url)
            .query(&[("q", format!("CREATE DATABASE {database}"))])
            .timeout(DIAGNOSTIC_TIMEOUT)
            .send()
            .await
            .map_err(|e| PvsError::diagnostic_error(format!("database create failed: {e}")))?;
        if create.status() != StatusCode::OK {
            let text = create.text().await.unwrap_or_default();
            error!("✗ Failed to create database: {}", text);
            return Err(PvsError::diagnostic_error(format!(
                "CREATE DATABASE failed: {text}"
            )));
        }
        info!("✓ Database '{}' created", database);
        Ok(())
    }

    /// Write a single hand-built record with a numeric and a string field.
    pub async fn test_single_line(&self) -> Result<()> {
        info!("Testing single InfluxDB line...");

        let record = Record::new("pvs_test_measurement", now())
            .with_field("test_field", Some(FieldValue::Integer(1)))
            .with_field("test_string", FieldValue::text("hello"));
        let line = record.to_line();
        info!("Test line: {}", line);

        self.post(line, Some(DIAGNOSTIC_TIMEOUT)).await.map_err(|e| {
            error!("✗ Single line test failed: {}", e);
            PvsError::diagnostic_error(format!("single line test failed: {e}"))
        })?;
        info!("✓ Single line test successful");
        Ok(())
    }

    /// Build records from [`sample_snapshot`] and write them one at a time,
    /// stopping at the first rejected line.
    pub async fn test_real_data(&self) -> Result<()> {
        info!("Testing with real PVS data format...");

        let records = line::build(&sample_snapshot(), now());
        info!("Generated {} lines from sample data", records.len());

        for (i, record) in records.iter().enumerate() {
            let line = record.to_line();
            let preview: String = line.chars().take(100).collect();
            info!("Testing line {}: {}...", i + 1, preview);

            if let Err(e) = self.post(line.clone(), Some(DIAGNOSTIC_TIMEOUT)).await {
                error!("✗ Line {} failed: {}", i + 1, e);
                error!("Line: {}", line);
                return Err(PvsError::diagnostic_error(format!("line {} failed: {e}", i + 1)));
            }
            info!("✓ Line {} successful", i + 1);
        }

        info!("✓ All real data lines successful");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_names() {
        let body = json!({
            "results": [{
                "statement_id": 0,
                "series": [{
                    "name": "databases",
                    "columns": ["name"],
                    "values": [["_internal"], ["pvs6_detail"]]
                }]
            }]
        });
        let response: QueryResponse = serde_json::from_value(body).unwrap();
        assert_eq!(database_names(response), vec!["_internal", "pvs6_detail"]);
    }

    #[test]
    fn test_database_names_empty_response() {
        let response: QueryResponse =
            serde_json::from_value(json!({"results": [{"statement_id": 0}]})).unwrap();
        assert!(database_names(response).is_empty());

        let response: QueryResponse = serde_json::from_value(json!({})).unwrap();
        assert!(database_names(response).is_empty());
    }

    #[test]
    fn test_query_response_rejects_non_object() {
        assert!(serde_json::from_value::<QueryResponse>(json!("garbage")).is_err());
    }

    #[test]
    fn test_sample_snapshot_builds_production_meter() {
        let records = line::build(&sample_snapshot(), 1_700_000_000);
        let meters: Vec<&Record> = records
            .iter()
            .filter(|r| r.measurement == "pvs_power_meter")
            .collect();
        assert_eq!(meters.len(), 1);
        assert_eq!(meters[0].tag("mode"), Some("production"));
        assert!(meters[0].to_line().contains("p_3phsum_kw=0.013776"));
    }
}
