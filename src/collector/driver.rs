//! The collection cycle and the loop that repeats it.

use crate::collector::traits::{RecordSink, SnapshotSource};
use crate::error::{PvsError, Result};
use crate::line;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Outcome of one successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Variables in the fetched snapshot
    pub variables: usize,
    /// Records built from the snapshot
    pub records: usize,
    /// Lines accepted by the sink
    pub written: usize,
}

/// Totals for a continuous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub failures: u64,
}

/// Drives authenticate → fetch → build → write against a source and a sink.
pub struct Collector<S, W> {
    source: S,
    sink: W,
}

impl<S, W> Collector<S, W>
where
    S: SnapshotSource,
    W: RecordSink,
{
    pub fn new(source: S, sink: W) -> Self {
        Self { source, sink }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Run a single collection cycle. Any failure abandons the cycle.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        info!("Starting PVS6 data collection...");

        self.source.authenticate().await?;

        let snapshot = self.source.fetch_all().await?;
        if snapshot.is_empty() {
            return Err(PvsError::fetch_error("device returned an empty snapshot"));
        }

        let records = line::build(&snapshot, chrono::Utc::now().timestamp());
        let written = self.sink.write(&records).await?;

        info!("Data collection completed - {} lines written", written);
        Ok(CycleReport {
            variables: snapshot.len(),
            records: records.len(),
            written,
        })
    }

    /// Repeat [`run_once`](Self::run_once) every `interval` until `shutdown`
    /// resolves. Failed cycles are logged and the loop carries on after the
    /// usual sleep. Shutdown is honoured mid-cycle as well as mid-sleep.
    pub async fn run_continuous<F>(&mut self, interval: Duration, shutdown: F) -> LoopSummary
    where
        F: Future,
    {
        info!(
            "Starting continuous data collection (interval: {}s)",
            interval.as_secs()
        );

        let mut summary = LoopSummary::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.run_once() => {
                    summary.cycles += 1;
                    if let Err(e) = result {
                        summary.failures += 1;
                        error!("Collection cycle failed: {}", e);
                    }
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(
            "Stopping data collection after {} cycles ({} failed)",
            summary.cycles, summary.failures
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::line::Record;
    use crate::pvs::Snapshot;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CallLog(Arc<Mutex<Vec<&'static str>>>);

    impl CallLog {
        fn push(&self, call: &'static str) {
            self.0.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    struct FakeSource {
        log: CallLog,
        auth_ok: bool,
        snapshot: Snapshot,
    }

    impl SnapshotSource for FakeSource {
        async fn authenticate(&mut self) -> Result<()> {
            self.log.push("authenticate");
            if self.auth_ok {
                Ok(())
            } else {
                Err(AuthError::NoSerial.into())
            }
        }

        async fn fetch_all(&mut self) -> Result<Snapshot> {
            self.log.push("fetch_all");
            Ok(self.snapshot.clone())
        }
    }

    struct FakeSink {
        log: CallLog,
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl RecordSink for FakeSink {
        async fn write(&self, records: &[Record]) -> Result<usize> {
            self.log.push("write");
            let mut lines = self.lines.lock().unwrap();
            lines.extend(records.iter().map(Record::to_line));
            Ok(records.len())
        }
    }

    fn collector(auth_ok: bool, snapshot: Snapshot) -> (Collector<FakeSource, FakeSink>, CallLog) {
        let log = CallLog::default();
        let source = FakeSource {
            log: log.clone(),
            auth_ok,
            snapshot,
        };
        let sink = FakeSink {
            log: log.clone(),
            lines: Arc::default(),
        };
        (Collector::new(source, sink), log)
    }

    fn small_snapshot() -> Snapshot {
        [
            ("/sys/info/serialnum", "ZT1"),
            ("/sys/info/model", "PVS6"),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_run_once_success() {
        let (mut collector, log) = collector(true, small_snapshot());
        let report = collector.run_once().await.unwrap();

        assert_eq!(log.calls(), vec!["authenticate", "fetch_all", "write"]);
        assert_eq!(report.variables, 2);
        assert_eq!(report.records, report.written);
        assert_eq!(
            collector.sink().lines.lock().unwrap().len(),
            report.written
        );
    }

    #[tokio::test]
    async fn test_auth_failure_stops_cycle() {
        let (mut collector, log) = collector(false, small_snapshot());
        let result = collector.run_once().await;

        assert!(matches!(result, Err(PvsError::Auth(AuthError::NoSerial))));
        assert_eq!(log.calls(), vec!["authenticate"]);
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_a_failure() {
        let (mut collector, log) = collector(true, Snapshot::default());
        let result = collector.run_once().await;

        assert!(matches!(result, Err(PvsError::Fetch(_))));
        assert_eq!(log.calls(), vec!["authenticate", "fetch_all"]);
    }

    #[tokio::test]
    async fn test_continuous_survives_failures() {
        let (mut collector, log) = collector(false, small_snapshot());
        let summary = collector
            .run_continuous(
                Duration::from_millis(5),
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await;

        assert!(summary.cycles >= 2, "only {} cycles ran", summary.cycles);
        assert_eq!(summary.failures, summary.cycles);
        assert!(log.calls().iter().all(|call| *call == "authenticate"));
    }

    #[tokio::test]
    async fn test_continuous_stops_on_ready_shutdown() {
        let (mut collector, log) = collector(true, small_snapshot());
        let summary = collector
            .run_continuous(Duration::from_secs(60), std::future::ready(()))
            .await;

        assert_eq!(summary, LoopSummary::default());
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_continuous_stops_during_sleep() {
        let (mut collector, _log) = collector(true, small_snapshot());
        let started = std::time::Instant::now();
        let summary = collector
            .run_continuous(
                Duration::from_secs(3600),
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await;

        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.failures, 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
