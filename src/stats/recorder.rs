//! Process-wide request statistics.
//!
//! One [`StatsRecorder`] is created at startup and shared by handle with
//! every connection task. Counter and connection-map mutations go through a
//! single lock that is never held across I/O; log writes happen after the
//! lock is released.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::stats::log_sink::LogSink;

#[derive(Debug, Default)]
struct StatsState {
    total_requests: u64,
    active_connections: BTreeMap<String, DateTime<Local>>,
}

/// A point-in-time copy of the server statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub started_at: DateTime<Local>,
    pub uptime: Duration,
    /// Client address → when its connection was accepted
    pub active_connections: BTreeMap<String, DateTime<Local>>,
}

impl StatsSnapshot {
    pub fn active_count(&self) -> usize {
        self.active_connections.len()
    }

    /// The summary line written by the periodic flush.
    pub fn summary_line(&self) -> String {
        format!(
            "STATS: Total Requests: {}, Active Connections: {}, Uptime {} seconds",
            self.total_requests,
            self.active_count(),
            self.uptime.as_secs()
        )
    }
}

#[derive(Debug)]
pub struct StatsRecorder {
    state: RwLock<StatsState>,
    started_at: DateTime<Local>,
    started: Instant,
    sink: LogSink,
}

impl StatsRecorder {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            state: RwLock::new(StatsState::default()),
            started_at: Local::now(),
            started: Instant::now(),
            sink: LogSink::new(log_path),
        }
    }

    pub fn log_path(&self) -> &Path {
        self.sink.path()
    }

    /// Appends a free-form message to the log.
    pub async fn log(&self, message: &str) {
        self.sink.append(message).await;
    }

    /// Counts a served request and logs it.
    pub async fn record_request(&self, client_addr: &str, request_line: &str, status: u16) {
        {
            let mut state = self.state.write().await;
            state.total_requests += 1;
        }

        tracing::info!(
            peer = %client_addr,
            request = %request_line,
            status,
            "Request served"
        );

        self.sink
            .append(&format!(
                "REQUEST from {}: '{}' responded with {}",
                client_addr, request_line, status
            ))
            .await;
    }

    pub async fn record_error(&self, message: &str) {
        tracing::warn!(error = %message, "Recorded error");
        self.sink.append(&format!("ERROR: {}", message)).await;
    }

    pub async fn connection_opened(&self, client_addr: &str) {
        let mut state = self.state.write().await;
        state
            .active_connections
            .insert(client_addr.to_string(), Local::now());
    }

    pub async fn connection_closed(&self, client_addr: &str) {
        let mut state = self.state.write().await;
        state.active_connections.remove(client_addr);
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let state = self.state.read().await;

        StatsSnapshot {
            total_requests: state.total_requests,
            started_at: self.started_at,
            uptime: self.started.elapsed(),
            active_connections: state.active_connections.clone(),
        }
    }

    /// Writes one `STATS:` summary line to the log.
    pub async fn flush_stats(&self) {
        let line = self.snapshot().await.summary_line();
        tracing::debug!(summary = %line, "Periodic stats");
        self.sink.append(&line).await;
    }

    /// Starts a background task that calls [`StatsRecorder::flush_stats`]
    /// every `interval`, first after one full interval has passed.
    pub fn spawn_periodic_flush(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let stats = Arc::clone(self);

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                stats.flush_stats().await;
            }
        })
    }

    /// The last `n` log lines. A log that cannot be read yields a single
    /// explanatory line rather than an error.
    pub async fn tail(&self, n: usize) -> Vec<String> {
        match self.sink.tail(n).await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read log file");
                vec!["Error reading log file.".to_string()]
            }
        }
    }
}
