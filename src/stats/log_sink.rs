use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Timestamp format of every log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only text log, one `[timestamp] message` line per event.
///
/// Each line is written with a single `write_all` while holding the sink's
/// lock, so concurrent entries never interleave. The file is opened per
/// entry, which keeps working if the file is moved away underneath us.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Formats a log line for `message` stamped with the current local time.
    pub fn format_entry(message: &str) -> String {
        format!("[{}] {}\n", Local::now().format(TIMESTAMP_FORMAT), message)
    }

    /// Appends `message`. Failures go to the diagnostic log and are
    /// otherwise ignored.
    pub async fn append(&self, message: &str) {
        let entry = Self::format_entry(message);

        if let Err(e) = self.try_append(entry.as_bytes()).await {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to write log entry"
            );
        }
    }

    async fn try_append(&self, entry: &[u8]) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(entry).await?;
        file.flush().await
    }

    /// The last `n` lines of the log, oldest first.
    pub async fn tail(&self, n: usize) -> std::io::Result<Vec<String>> {
        let raw = tokio::fs::read(&self.path).await?;
        let text = String::from_utf8_lossy(&raw);
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(n);

        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}
