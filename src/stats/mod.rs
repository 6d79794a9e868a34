//! Request statistics and the append-only event log.
//!
//! [`StatsRecorder`] is the only state shared between connection tasks.
//! The admin page reads it through [`StatsRecorder::snapshot`].

pub mod log_sink;
pub mod recorder;

pub use log_sink::LogSink;
pub use recorder::{StatsRecorder, StatsSnapshot};
