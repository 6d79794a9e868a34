use std::sync::Arc;
use std::time::Duration;
use warden::stats::{LogSink, StatsRecorder};

fn recorder() -> (tempfile::TempDir, Arc<StatsRecorder>) {
    let dir = tempfile::tempdir().unwrap();
    let stats = Arc::new(StatsRecorder::new(dir.path().join("server.log")));
    (dir, stats)
}

fn log_lines(stats: &StatsRecorder) -> Vec<String> {
    std::fs::read_to_string(stats.log_path())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn assert_timestamped(line: &str) {
    // [YYYY-MM-DD HH:MM:SS] message
    assert_eq!(&line[0..1], "[");
    assert_eq!(&line[20..22], "] ");
    assert!(chrono::NaiveDateTime::parse_from_str(&line[1..20], "%Y-%m-%d %H:%M:%S").is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_requests_are_all_counted() {
    const N: usize = 1000;
    let (_dir, stats) = recorder();

    let tasks: Vec<_> = (0..N)
        .map(|i| {
            let stats = Arc::clone(&stats);
            tokio::spawn(async move {
                let addr = format!("10.0.{}.{}:{}", i / 256, i % 256, 40000 + i);
                stats.connection_opened(&addr).await;
                stats
                    .record_request(&addr, &format!("GET /{} HTTP/1.1", i), 200)
                    .await;
                stats.connection_closed(&addr).await;
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let snapshot = stats.snapshot().await;
    assert_eq!(snapshot.total_requests, N as u64);
    assert_eq!(snapshot.active_count(), 0);

    let lines = log_lines(&stats);
    assert_eq!(lines.len(), N);
    for line in &lines {
        assert_timestamped(line);
        assert!(line.contains("REQUEST from 10.0."));
        assert!(line.ends_with("responded with 200"));
    }
}

#[tokio::test]
async fn test_request_log_format() {
    let (_dir, stats) = recorder();

    stats
        .record_request("127.0.0.1:5555", "GET /index.html HTTP/1.1", 404)
        .await;
    stats.record_error("disk on fire").await;
    stats.log("Server started on 127.0.0.1:8080").await;

    let lines = log_lines(&stats);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(
        "] REQUEST from 127.0.0.1:5555: 'GET /index.html HTTP/1.1' responded with 404"
    ));
    assert!(lines[1].ends_with("] ERROR: disk on fire"));
    assert!(lines[2].ends_with("] Server started on 127.0.0.1:8080"));
    lines.iter().for_each(|l| assert_timestamped(l));
}

#[tokio::test]
async fn test_errors_do_not_count_as_requests() {
    let (_dir, stats) = recorder();

    stats.record_error("boom").await;

    assert_eq!(stats.snapshot().await.total_requests, 0);
}

#[tokio::test]
async fn test_active_connections_tracking() {
    let (_dir, stats) = recorder();

    stats.connection_opened("1.1.1.1:1").await;
    stats.connection_opened("2.2.2.2:2").await;
    let during = stats.snapshot().await;
    stats.connection_closed("1.1.1.1:1").await;
    let after = stats.snapshot().await;

    assert_eq!(during.active_count(), 2);
    assert!(during.active_connections.contains_key("1.1.1.1:1"));
    assert_eq!(after.active_count(), 1);
    assert!(after.active_connections.contains_key("2.2.2.2:2"));
}

#[tokio::test]
async fn test_snapshot_is_a_copy() {
    let (_dir, stats) = recorder();

    let before = stats.snapshot().await;
    stats.record_request("a:1", "GET / HTTP/1.1", 200).await;
    stats.connection_opened("a:1").await;

    assert_eq!(before.total_requests, 0);
    assert!(before.active_connections.is_empty());
    assert_eq!(stats.snapshot().await.started_at, before.started_at);
}

#[tokio::test]
async fn test_flush_stats_summary_line() {
    let (_dir, stats) = recorder();

    stats.record_request("a:1", "GET / HTTP/1.1", 200).await;
    stats.record_request("a:1", "GET / HTTP/1.1", 200).await;
    stats.connection_opened("b:2").await;
    stats.flush_stats().await;

    let lines = log_lines(&stats);
    let last = lines.last().unwrap();
    assert!(last.contains("] STATS: Total Requests: 2, Active Connections: 1, Uptime "));
    assert!(last.ends_with(" seconds"));
}

#[tokio::test]
async fn test_periodic_flush_writes_summaries() {
    let (_dir, stats) = recorder();

    let handle = stats.spawn_periodic_flush(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(230)).await;
    handle.abort();

    let summaries = log_lines(&stats)
        .into_iter()
        .filter(|l| l.contains("STATS: "))
        .count();
    assert!(summaries >= 2, "expected at least two summaries, got {}", summaries);
}

#[tokio::test]
async fn test_log_failure_does_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened for appending.
    let stats = StatsRecorder::new(dir.path());

    stats.record_request("a:1", "GET / HTTP/1.1", 200).await;
    stats.record_error("still fine").await;

    assert_eq!(stats.snapshot().await.total_requests, 1);
    assert_eq!(stats.tail(10).await, vec!["Error reading log file.".to_string()]);
}

#[tokio::test]
async fn test_tail_returns_last_lines_in_order() {
    let (_dir, stats) = recorder();

    for i in 0..15 {
        stats.log(&format!("line {}", i)).await;
    }

    let tail = stats.tail(10).await;
    assert_eq!(tail.len(), 10);
    assert!(tail[0].ends_with("line 5"));
    assert!(tail[9].ends_with("line 14"));
}

#[tokio::test]
async fn test_tail_of_short_log() {
    let dir = tempfile::tempdir().unwrap();
    let sink = LogSink::new(dir.path().join("short.log"));

    sink.append("only").await;

    let tail = sink.tail(10).await.unwrap();
    assert_eq!(tail.len(), 1);
    assert!(tail[0].ends_with("] only"));
}

#[test]
fn test_format_entry_shape() {
    let entry = LogSink::format_entry("hello");

    assert!(entry.ends_with("] hello\n"));
    assert_timestamped(&entry);
}
