use chrono::Utc;
use html_escape::encode_text;
use std::fmt::Write as _;

use crate::http::response::http_date;
use crate::stats::StatsSnapshot;

/// Number of log lines shown on the admin page.
pub const LOG_TAIL_LINES: usize = 10;

/// Seconds between automatic page reloads.
pub const REFRESH_SECS: u32 = 30;

/// Renders the admin page from a stats snapshot and the log tail.
pub fn render(snapshot: &StatsSnapshot, log_lines: &[String]) -> String {
    let mut html = String::from("<html><head><title>Admin Interface</title>");
    let _ = write!(html, "<meta http-equiv=\"refresh\" content=\"{}\">", REFRESH_SECS);
    html.push_str(
        "<style>body{font-family:Arial,sans-serif;margin:20px;}\
         table{border-collapse:collapse;}\
         th,td{padding:4px 12px;text-align:left;border-bottom:1px solid #ddd;}\
         th{background-color:#f2f2f2;}</style>",
    );
    html.push_str("</head><body><h1>Admin Interface</h1>");

    let _ = write!(
        html,
        "<p><strong>Total Requests:</strong> {}</p>\
         <p><strong>Server Uptime:</strong> {} seconds</p>",
        snapshot.total_requests,
        snapshot.uptime.as_secs()
    );

    html.push_str("<h2>Active Connections</h2>");
    if snapshot.active_connections.is_empty() {
        html.push_str("<p>No active connections.</p>");
    } else {
        html.push_str("<table><tr><th>Client</th><th>Connected Since</th></tr>");
        for (addr, since) in &snapshot.active_connections {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                encode_text(addr),
                http_date(since.with_timezone(&Utc))
            );
        }
        html.push_str("</table>");
    }

    let _ = write!(html, "<h2>Last {} Log Entries</h2><pre>", LOG_TAIL_LINES);
    for line in log_lines {
        html.push_str(&encode_text(line));
        html.push('\n');
    }
    html.push_str("</pre></body></html>");

    html
}
