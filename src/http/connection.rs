use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout, timeout_at};

use crate::http::parser::{ParseError, RequestLine, RequestReader};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::static_files::StaticSite;
use crate::stats::StatsRecorder;

/// Everything a connection task needs besides its socket. Built once at
/// startup and shared read-only.
#[derive(Debug)]
pub struct ConnectionContext {
    pub site: StaticSite,
    pub stats: Arc<StatsRecorder>,
    /// Deadline for receiving the whole request head
    pub read_timeout: Duration,
    /// Deadline for writing the whole response
    pub write_timeout: Duration,
    pub server_name: String,
}

pub enum ConnectionState {
    AwaitingRequestLine,
    AwaitingHeaders(RequestLine),
    Resolving(Request),
    Responding(Pending),
    Closed,
}

/// A response waiting to be written, with what to record once it is.
pub struct Pending {
    response: Response,
    /// `None` when the request line itself could not be parsed
    request_line: Option<String>,
    error: Option<String>,
}

/// One client connection, driven from the request line to `Closed`.
///
/// States only move forward; every path ends in `Closed` and the stream is
/// shut down exactly once, when the state machine exits.
pub struct Connection<S> {
    reader: RequestReader<S>,
    peer: String,
    ctx: Arc<ConnectionContext>,
    state: ConnectionState,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>, ctx: Arc<ConnectionContext>) -> Self {
        Self {
            reader: RequestReader::new(stream),
            peer: peer.into(),
            ctx,
            state: ConnectionState::AwaitingRequestLine,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let deadline = Instant::now() + self.ctx.read_timeout;
        let mut result = Ok(());

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitingRequestLine => {
                    let read = timeout_at(deadline, self.reader.read_request_line()).await;

                    self.state = match flatten(read) {
                        Ok(line) => ConnectionState::AwaitingHeaders(line),
                        Err(e) => self.on_parse_error(e, None).await,
                    };
                }

                ConnectionState::AwaitingHeaders(line) => {
                    let read = timeout_at(deadline, self.reader.read_headers()).await;

                    self.state = match flatten(read) {
                        Ok(headers) => ConnectionState::Resolving(Request {
                            method: line.method,
                            path: line.target,
                            version: line.version,
                            headers,
                            request_line: line.raw,
                        }),
                        Err(e) => self.on_parse_error(e, Some(line.raw)).await,
                    };
                }

                ConnectionState::Resolving(request) => {
                    let served = self.ctx.site.serve(&request).await;

                    self.state = ConnectionState::Responding(Pending {
                        response: served.response,
                        request_line: Some(request.request_line),
                        error: served.error,
                    });
                }

                ConnectionState::Responding(pending) => {
                    result = self.respond(pending).await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }

        let _ = self.reader.get_mut().shutdown().await;
        result
    }

    async fn on_parse_error(&self, err: ParseError, request_line: Option<String>) -> ConnectionState {
        if err.is_protocol_error() {
            tracing::debug!(peer = %self.peer, error = %err, "Bad request");
            return ConnectionState::Responding(Pending {
                response: Response::bad_request(),
                request_line,
                error: None,
            });
        }

        match err {
            ParseError::Closed => {
                tracing::debug!(peer = %self.peer, "Client closed without sending a request");
            }
            other => {
                self.ctx
                    .stats
                    .record_error(&format!("Error reading request from {}: {}", self.peer, other))
                    .await;
            }
        }

        ConnectionState::Closed
    }

    async fn respond(&mut self, pending: Pending) -> anyhow::Result<()> {
        let response = pending.response.with_standard_headers(&self.ctx.server_name);
        let status = response.status.as_u16();
        let mut writer = ResponseWriter::new(&response);

        let written = match timeout(
            self.ctx.write_timeout,
            writer.write_to_stream(self.reader.get_mut()),
        )
        .await
        {
            Ok(res) => res,
            Err(_) => Err(anyhow::anyhow!("timed out writing response")),
        };

        if let Some(error) = &pending.error {
            self.ctx.stats.record_error(error).await;
        }

        if let Some(line) = &pending.request_line {
            self.ctx.stats.record_request(&self.peer, line, status).await;
        }

        if let Err(e) = &written {
            self.ctx
                .stats
                .record_error(&format!("Error writing response to {}: {}", self.peer, e))
                .await;
        }

        written
    }
}

fn flatten<T>(
    read: Result<Result<T, ParseError>, tokio::time::error::Elapsed>,
) -> Result<T, ParseError> {
    read.unwrap_or(Err(ParseError::Timeout))
}
