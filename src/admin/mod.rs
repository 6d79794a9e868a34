//! Administrative status page.
//!
//! Served on its own port, behind HTTP Basic authentication. It only reads
//! from the [`StatsRecorder`]; nothing here mutates server state.

pub mod auth;
pub mod page;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;

use crate::config::Config;
use crate::http::parser::RequestReader;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::server::listener;
use crate::stats::StatsRecorder;

pub use auth::Credentials;

pub struct AdminServer {
    credentials: Credentials,
    stats: Arc<StatsRecorder>,
    server_name: String,
    io_timeout: Duration,
}

impl AdminServer {
    pub fn new(cfg: &Config, stats: Arc<StatsRecorder>) -> Self {
        Self {
            credentials: Credentials::new(&cfg.admin_username, &cfg.admin_password),
            stats,
            server_name: cfg.server_name.clone(),
            io_timeout: cfg.read_timeout(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub async fn run(self: Arc<Self>, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind admin interface on {}", addr))?;

        tracing::info!("Admin interface listening on {}", addr);
        self.serve(listener).await
    }

    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        loop {
            let (socket, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    listener::accept_failed(&self.stats, "admin connection", &e).await;
                    continue;
                }
            };

            let admin = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = admin.handle(socket).await {
                    tracing::warn!("Admin connection error from {}: {}", peer, e);
                }
            });
        }
    }

    /// Answers one admin request on `stream`, then closes it.
    pub async fn handle<S>(&self, stream: S) -> anyhow::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut reader = RequestReader::new(stream);

        let response = match timeout(self.io_timeout, reader.read_request()).await {
            Ok(Ok(request)) => self.respond(request.header("Authorization")).await,
            Ok(Err(e)) if e.is_protocol_error() => Response::bad_request(),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => anyhow::bail!("timed out reading admin request"),
        };

        let response = response.with_standard_headers(&self.server_name);
        let mut stream = reader.into_inner();
        let mut writer = ResponseWriter::new(&response);

        timeout(self.io_timeout, writer.write_to_stream(&mut stream))
            .await
            .context("timed out writing admin response")??;

        let _ = stream.shutdown().await;
        Ok(())
    }

    /// The page for a request carrying `authorization`, or a 401 challenge.
    pub async fn respond(&self, authorization: Option<&str>) -> Response {
        if !self.credentials.verify(authorization) {
            let mut response = Response::error(StatusCode::Unauthorized);
            response
                .headers
                .insert("WWW-Authenticate".to_string(), Credentials::challenge());
            return response;
        }

        let snapshot = self.stats.snapshot().await;
        let log_lines = self.stats.tail(page::LOG_TAIL_LINES).await;
        Response::ok("text/html", page::render(&snapshot, &log_lines).into_bytes())
    }
}
