use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionContext};
use crate::stats::StatsRecorder;

/// Pause after a failed accept, so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Binds the content listener and serves it until the task is dropped.
///
/// A bind failure is returned to the caller and is fatal.
pub async fn run(cfg: &Config, ctx: Arc<ConnectionContext>) -> anyhow::Result<()> {
    let addr = cfg.address();

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            ctx.stats
                .record_error(&format!("Failed to bind server on {}: {}", addr, e))
                .await;
            return Err(e).with_context(|| format!("failed to bind {}", addr));
        }
    };

    info!("Listening on {}", addr);
    ctx.stats.log(&format!("Server started on {}", addr)).await;

    serve(listener, ctx, cfg.max_threads).await
}

/// Accepts connections forever, one task per connection, with at most
/// `max_connections` tasks alive at a time.
///
/// The permit is taken before `accept`, so once the limit is reached new
/// clients queue in the listen backlog instead of being accepted and left
/// waiting.
pub async fn serve(
    listener: TcpListener,
    ctx: Arc<ConnectionContext>,
    max_connections: usize,
) -> anyhow::Result<()> {
    let limit = Arc::new(Semaphore::new(max_connections));

    loop {
        let permit = Arc::clone(&limit)
            .acquire_owned()
            .await
            .context("connection limiter closed")?;

        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                accept_failed(&ctx.stats, "connection", &e).await;
                continue;
            }
        };

        tracing::debug!("Accepted connection from {}", peer);

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let peer = peer.to_string();
            ctx.stats.connection_opened(&peer).await;

            let mut conn = Connection::new(socket, peer.clone(), Arc::clone(&ctx));
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }

            ctx.stats.connection_closed(&peer).await;
            drop(permit);
        });
    }
}

/// Records a failed `accept` on the `kind` listener and waits out
/// [`ACCEPT_BACKOFF`] before the caller retries.
pub async fn accept_failed(stats: &StatsRecorder, kind: &str, err: &std::io::Error) {
    tracing::error!(error = %err, "Accept failed on {} listener", kind);
    stats
        .record_error(&format!("Error accepting {}: {}", kind, err))
        .await;
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}
