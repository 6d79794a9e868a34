use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use warden::admin::AdminServer;
use warden::config::Config;
use warden::http::connection::ConnectionContext;
use warden::server;
use warden::static_files::StaticSite;
use warden::stats::StatsRecorder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load(Config::path_from_args(std::env::args().skip(1)))?;
    tracing::info!(
        address = %cfg.address(),
        admin = %cfg.admin_address(),
        root = %cfg.document_root.display(),
        max_connections = cfg.max_threads,
        "Configuration loaded"
    );

    let stats = Arc::new(StatsRecorder::new(&cfg.log_file));
    stats.log("Server starting").await;
    let _flush = stats.spawn_periodic_flush(cfg.stats_interval());

    let site = StaticSite::new(&cfg.document_root).with_context(|| {
        format!("invalid document root {}", cfg.document_root.display())
    })?;

    let ctx = Arc::new(ConnectionContext {
        site,
        stats: Arc::clone(&stats),
        read_timeout: cfg.read_timeout(),
        write_timeout: cfg.write_timeout(),
        server_name: cfg.server_name.clone(),
    });

    let admin = Arc::new(AdminServer::new(&cfg, Arc::clone(&stats)));
    let admin_addr = cfg.admin_address();

    tokio::select! {
        res = server::listener::run(&cfg, ctx) => {
            res?;
        }

        res = admin.run(&admin_addr) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            stats.log("Server shutting down").await;
        }
    }

    Ok(())
}
