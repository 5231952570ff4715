//! Wallpost binary.
//!
//! Wires the worker pool, keep-alive prober, and resource-key cache together
//! around an in-memory store and runs until interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use wallpost::{init_observability, Settings};
use wallpost_client::HttpPublishClient;
use wallpost_interface::{
    EmptySessionProvider, MemoryStore, NoopRenderer, PublishClient, SessionProvider,
    SessionRefresh,
};
use wallpost_rkey::{mask_key, ResourceKeyCache};
use wallpost_session::{acquire_initial_credential, KeepAlive, SessionRefresher};
use wallpost_worker::WorkerPool;

/// Stand-in credential used when no startup source yields one; the
/// keep-alive prober replaces it as soon as a live session appears.
const PLACEHOLDER_CREDENTIAL: &str = "uin=o0;skey=@placeholder;p_skey=placeholder";

#[derive(Parser, Debug)]
#[command(author, version, about = "Moderated submission publishing pipeline", long_about = None)]
struct Args {
    /// Settings file; defaults to ./wallpost.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    if args.verbose {
        settings.log.level = "debug".to_string();
    }
    init_observability(&settings.log)?;

    info!(
        base_url = %settings.base_url,
        workers = settings.worker.workers,
        "starting wallpost"
    );

    // No chat-bot transport is wired into this binary; credential refresh
    // and resource-key reports come up empty until an adapter registers one.
    let sessions: Arc<dyn SessionProvider> = Arc::new(EmptySessionProvider);
    let store = Arc::new(MemoryStore::new());

    let credential =
        match acquire_initial_credential(&settings.session, sessions.as_ref(), None).await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "no startup credential, using placeholder until refresh");
                PLACEHOLDER_CREDENTIAL.to_string()
            }
        };

    let refresher: Arc<dyn SessionRefresh> = Arc::new(SessionRefresher::new(
        Arc::clone(&sessions),
        settings.session.cookie_file.clone(),
        settings.session.admin_channel,
    ));
    let client: Arc<dyn PublishClient> = Arc::new(HttpPublishClient::new(
        &settings.base_url,
        &credential,
        Some(refresher),
    )?);

    // Non-fatal startup validation; a stale credential is recovered by the
    // keep-alive prober or by the publish path's refresh-and-replay.
    match client.probe().await {
        Ok(()) => info!(uin = client.uin(), "startup probe succeeded"),
        Err(e) => warn!(error = %e, "startup probe failed, credential may be stale"),
    }

    let rkeys = Arc::new(ResourceKeyCache::new());
    match rkeys.refresh_from_bots(sessions.as_ref()) {
        Some(key) => info!(key = %mask_key(&key), "resource-key cache seeded"),
        None => info!("no resource keys available at startup"),
    }

    let mut pool = WorkerPool::new(
        settings.worker.clone(),
        settings.wall.clone(),
        Arc::clone(&client),
        store,
        Arc::new(NoopRenderer),
    )?;
    pool.start();

    let mut keep_alive = KeepAlive::new(
        settings.session.clone(),
        Arc::clone(&client),
        Arc::clone(&sessions),
    );
    keep_alive.start();

    wait_for_shutdown().await;
    info!("shutdown signal received, draining");

    pool.stop().await;
    keep_alive.stop().await;
    info!("wallpost stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
