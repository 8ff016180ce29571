//! Titrate HTTP server entrypoint.

use std::net::SocketAddr;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use titrate::{
    CachingEmbedder, Config, DedupConfig, EmbedderBackend, MemoryStore, QuestionDeduplicator,
    QuestionStore, ReviewWorkflow, SqliteStore,
};
use titrate_server::gateway::{HandlerState, create_router_with_state};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        pool_size = config.recent_pool_size,
        "Titrate starting"
    );

    match config.database_path.clone() {
        Some(path) => {
            let store = SqliteStore::open(&path)?;
            serve(&config, store, addr).await
        }
        None => {
            tracing::warn!("No TITRATE_DATABASE_PATH configured, cache will not survive restarts");
            serve(&config, MemoryStore::new(), addr).await
        }
    }
}

async fn serve<S>(config: &Config, store: S, addr: SocketAddr) -> anyhow::Result<()>
where
    S: QuestionStore + 'static,
{
    let embedder = CachingEmbedder::new(
        EmbedderBackend::from_config(config)?,
        config.embedding_cache_capacity,
    );
    let engine = QuestionDeduplicator::new(embedder, store, DedupConfig::from_config(config));

    let mut workflow = ReviewWorkflow::new(std::sync::Arc::new(engine));
    if let Some(dir) = &config.assets_dir {
        workflow = workflow.with_assets_dir(dir);
    }

    let app = create_router_with_state(HandlerState::new(workflow));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Titrate shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("TITRATE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
