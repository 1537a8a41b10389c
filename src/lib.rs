pub mod api;
pub mod config;
pub mod core_state;
pub mod dialog;
pub mod lexicon;
pub mod pipeline;
pub mod session_store;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::{CoreState, StartupError};

/// Start the service and block until Ctrl-C.
///
/// The runtime is built here rather than with `#[tokio::main]`: the core
/// owns a blocking HTTP client that must be created and dropped outside
/// any async context.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let core = Arc::new(CoreState::from_config(&config)?);
    tracing::info!(
        model = core.model(),
        bind = %config.bind,
        session_idle_secs = config.session_idle.as_secs(),
        "Core ready"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(Arc::clone(&core), config.bind));
    drop(runtime);
    drop(core);
    result
}

async fn serve(core: Arc<CoreState>, bind: SocketAddr) -> Result<(), StartupError> {
    let sweeper = tokio::spawn(sweep_idle_sessions(Arc::clone(&core)));
    let server = api::start_api_server(core, bind).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }
    tracing::info!("Shutdown requested");

    sweeper.abort();
    server.stop().await;
    Ok(())
}

async fn sweep_idle_sessions(core: Arc<CoreState>) {
    let mut interval = tokio::time::interval(config::SESSION_SWEEP_INTERVAL);
    // First tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        if let Err(e) = core.evict_idle_sessions() {
            tracing::warn!("Idle session sweep failed: {e}");
        }
    }
}
