use crate::config::Config;
use crate::error::AppError;
use crate::handlers::{router, AppState};
use crate::shutdown;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Config(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and validate the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Bind the HTTP server and serve until a shutdown signal arrives
pub async fn start_server(config: Config) -> miette::Result<()> {
    let state = AppState::from_config(&config);
    let app = router(state, config.max_upload_bytes);

    let addr = config.bind_addr();
    info!("Calendar webhook: {}", config.webhook.url.host_str().unwrap_or("<none>"));
    info!("Chat model: {}", config.chat.model);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::from)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(AppError::from)?;

    info!("Server shut down");
    Ok(())
}
