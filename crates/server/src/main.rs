use anyhow::{Context, Result};
use loandesk_core::HttpApplicationsApi;
use loandesk_server::{AppState, Config, ConsoleRegistry};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with INFO level by default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if std::env::args().nth(1).as_deref() == Some("--example-config") {
        print!("{}", Config::example()?);
        return Ok(());
    }

    // Load configuration
    let config = Config::load_default()?;

    tracing::info!("LoanDesk server starting...");
    tracing::info!("List endpoint: {}", config.api.list_url);
    tracing::info!("Session store: {:?}", config.admin.session_store);

    let secret = config.admin.secret()?;
    let api = HttpApplicationsApi::new(config.api.clone())
        .context("Failed to build HTTP client")?;
    let mut state = AppState::new(Arc::new(api), secret, config.admin.session_store());
    state.consoles = ConsoleRegistry::with_idle_timeout(config.admin.idle_timeout());
    let app = loandesk_server::router(state);

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    tracing::info!("LoanDesk ready on http://{}", bind_addr);
    tracing::info!(
        "Landing page: http://localhost:{}/, admin: http://localhost:{}/admin",
        config.server.port,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
