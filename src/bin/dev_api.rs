use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commission_console::{
    config::{ApiConfig, DevServerConfig}, dev_server::router, services::InMemoryService,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let config = DevServerConfig::from_env().expect("invalid BIND_ADDR, expected host:port");
    let app = router(InMemoryService::new_with_sample());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("failed to bind HTTP listener");
    info!("development API listening on http://{}/api", config.bind_addr);
    info!(api_base = %ApiConfig::from_env().base_url, "frontend builds should point API_BASE here");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server crashed");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    }
    info!("shutting down");
}
