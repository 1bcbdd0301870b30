use std::panic;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mirror_relay::config::Config;
use mirror_relay::routes::create_app;
use mirror_relay::AppState;

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mirror_relay=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting relay...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    let address = config.server_address();
    let app_state = Arc::new(AppState::new(config));
    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("Relay running on {}", address);
    info!("Authors connect to ws://{}/create", address);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
