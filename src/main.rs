use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tld_price_monitor::{config::Settings, handlers, AppState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting TLD Price Monitor");

    // Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded successfully");

    // Build shared services
    let state = AppState::new(settings.clone())?;

    // Recompute the metrics snapshot on a fixed interval
    let aggregator_handle = std::sync::Arc::clone(&state.monitoring_service).spawn_aggregator();

    // Periodic price refresh and alert sweep
    let sweep_handle = {
        let state = state.clone();
        tokio::spawn(async move {
            run_alert_sweep(state).await;
        })
    };

    // Start the web server
    let server_handle = {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = start_web_server(state).await {
                error!("Web server error: {}", e);
            }
        })
    };

    info!(
        "TLD Price Monitor started, API server on {}:{}",
        settings.api.host, settings.api.port
    );

    tokio::select! {
        _ = aggregator_handle => {
            error!("Metrics aggregator stopped unexpectedly");
        }
        _ = sweep_handle => {
            error!("Alert sweep stopped unexpectedly");
        }
        _ = server_handle => {
            error!("Web server stopped unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down TLD Price Monitor");
    Ok(())
}

/// Refresh the price cache and evaluate configured alerts on a fixed interval.
async fn run_alert_sweep(state: AppState) {
    let mut interval = tokio::time::interval(Duration::from_secs(
        state.settings.monitoring.refresh_interval_seconds,
    ));
    // The first tick fires immediately; skip it so startup is not a sweep.
    interval.tick().await;

    loop {
        interval.tick().await;

        let changes = state.price_service.get_price_changes().await;
        info!(count = changes.len(), "Refreshed price data");

        let dispatched = state
            .price_service
            .check_alerts(&state.settings.notifications.default_user)
            .await;
        if dispatched > 0 {
            info!(dispatched, "Background sweep dispatched alerts");
        }
    }
}

async fn start_web_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let api = handlers::create_price_routes()
        .merge(handlers::create_alert_routes())
        .merge(handlers::create_notification_routes());

    let app = Router::new()
        .merge(handlers::create_system_routes())
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let addr: SocketAddr =
        format!("{}:{}", state.settings.api.host, state.settings.api.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API endpoints available at:");
    info!("  GET    /health - Service health");
    info!("  GET    /metrics - Last metrics snapshot");
    info!("  GET    /errors - Recent error records");
    info!("  GET    /api/v1/price-changes - List price changes");
    info!("  GET    /api/v1/search?tld=<q> - Search TLDs");
    info!("  GET    /api/v1/history/<tld> - Price history");
    info!("  GET    /api/v1/analytics/<tld> - Price analytics");
    info!("  GET    /api/v1/chart/<tld> - Chart data");
    info!("  POST   /api/v1/compare - Compare current prices");
    info!("  POST   /api/v1/alerts - Create price alert");
    info!("  POST   /api/v1/alerts/check/<user> - Evaluate alerts");
    info!("  GET    /api/v1/users/<user>/preferences - Notification preferences");
    info!("  GET    /api/v1/notifications - Pending notifications");

    axum::serve(listener, app).await?;
    Ok(())
}
