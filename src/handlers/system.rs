use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::handlers::ApiResponse;
use crate::models::{ErrorRecord, ErrorSeverity, HealthStatus, MetricsSnapshot};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ErrorsQuery {
    pub severity: Option<ErrorSeverity>,
}

pub fn create_system_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/errors", get(recent_errors))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.monitoring_service.health_status())
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Json<ApiResponse<MetricsSnapshot>> {
    Json(ApiResponse::ok(state.monitoring_service.metrics()))
}

/// GET /errors?severity=<low|medium|high|critical>
pub async fn recent_errors(
    State(state): State<AppState>,
    Query(query): Query<ErrorsQuery>,
) -> Json<ApiResponse<Vec<ErrorRecord>>> {
    let errors = state.monitoring_service.recent_errors(query.severity);
    Json(ApiResponse::ok(errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApiSettings, MonitoringSettings, NotificationSettings, Settings, UpstreamSettings,
    };
    use crate::models::ServiceStatus;

    fn state() -> AppState {
        let settings = Settings {
            api: ApiSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            upstream: UpstreamSettings {
                base_url: "http://127.0.0.1:9".to_string(),
                timeout_seconds: 1,
                cache_ttl_seconds: 3600,
                rate_limit_retry_seconds: 0,
            },
            monitoring: MonitoringSettings {
                aggregation_interval_seconds: 60,
                refresh_interval_seconds: 300,
                version: "test".to_string(),
            },
            notifications: NotificationSettings {
                default_user: "default".to_string(),
            },
        };
        AppState::new(settings).unwrap()
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health(State(state())).await.0;
        assert_eq!(response.status, ServiceStatus::Healthy);
        assert_eq!(response.version, "test");
    }

    #[tokio::test]
    async fn test_metrics_handler_defaults() {
        let response = metrics(State(state())).await;
        let snapshot = response.0.data.unwrap();
        assert_eq!(snapshot.api_calls, 0);
    }
}
