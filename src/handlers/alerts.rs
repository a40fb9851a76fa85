use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::ApiResponse;
use crate::models::PriceAlert;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    pub tld: String,
    #[serde(flatten)]
    pub alert: PriceAlert,
}

#[derive(Debug, Serialize)]
pub struct AlertSweepResponse {
    pub dispatched: usize,
}

pub fn create_alert_routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", post(create_alert))
        .route("/alerts/check/:user_id", post(check_alerts))
}

/// POST /api/v1/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    Json(request): Json<CreateAlertRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .price_service
        .set_alert(&request.tld, request.alert)
        .await?;
    Ok(Json(ApiResponse::ok_with_message((), "Alert created")))
}

/// POST /api/v1/alerts/check/:user_id
pub async fn check_alerts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<AlertSweepResponse>> {
    let dispatched = state.price_service.check_alerts(&user_id).await;
    Json(ApiResponse::ok(AlertSweepResponse { dispatched }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_alert_request_wire_format() {
        let json = serde_json::json!({
            "tld": ".com",
            "type": "price_drop",
            "percentage": 5.0,
            "enabled": true,
            "notifyVia": ["in_app"]
        });

        let request: CreateAlertRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.tld, ".com");
        assert!(request.alert.enabled);
    }
}
