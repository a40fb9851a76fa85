use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::ApiResponse;
use crate::models::{NotificationPayload, NotificationPreferences};
use crate::AppState;

pub fn create_notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:user_id/preferences",
            get(get_preferences).put(set_preferences),
        )
        .route("/notifications", get(pending_notifications))
        .route("/notifications", delete(clear_notifications))
}

/// GET /api/v1/users/:user_id/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<NotificationPreferences>> {
    let prefs = state.notification_service.preferences(&user_id).await;
    Json(ApiResponse::ok(prefs))
}

/// PUT /api/v1/users/:user_id/preferences
pub async fn set_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(prefs): Json<NotificationPreferences>,
) -> Json<ApiResponse<NotificationPreferences>> {
    state
        .notification_service
        .set_preferences(&user_id, prefs.clone())
        .await;
    Json(ApiResponse::ok_with_message(prefs, "Preferences updated"))
}

/// GET /api/v1/notifications
pub async fn pending_notifications(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<NotificationPayload>>> {
    let pending = state.notification_service.pending_notifications().await;
    Json(ApiResponse::ok(pending))
}

/// DELETE /api/v1/notifications
pub async fn clear_notifications(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    state.notification_service.clear_notifications().await;
    Json(ApiResponse::ok_with_message((), "Notifications cleared"))
}
