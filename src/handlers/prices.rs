use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::ApiResponse;
use crate::models::{ChartDataPoint, PriceAnalytics, PriceChange, PricePoint};
use crate::services::price_service::ComparedPrice;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub tld: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub tlds: Vec<String>,
}

pub fn create_price_routes() -> Router<AppState> {
    Router::new()
        .route("/price-changes", get(list_price_changes))
        .route("/search", get(search_tld))
        .route("/history/:tld", get(price_history))
        .route("/analytics/:tld", get(tld_analytics))
        .route("/chart/:tld", get(tld_chart_data))
        .route("/compare", post(compare_prices))
}

/// GET /api/v1/price-changes
pub async fn list_price_changes(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<PriceChange>>> {
    let changes = state.price_service.get_price_changes().await;
    Json(ApiResponse::ok(changes))
}

/// GET /api/v1/search?tld=<query>
pub async fn search_tld(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<PriceChange>>> {
    let results = state.price_service.search_tld(&query.tld).await;
    Json(ApiResponse::ok(results))
}

/// GET /api/v1/history/:tld
pub async fn price_history(
    State(state): State<AppState>,
    Path(tld): Path<String>,
) -> Json<ApiResponse<Vec<PricePoint>>> {
    let history = state.price_service.get_price_history(&tld).await;
    Json(ApiResponse::ok(history))
}

/// GET /api/v1/analytics/:tld
pub async fn tld_analytics(
    State(state): State<AppState>,
    Path(tld): Path<String>,
) -> Result<Json<ApiResponse<PriceAnalytics>>, AppError> {
    let change = state
        .price_service
        .get_price_change(&tld)
        .await
        .ok_or_else(|| AppError::NotFound(format!("TLD not found: {}", tld)))?;
    Ok(Json(ApiResponse::ok(change.analytics())))
}

/// GET /api/v1/chart/:tld
pub async fn tld_chart_data(
    State(state): State<AppState>,
    Path(tld): Path<String>,
) -> Result<Json<ApiResponse<Vec<ChartDataPoint>>>, AppError> {
    let change = state
        .price_service
        .get_price_change(&tld)
        .await
        .ok_or_else(|| AppError::NotFound(format!("TLD not found: {}", tld)))?;
    Ok(Json(ApiResponse::ok(change.history_chart_data())))
}

/// POST /api/v1/compare
pub async fn compare_prices(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Json<ApiResponse<Vec<ComparedPrice>>> {
    let compared = state.price_service.compare_prices(&request.tlds).await;
    Json(ApiResponse::ok(compared))
}
