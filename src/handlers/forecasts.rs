use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::{
    services::forecasting::ForecastResult,
    ApiResponse, ApiResult, AppState,
};

/// Build the forecast Router scoped under `/api/v1`.
pub fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/forecasts", get(list_forecasts))
        .route("/forecasts/alerts", get(get_reorder_alerts))
        .route("/forecasts/:product_id", get(get_forecast))
}

/// Forecasts for every active product, for the inventory table's Smart Tip
/// column and the dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/forecasts",
    responses(
        (status = 200, description = "Forecasts computed for all active products", body = ApiResponse<Vec<ForecastResult>>)
    ),
    tag = "Forecasts"
)]
pub async fn list_forecasts(State(state): State<AppState>) -> ApiResult<Vec<ForecastResult>> {
    let forecasts = state.forecasts.compute_all_forecasts().await?;
    Ok(Json(ApiResponse::success(forecasts)))
}

/// Products needing a restock decision, most urgent first.
#[utoipa::path(
    get,
    path = "/api/v1/forecasts/alerts",
    responses(
        (status = 200, description = "Reorder alerts, most urgent first", body = ApiResponse<Vec<ForecastResult>>)
    ),
    tag = "Forecasts"
)]
pub async fn get_reorder_alerts(State(state): State<AppState>) -> ApiResult<Vec<ForecastResult>> {
    let alerts = state.forecasts.reorder_alerts().await?;
    Ok(Json(ApiResponse::success(alerts)))
}

/// One product's forecast.
#[utoipa::path(
    get,
    path = "/api/v1/forecasts/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product identifier")
    ),
    responses(
        (status = 200, description = "Forecast computed", body = ApiResponse<ForecastResult>),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecasts"
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<ForecastResult> {
    let forecast = state.forecasts.compute_forecast(product_id).await?;
    Ok(Json(ApiResponse::success(forecast)))
}
