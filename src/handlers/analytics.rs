use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::forecasting::{DemandMetric, DemandSeries, HistoryWindow, Insight, SalesOverview},
    ApiResponse, ApiResult, AppState,
};

/// Build the analytics Router scoped under `/api/v1/analytics`.
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/demand-series", get(get_demand_series))
        .route("/insights", get(get_insights))
        .route("/overview", get(get_sales_overview))
}

/// Query parameters for the demand series chart
#[derive(Debug, Deserialize, IntoParams)]
pub struct DemandSeriesQuery {
    /// Restrict the series to one product; omit for store-wide
    pub product_id: Option<Uuid>,
    /// History window in days: 7, 30, or 90 (default: 30)
    pub window_days: Option<u32>,
    /// What to chart: "units" or "revenue" (default: units)
    pub metric: Option<String>,
}

/// History-plus-forecast chart series for the analytics dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/demand-series",
    params(DemandSeriesQuery),
    responses(
        (status = 200, description = "Demand series computed", body = ApiResponse<DemandSeries>),
        (status = 400, description = "Unsupported window or metric", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_demand_series(
    State(state): State<AppState>,
    Query(params): Query<DemandSeriesQuery>,
) -> ApiResult<DemandSeries> {
    let window_days = params.window_days.unwrap_or(30);
    let window = HistoryWindow::from_days(window_days).ok_or_else(|| {
        ServiceError::ValidationError("window_days must be one of 7, 30, 90".to_string())
    })?;

    let metric = match params.metric.as_deref() {
        None => DemandMetric::Units,
        Some(raw) => raw.parse::<DemandMetric>().map_err(|_| {
            ServiceError::ValidationError("metric must be 'units' or 'revenue'".to_string())
        })?,
    };

    let series = state
        .forecasts
        .demand_series(params.product_id, window, metric)
        .await?;
    Ok(Json(ApiResponse::success(series)))
}

/// Ranked business insights for the dashboard; between one and four.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/insights",
    responses(
        (status = 200, description = "Insights generated", body = ApiResponse<Vec<Insight>>)
    ),
    tag = "Analytics"
)]
pub async fn get_insights(State(state): State<AppState>) -> ApiResult<Vec<Insight>> {
    let insights = state.forecasts.insights().await?;
    Ok(Json(ApiResponse::success(insights)))
}

/// Revenue and unit totals for the dashboard header card.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/overview",
    responses(
        (status = 200, description = "Sales overview computed", body = ApiResponse<SalesOverview>)
    ),
    tag = "Analytics"
)]
pub async fn get_sales_overview(State(state): State<AppState>) -> ApiResult<SalesOverview> {
    let overview = state.forecasts.sales_overview().await?;
    Ok(Json(ApiResponse::success(overview)))
}
