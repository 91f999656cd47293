use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Minimart API",
        version = "0.3.0",
        description = r#"
# Minimart Inventory & Forecasting API

Read-only analytics surface over a small retail store's sales history:
per-product demand forecasts, stock-urgency classification, replenishment
suggestions, event-aware demand series for charting, and ranked business
insights.

## Semantics

- **Velocity** is units sold per day, a trailing 7-day average.
- **Days of stock** is current stock divided by daily velocity; `null`
  means the runway is effectively unbounded (shown as "N/A").
- **Stock status** tiers: OUT_OF_STOCK, CRITICAL (≤2 days), LOW (≤7 days),
  DEAD_STOCK (no meaningful sales for 30+ days), HEALTHY.
- Forecast series values carry a small visual jitter; disable it via
  `APP__FORECAST__JITTER_ENABLED=false` for reproducible output.

## Error Handling

Errors use a consistent JSON shape with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation error: window_days must be one of 7, 30, 90",
  "request_id": "req-abc123xyz",
  "timestamp": "2025-06-12T10:30:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Forecasts", description = "Per-product demand forecasts and reorder alerts"),
        (name = "Analytics", description = "Demand series, insights, and sales overview")
    ),
    paths(
        crate::handlers::forecasts::list_forecasts,
        crate::handlers::forecasts::get_reorder_alerts,
        crate::handlers::forecasts::get_forecast,
        crate::handlers::analytics::get_demand_series,
        crate::handlers::analytics::get_insights,
        crate::handlers::analytics::get_sales_overview,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,

            crate::services::forecasting::ForecastResult,
            crate::services::forecasting::EventSummary,
            crate::services::forecasting::SalesOverview,
            crate::services::forecasting::StockStatus,
            crate::services::forecasting::Trend,
            crate::services::forecasting::Confidence,
            crate::services::forecasting::DemandSeries,
            crate::services::forecasting::DemandPoint,
            crate::services::forecasting::DemandMetric,
            crate::services::forecasting::HistoryWindow,
            crate::services::forecasting::Insight,
            crate::services::forecasting::InsightKind,
            crate::services::events::EventSource,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
