//! End-to-end forecast engine tests over the HTTP surface.
//!
//! Each test seeds its own catalog and sales history relative to today so
//! the trailing-window math lands on known values regardless of the date
//! the suite runs.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use rust_decimal_macros::dec;
use serde_json::Value;
use uuid::Uuid;

use common::TestApp;
use minimart_api::services::events::EventSource;

fn data<'a>(body: &'a Value) -> &'a Value {
    assert_eq!(body["success"], Value::Bool(true), "body: {body}");
    &body["data"]
}

#[tokio::test]
async fn two_week_history_produces_the_worked_forecast() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Coke Mismo 295ml", Some("Coca-Cola"), "SODA", 3, dec!(20.00))
        .await;
    // 2/day this week, 1/day the week before, ending yesterday.
    app.seed_constant_sales(product_id, 1, 7, 2, dec!(20.00)).await;
    app.seed_constant_sales(product_id, 8, 14, 1, dec!(20.00)).await;

    let (status, body) = app.get(&format!("/api/v1/forecasts/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let forecast = data(&body);
    assert_eq!(forecast["product_name"], "Coke Mismo 295ml");
    assert_eq!(forecast["current_stock"], 3);
    assert_eq!(forecast["avg_daily_velocity"], 2.0);
    assert_eq!(forecast["velocity_trend"], "INCREASING");
    assert_eq!(forecast["velocity_change_pct"], 100.0);
    assert_eq!(forecast["days_of_stock"], 1.5);
    assert_eq!(forecast["stock_status"], "CRITICAL");
    assert_eq!(forecast["forecasted_weekly_units"], 14);
    // Target is 14 days of coverage: ceil(14/7 * 14) = 28, minus 3 on hand.
    assert_eq!(forecast["suggested_reorder_qty"], 25);
    // Exactly 14 days of history: enough to trust, not enough for HIGH.
    assert_eq!(forecast["confidence"], "MEDIUM");
    assert_eq!(forecast["active_events"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn stale_stock_is_flagged_dead_and_never_reordered() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Party Sparklers 10s", None, "SEASONAL", 20, dec!(45.00))
        .await;
    // A single sale 45 days ago, then nothing.
    app.record_sales(
        product_id,
        app.today() - Duration::days(45),
        1,
        dec!(45.00),
        false,
    )
    .await;

    let (status, body) = app.get(&format!("/api/v1/forecasts/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let forecast = data(&body);
    assert_eq!(forecast["stock_status"], "DEAD_STOCK");
    assert_eq!(forecast["avg_daily_velocity"], 0.0);
    assert_eq!(forecast["days_of_stock"], Value::Null);
    assert_eq!(forecast["suggested_reorder_qty"], 0);
}

#[tokio::test]
async fn out_of_stock_with_demand_gets_the_full_target() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product(
            "Argentina Corned Beef 260g",
            Some("Argentina"),
            "CANNED_GOODS",
            0,
            dec!(57.50),
        )
        .await;
    app.seed_constant_sales(product_id, 1, 14, 1, dec!(57.50)).await;

    let (status, body) = app.get(&format!("/api/v1/forecasts/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let forecast = data(&body);
    assert_eq!(forecast["stock_status"], "OUT_OF_STOCK");
    assert_eq!(forecast["days_of_stock"], 0.0);
    // ceil(7/7 * 14) = 14, nothing on hand to subtract.
    assert_eq!(forecast["suggested_reorder_qty"], 14);
}

#[tokio::test]
async fn slow_mover_with_recent_sale_stays_healthy_with_open_runway() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Joy Dishwashing Liquid 475ml", Some("Joy"), "HOUSEHOLD", 8, dec!(134.00))
        .await;
    // One sale 10 days ago: below the velocity floor but recently alive.
    app.record_sales(
        product_id,
        app.today() - Duration::days(10),
        1,
        dec!(134.00),
        false,
    )
    .await;

    let (status, body) = app.get(&format!("/api/v1/forecasts/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let forecast = data(&body);
    assert_eq!(forecast["stock_status"], "HEALTHY");
    assert_eq!(forecast["days_of_stock"], Value::Null);
}

#[tokio::test]
async fn event_next_week_multiplies_the_weekly_projection() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Oishi Prawn Crackers 60g", Some("Oishi"), "SNACK", 40, dec!(17.60))
        .await;
    app.seed_constant_sales(product_id, 1, 14, 1, dec!(17.60)).await;
    // Doubles demand for the whole projection week.
    app.insert_event(
        "Fiesta Weekend",
        EventSource::Holiday,
        0,
        6,
        2.0,
        None,
        Some("SNACK"),
        None,
    )
    .await;

    let (status, body) = app.get(&format!("/api/v1/forecasts/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let forecast = data(&body);
    assert_eq!(forecast["avg_daily_velocity"], 1.0);
    assert_eq!(forecast["forecasted_weekly_units"], 14);

    let events = forecast["active_events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["name"], "Fiesta Weekend");
    assert_eq!(events[0]["multiplier"], 2.0);
}

#[tokio::test]
async fn event_scoped_to_another_brand_leaves_the_projection_alone() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Sprite 500ml", Some("Coca-Cola"), "SODA", 40, dec!(25.00))
        .await;
    app.seed_constant_sales(product_id, 1, 14, 2, dec!(25.00)).await;
    app.insert_event(
        "Pepsi Push",
        EventSource::ManufacturerCampaign,
        0,
        6,
        3.0,
        Some("Pepsi"),
        None,
        None,
    )
    .await;

    let (_, body) = app.get(&format!("/api/v1/forecasts/{product_id}")).await;
    let forecast = data(&body);
    assert_eq!(forecast["forecasted_weekly_units"], 14);
    assert!(forecast["active_events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn alerts_are_an_urgency_sorted_subset_of_all_forecasts() {
    let app = TestApp::new().await;

    let out_of_stock = app
        .insert_product("Gone", None, "SODA", 0, dec!(20.00))
        .await;
    app.seed_constant_sales(out_of_stock, 1, 14, 2, dec!(20.00)).await;

    let critical = app
        .insert_product("Nearly Gone", None, "SODA", 3, dec!(20.00))
        .await;
    app.seed_constant_sales(critical, 1, 14, 2, dec!(20.00)).await;

    let healthy = app
        .insert_product("Plenty", None, "SODA", 500, dec!(20.00))
        .await;
    app.seed_constant_sales(healthy, 1, 14, 2, dec!(20.00)).await;

    let dead = app
        .insert_product("Dust Collector", None, "SEASONAL", 30, dec!(45.00))
        .await;
    app.record_sales(dead, app.today() - Duration::days(60), 1, dec!(45.00), false)
        .await;

    let (status, body) = app.get("/api/v1/forecasts/alerts").await;
    assert_eq!(status, StatusCode::OK);
    let alerts = data(&body).as_array().unwrap().clone();

    let alert_ids: Vec<&str> = alerts
        .iter()
        .map(|alert| alert["product_id"].as_str().unwrap())
        .collect();
    assert!(alert_ids.contains(&out_of_stock.to_string().as_str()));
    assert!(alert_ids.contains(&critical.to_string().as_str()));
    assert!(!alert_ids.contains(&healthy.to_string().as_str()));
    assert!(!alert_ids.contains(&dead.to_string().as_str()));

    // Most urgent first, every alert actionable.
    assert_eq!(alerts[0]["product_id"], out_of_stock.to_string());
    assert_eq!(alerts[1]["product_id"], critical.to_string());
    for alert in &alerts {
        assert!(alert["suggested_reorder_qty"].as_i64().unwrap() > 0);
    }

    // And a subset of the full forecast listing.
    let (_, body) = app.get("/api/v1/forecasts").await;
    let all_ids: Vec<String> = data(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|forecast| forecast["product_id"].as_str().unwrap().to_string())
        .collect();
    for id in alert_ids {
        assert!(all_ids.iter().any(|known| known == id));
    }
}

#[tokio::test]
async fn archived_products_are_excluded_from_the_listing() {
    let app = TestApp::new().await;
    let active = app
        .insert_product("On Shelf", None, "SODA", 10, dec!(20.00))
        .await;
    let retired = app
        .insert_product("Delisted", None, "SODA", 10, dec!(20.00))
        .await;
    app.archive_product(retired).await;

    let (status, body) = app.get("/api/v1/forecasts").await;
    assert_eq!(status, StatusCode::OK);
    let forecasts = data(&body).as_array().unwrap().clone();
    assert_eq!(forecasts.len(), 1);
    assert_eq!(forecasts[0]["product_id"], active.to_string());
}

#[tokio::test]
async fn unknown_product_returns_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .get(&format!("/api/v1/forecasts/{}", Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn forecast_is_deterministic_across_repeated_computation() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Milo 22g Sachet", Some("Nestle"), "BEVERAGES", 60, dec!(12.00))
        .await;
    app.seed_constant_sales(product_id, 1, 30, 5, dec!(12.00)).await;

    let service = app.forecasts();
    let today = app.today();
    let first = service
        .compute_forecast_as_of(product_id, today)
        .await
        .unwrap();
    let second = service
        .compute_forecast_as_of(product_id, today)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn insights_endpoint_always_returns_one_to_four() {
    let app = TestApp::new().await;

    // Empty store first: the steady-state fallback.
    let (status, body) = app.get("/api/v1/analytics/insights").await;
    assert_eq!(status, StatusCode::OK);
    let insights = data(&body).as_array().unwrap().clone();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0]["kind"], "STEADY");

    // A strong riser should surface once history exists.
    let product_id = app
        .insert_product("Downy Sachet 20ml", Some("Downy"), "HOUSEHOLD", 90, dec!(7.00))
        .await;
    app.seed_constant_sales(product_id, 1, 7, 10, dec!(7.00)).await;
    app.seed_constant_sales(product_id, 8, 14, 2, dec!(7.00)).await;

    let (status, body) = app.get("/api/v1/analytics/insights").await;
    assert_eq!(status, StatusCode::OK);
    let insights = data(&body).as_array().unwrap().clone();
    assert!(!insights.is_empty() && insights.len() <= 4);
    assert!(insights
        .iter()
        .any(|insight| insight["kind"] == "TRENDING_UP"));
}

#[tokio::test]
async fn overview_totals_cover_today_week_and_month() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("555 Sardines 155g", Some("555"), "CANNED_GOODS", 48, dec!(25.00))
        .await;
    // 3 units yesterday and 3 the day before; today has no rollup yet.
    app.seed_constant_sales(product_id, 1, 2, 3, dec!(25.00)).await;

    let (status, body) = app.get("/api/v1/analytics/overview").await;
    assert_eq!(status, StatusCode::OK);

    let overview = data(&body);
    assert_eq!(overview["units_today"], 0);
    assert_eq!(overview["units_this_week"], 6);
    assert_eq!(overview["revenue_this_week"], "150.00");
    assert_eq!(overview["active_event_count"], 0);
}

#[tokio::test]
async fn status_and_health_report_healthy_database() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    let health = data(&body);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["checks"]["database"], "healthy");
}
