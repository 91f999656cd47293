//! Demand series endpoint tests: bucket layout, the actual/forecast split,
//! event flags, and parameter validation.

mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::Value;
use uuid::Uuid;

use common::TestApp;
use minimart_api::services::events::EventSource;

fn points<'a>(body: &'a Value) -> &'a Vec<Value> {
    assert_eq!(body["success"], Value::Bool(true), "body: {body}");
    body["data"]["points"].as_array().unwrap()
}

async fn seeded_app() -> (TestApp, Uuid) {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Coke Mismo 295ml", Some("Coca-Cola"), "SODA", 18, dec!(20.00))
        .await;
    // 1 unit/day for the trailing two weeks, ending yesterday.
    app.seed_constant_sales(product_id, 1, 14, 1, dec!(20.00)).await;
    (app, product_id)
}

#[tokio::test]
async fn week_window_shows_seven_daily_actuals_and_seven_forecasts() {
    let (app, product_id) = seeded_app().await;

    let (status, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}&window_days=7"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["data"]["window"], "WEEK");
    assert_eq!(body["data"]["metric"], "UNITS");
    assert_eq!(body["data"]["product_id"], product_id.to_string());

    let points = points(&body);
    assert_eq!(points.len(), 14);
    for point in &points[..7] {
        assert_eq!(point["actual"], 1.0);
        assert!(point.get("forecast").is_none());
    }
    for point in &points[7..] {
        assert!(point.get("actual").is_none());
        // Steady 1/day velocity, no events, no jitter.
        assert_eq!(point["forecast"], 1.0);
        assert!(point["lower"].as_f64().unwrap() <= point["forecast"].as_f64().unwrap());
        assert!(point["upper"].as_f64().unwrap() >= point["forecast"].as_f64().unwrap());
    }
}

#[tokio::test]
async fn bridge_annotations_stitch_history_to_forecast() {
    let (app, product_id) = seeded_app().await;

    let (_, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}&window_days=7"
        ))
        .await;

    let points = points(&body);
    // Last actual and first forecast both carry the bridge value.
    assert_eq!(points[6]["bridge"], points[6]["actual"]);
    assert_eq!(points[7]["bridge"], points[7]["forecast"]);
    for (index, point) in points.iter().enumerate() {
        if index != 6 && index != 7 {
            assert!(point.get("bridge").is_none(), "stray bridge at {index}");
        }
    }
}

#[tokio::test]
async fn month_and_quarter_windows_have_their_documented_shapes() {
    let (app, product_id) = seeded_app().await;

    let (_, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}&window_days=30"
        ))
        .await;
    assert_eq!(points(&body).len(), 44);

    let (_, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}&window_days=90"
        ))
        .await;
    let quarter = points(&body);
    assert_eq!(quarter.len(), 17);
    // Weekly buckets get the "Wk of" label.
    assert!(quarter[0]["label"].as_str().unwrap().starts_with("Wk of "));
}

#[tokio::test]
async fn window_defaults_to_a_month_of_history() {
    let (app, product_id) = seeded_app().await;

    let (status, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["window"], "MONTH");
    assert_eq!(points(&body).len(), 44);
}

#[tokio::test]
async fn events_raise_forecast_points_and_flag_them() {
    let (app, product_id) = seeded_app().await;
    app.insert_event(
        "Payday Sale",
        EventSource::StoreDiscount,
        2,
        3,
        2.0,
        None,
        None,
        None,
    )
    .await;

    let (_, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}&window_days=7"
        ))
        .await;

    let points = points(&body);
    // Forecast half starts today at index 7; the event covers days 2 and 3.
    for (offset, point) in points[7..].iter().enumerate() {
        let covered = offset == 2 || offset == 3;
        assert_eq!(point["event"].as_bool().unwrap(), covered, "day {offset}");
        let expected = if covered { 2.0 } else { 1.0 };
        assert_eq!(point["forecast"], expected, "day {offset}");
    }
}

#[tokio::test]
async fn history_rows_marked_with_an_event_flag_their_bucket() {
    let app = TestApp::new().await;
    let product_id = app
        .insert_product("Sprite 500ml", Some("Coca-Cola"), "SODA", 30, dec!(25.00))
        .await;
    let today = app.today();
    app.record_sales(product_id, today - chrono::Duration::days(3), 4, dec!(25.00), true)
        .await;
    app.record_sales(product_id, today - chrono::Duration::days(2), 1, dec!(25.00), false)
        .await;

    let (_, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}&window_days=7"
        ))
        .await;

    let points = points(&body);
    // History buckets run from 7 days ago, so 3 days ago is index 4.
    assert_eq!(points[4]["actual"], 4.0);
    assert_eq!(points[4]["event"], true);
    assert_eq!(points[5]["actual"], 1.0);
    assert_eq!(points[5]["event"], false);
    // Unsold days are zero-filled, not missing.
    assert_eq!(points[0]["actual"], 0.0);
}

#[tokio::test]
async fn revenue_metric_charts_pesos_instead_of_units() {
    let (app, product_id) = seeded_app().await;

    let (status, body) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={product_id}&window_days=7&metric=revenue"
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metric"], "REVENUE");

    let points = points(&body);
    assert_eq!(points[0]["actual"], 20.0);
    assert_eq!(points[13]["forecast"], 20.0);
}

#[tokio::test]
async fn store_wide_series_sums_every_active_product() {
    let (app, _) = seeded_app().await;
    let second = app
        .insert_product("Milo 22g Sachet", Some("Nestle"), "BEVERAGES", 60, dec!(12.00))
        .await;
    app.seed_constant_sales(second, 1, 14, 2, dec!(12.00)).await;

    let (status, body) = app
        .get("/api/v1/analytics/demand-series?window_days=7")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product_id"], Value::Null);

    let points = points(&body);
    for point in &points[..7] {
        assert_eq!(point["actual"], 3.0);
    }
    for point in &points[7..] {
        assert_eq!(point["forecast"], 3.0);
    }
}

#[tokio::test]
async fn series_is_reproducible_with_jitter_disabled() {
    let (app, product_id) = seeded_app().await;
    let uri = format!(
        "/api/v1/analytics/demand-series?product_id={product_id}&window_days=30"
    );

    let (_, first) = app.get(&uri).await;
    let (_, second) = app.get(&uri).await;
    assert_eq!(first["data"], second["data"]);
}

#[tokio::test]
async fn unsupported_window_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .get("/api/v1/analytics/demand-series?window_days=14")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("window_days must be one of 7, 30, 90"));
}

#[tokio::test]
async fn unsupported_metric_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .get("/api/v1/analytics/demand-series?metric=profit")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("metric must be 'units' or 'revenue'"));
}

#[tokio::test]
async fn unknown_product_in_series_returns_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .get(&format!(
            "/api/v1/analytics/demand-series?product_id={}",
            Uuid::new_v4()
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
