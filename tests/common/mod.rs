#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use minimart_api::config::AppConfig;
use minimart_api::db;
use minimart_api::entities::{daily_sales, products, promo_events};
use minimart_api::services::events::EventSource;
use minimart_api::services::forecasting::{ForecastService, NoJitter};
use minimart_api::{api_v1_routes, AppState};

/// Helper harness backed by an in-memory SQLite database. Jitter is pinned
/// to [`NoJitter`] so every series the harness produces is deterministic.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory DB.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.forecast.jitter_enabled = false;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg, Arc::new(NoJitter));
        let router = Router::new()
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self { router, state }
    }

    pub fn forecasts(&self) -> Arc<ForecastService> {
        self.state.forecasts.clone()
    }

    /// Issue a GET and return the status plus the parsed JSON body.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("router handled request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body collected");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Insert a product and return its id.
    pub async fn insert_product(
        &self,
        name: &str,
        brand: Option<&str>,
        category: &str,
        current_stock: i32,
        retail_price: Decimal,
    ) -> Uuid {
        let id = Uuid::new_v4();
        products::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            barcode: Set(None),
            brand: Set(brand.map(str::to_string)),
            category: Set(category.to_string()),
            cost_price: Set(retail_price * Decimal::new(8, 1)),
            retail_price: Set(retail_price),
            current_stock: Set(current_stock),
            is_archived: Set(false),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("product inserted");
        id
    }

    pub async fn archive_product(&self, product_id: Uuid) {
        use sea_orm::EntityTrait;
        let model = products::Entity::find_by_id(product_id)
            .one(self.state.db.as_ref())
            .await
            .expect("product query")
            .expect("product exists");
        let mut active: products::ActiveModel = model.into();
        active.is_archived = Set(true);
        active.update(self.state.db.as_ref()).await.expect("product archived");
    }

    /// Insert one daily rollup row. Revenue defaults to units at the given
    /// unit price.
    pub async fn record_sales(
        &self,
        product_id: Uuid,
        date: NaiveDate,
        units: i32,
        unit_price: Decimal,
        had_event: bool,
    ) {
        daily_sales::ActiveModel {
            product_id: Set(product_id),
            sale_date: Set(date),
            units_sold: Set(units),
            revenue: Set(unit_price * Decimal::from(units)),
            had_event: Set(had_event),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("daily sales row inserted");
    }

    /// Seed a flat run of history: `units_per_day` every day from
    /// `days_ago_start` back through `days_ago_end` (both relative to today,
    /// inclusive, start < end).
    pub async fn seed_constant_sales(
        &self,
        product_id: Uuid,
        days_ago_start: i64,
        days_ago_end: i64,
        units_per_day: i32,
        unit_price: Decimal,
    ) {
        let today = self.today();
        for offset in days_ago_start..=days_ago_end {
            self.record_sales(
                product_id,
                today - Duration::days(offset),
                units_per_day,
                unit_price,
                false,
            )
            .await;
        }
    }

    /// Insert a promo event running from `start_offset` to `end_offset`
    /// days relative to today (inclusive).
    pub async fn insert_event(
        &self,
        name: &str,
        source: EventSource,
        start_offset: i64,
        end_offset: i64,
        multiplier: f64,
        affected_brand: Option<&str>,
        affected_category: Option<&str>,
        affected_product_ids: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let today = self.today();
        promo_events::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            source: Set(source.to_string()),
            start_date: Set(today + Duration::days(start_offset)),
            end_date: Set(today + Duration::days(end_offset)),
            multiplier: Set(multiplier),
            affected_brand: Set(affected_brand.map(str::to_string)),
            affected_category: Set(affected_category.map(str::to_string)),
            affected_product_ids: Set(affected_product_ids.map(str::to_string)),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("promo event inserted");
        id
    }
}
