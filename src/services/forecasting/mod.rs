//! The demand forecasting and replenishment engine.
//!
//! `ForecastService` joins the reader snapshots (catalog, sales history,
//! event calendar) and drives the pure computation modules below. Every
//! public operation also exists in an `_as_of(today)` form so tests and
//! backfills can evaluate the engine at a fixed date.

pub mod insights;
pub mod reorder;
pub mod series;
pub mod stock;
pub mod velocity;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::ForecastConfig,
    errors::ServiceError,
    services::{
        catalog::{CatalogReader, ProductSnapshot},
        events::{EventCalendar, EventCalendarReader, EventSource, PromoEvent},
        history::{DateRange, SalesDay, SalesHistoryReader, SalesScope},
    },
};

pub use insights::{generate_insights, Insight, InsightContext, InsightKind};
pub use reorder::Confidence;
pub use series::{
    build_series, DemandMetric, DemandPoint, DemandSeries, HistoryWindow, JitterSource, NoJitter,
    SeriesInputs, ThreadRngJitter,
};
pub use stock::{assess_stock, StockAssessment, StockStatus};
pub use velocity::{velocity_profile, Trend, VelocityProfile};

/// Days of history fetched for velocity and confidence evaluation. Covers
/// the longest chart window (13 full weeks) with room for the two trailing
/// velocity weeks.
const HISTORY_FETCH_DAYS: i64 = 91;

/// Resolved policy knobs, snapshotted from [`ForecastConfig`] at startup.
#[derive(Debug, Clone)]
pub struct ForecastPolicy {
    pub target_coverage_days: u32,
    pub dead_stock_after_days: i64,
    pub stale_velocity_floor: f64,
    pub trend_band_pct: f64,
    pub min_restock_qty: i32,
    pub critical_coverage_days: f64,
    pub low_coverage_days: f64,
    pub jitter_spread: f64,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self::from(&ForecastConfig::default())
    }
}

impl From<&ForecastConfig> for ForecastPolicy {
    fn from(cfg: &ForecastConfig) -> Self {
        Self {
            target_coverage_days: cfg.target_coverage_days,
            dead_stock_after_days: cfg.dead_stock_after_days,
            stale_velocity_floor: cfg.stale_velocity_floor,
            trend_band_pct: cfg.trend_band_pct,
            min_restock_qty: cfg.min_restock_qty,
            critical_coverage_days: cfg.critical_coverage_days,
            low_coverage_days: cfg.low_coverage_days,
            jitter_spread: if cfg.jitter_enabled {
                cfg.jitter_spread
            } else {
                0.0
            },
        }
    }
}

/// Compact event record attached to forecast output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    pub source: EventSource,
    pub multiplier: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&PromoEvent> for EventSummary {
    fn from(event: &PromoEvent) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            source: event.source,
            multiplier: event.multiplier,
            start_date: event.start_date,
            end_date: event.end_date,
        }
    }
}

/// The per-product output record: velocity, urgency, reorder suggestion,
/// and the events shaping the next week. Fully deterministic for a given
/// snapshot; chart jitter never reaches this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastResult {
    pub product_id: Uuid,
    pub product_name: String,
    pub current_stock: i32,
    pub avg_daily_velocity: f64,
    pub velocity_trend: Trend,
    pub velocity_change_pct: f64,
    /// `None` means unbounded runway, shown as "N/A".
    pub days_of_stock: Option<f64>,
    pub stock_status: StockStatus,
    pub forecasted_weekly_units: i64,
    pub suggested_reorder_qty: i32,
    pub confidence: Confidence,
    /// Events overlapping the next 7 days and scoped to this product.
    pub active_events: Vec<EventSummary>,
}

/// Dashboard header card: revenue and unit totals for today, the trailing
/// week, and the month to date, plus how many events are running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesOverview {
    pub date: NaiveDate,
    pub revenue_today: Decimal,
    pub units_today: i64,
    pub revenue_this_week: Decimal,
    pub units_this_week: i64,
    pub revenue_this_month: Decimal,
    pub units_this_month: i64,
    pub active_event_count: usize,
}

/// Read-only forecasting facade over the reader traits.
#[derive(Clone)]
pub struct ForecastService {
    history: Arc<dyn SalesHistoryReader>,
    catalog: Arc<dyn CatalogReader>,
    events: Arc<dyn EventCalendarReader>,
    jitter: Arc<dyn JitterSource>,
    policy: ForecastPolicy,
}

impl ForecastService {
    pub fn new(
        history: Arc<dyn SalesHistoryReader>,
        catalog: Arc<dyn CatalogReader>,
        events: Arc<dyn EventCalendarReader>,
        jitter: Arc<dyn JitterSource>,
        policy: ForecastPolicy,
    ) -> Self {
        Self {
            history,
            catalog,
            events,
            jitter,
            policy,
        }
    }

    pub fn policy(&self) -> &ForecastPolicy {
        &self.policy
    }

    /// Forecast for one product.
    #[instrument(skip(self))]
    pub async fn compute_forecast(&self, product_id: Uuid) -> Result<ForecastResult, ServiceError> {
        self.compute_forecast_as_of(product_id, Utc::now().date_naive())
            .await
    }

    pub async fn compute_forecast_as_of(
        &self,
        product_id: Uuid,
        today: NaiveDate,
    ) -> Result<ForecastResult, ServiceError> {
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let fetch = DateRange::trailing(today - Duration::days(1), HISTORY_FETCH_DAYS);
        let week_ahead = DateRange::trailing(today + Duration::days(6), 7);
        let (days, last_sales, events) = tokio::try_join!(
            self.history.daily_sales(SalesScope::Product(product_id), fetch),
            self.history.last_sale_dates(SalesScope::Product(product_id)),
            self.events.events_overlapping(week_ahead),
        )?;
        let calendar = EventCalendar::new(events);

        Ok(self.forecast_one(&product, &days, last_sales.get(&product_id).copied(), &calendar, today))
    }

    /// Forecasts for every non-archived product, ordered by product name.
    #[instrument(skip(self))]
    pub async fn compute_all_forecasts(&self) -> Result<Vec<ForecastResult>, ServiceError> {
        self.compute_all_forecasts_as_of(Utc::now().date_naive())
            .await
    }

    pub async fn compute_all_forecasts_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<ForecastResult>, ServiceError> {
        let fetch = DateRange::trailing(today - Duration::days(1), HISTORY_FETCH_DAYS);
        let week_ahead = DateRange::trailing(today + Duration::days(6), 7);
        let (products, days, last_sales, events) = tokio::try_join!(
            self.catalog.active_products(),
            self.history.daily_sales(SalesScope::All, fetch),
            self.history.last_sale_dates(SalesScope::All),
            self.events.events_overlapping(week_ahead),
        )?;
        let calendar = EventCalendar::new(events);
        let by_product = group_by_product(&days);

        Ok(products
            .iter()
            .map(|product| {
                let history = by_product
                    .get(&product.product_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                self.forecast_one(
                    product,
                    history,
                    last_sales.get(&product.product_id).copied(),
                    &calendar,
                    today,
                )
            })
            .collect())
    }

    /// Products that need a restock decision, most urgent first.
    #[instrument(skip(self))]
    pub async fn reorder_alerts(&self) -> Result<Vec<ForecastResult>, ServiceError> {
        self.reorder_alerts_as_of(Utc::now().date_naive()).await
    }

    pub async fn reorder_alerts_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<ForecastResult>, ServiceError> {
        let mut alerts: Vec<ForecastResult> = self
            .compute_all_forecasts_as_of(today)
            .await?
            .into_iter()
            .filter(|f| f.stock_status.needs_reorder_attention() && f.suggested_reorder_qty > 0)
            .collect();

        alerts.sort_by(|a, b| {
            a.stock_status
                .severity()
                .cmp(&b.stock_status.severity())
                .then_with(|| compare_coverage(a.days_of_stock, b.days_of_stock))
        });
        Ok(alerts)
    }

    /// History-plus-forecast chart series, product-specific or store-wide.
    #[instrument(skip(self))]
    pub async fn demand_series(
        &self,
        product_id: Option<Uuid>,
        window: HistoryWindow,
        metric: DemandMetric,
    ) -> Result<DemandSeries, ServiceError> {
        self.demand_series_as_of(product_id, window, metric, Utc::now().date_naive())
            .await
    }

    pub async fn demand_series_as_of(
        &self,
        product_id: Option<Uuid>,
        window: HistoryWindow,
        metric: DemandMetric,
        today: NaiveDate,
    ) -> Result<DemandSeries, ServiceError> {
        let products = match product_id {
            Some(id) => {
                let product = self.catalog.product(id).await?.ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", id))
                })?;
                vec![product]
            }
            None => self.catalog.active_products().await?,
        };
        let scope = product_id.map_or(SalesScope::All, SalesScope::Product);

        // The fetch window must cover both the chart's history half and the
        // two trailing velocity weeks (the week view shows 7 days but
        // velocity still needs 14).
        let fetch_days = window.history_days().max(14);
        let fetch = DateRange::trailing(today - Duration::days(1), fetch_days);
        let shown = DateRange::new(
            today - Duration::days(window.history_days()),
            today + Duration::days(window.forecast_days() - 1),
        )?;
        let (days, events) = tokio::try_join!(
            self.history.daily_sales(scope, fetch),
            self.events.events_overlapping(shown),
        )?;
        let calendar = EventCalendar::new(events);

        let by_product = group_by_product(&days);
        let velocities: HashMap<Uuid, f64> = products
            .iter()
            .map(|product| {
                let history = by_product
                    .get(&product.product_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let profile =
                    velocity_profile(product.product_id, history, None, today, self.policy.trend_band_pct);
                (product.product_id, profile.daily_velocity)
            })
            .collect();

        let inputs = SeriesInputs {
            product_id,
            window,
            metric,
            today,
            products: &products,
            velocities: &velocities,
            history: &days,
            calendar: &calendar,
            jitter_spread: self.policy.jitter_spread,
        };
        Ok(build_series(&inputs, self.jitter.as_ref()))
    }

    /// Up to four ranked business insights; never empty.
    #[instrument(skip(self))]
    pub async fn insights(&self) -> Result<Vec<Insight>, ServiceError> {
        self.insights_as_of(Utc::now().date_naive()).await
    }

    pub async fn insights_as_of(&self, today: NaiveDate) -> Result<Vec<Insight>, ServiceError> {
        let fetch = DateRange::trailing(today - Duration::days(1), HISTORY_FETCH_DAYS);
        let mtd = DateRange::new(today.with_day(1).unwrap_or(today), today)?;
        let prior_mtd = prior_month_matching_range(today);

        let (products, days, last_sales, mtd_revenue, prior_revenue) = tokio::try_join!(
            self.catalog.active_products(),
            self.history.daily_sales(SalesScope::All, fetch),
            self.history.last_sale_dates(SalesScope::All),
            self.history.revenue_between(mtd),
            self.history.revenue_between(prior_mtd),
        )?;

        let by_product = group_by_product(&days);
        let profiles: Vec<(usize, VelocityProfile, StockStatus)> = products
            .iter()
            .enumerate()
            .map(|(index, product)| {
                let history = by_product
                    .get(&product.product_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let profile = velocity_profile(
                    product.product_id,
                    history,
                    last_sales.get(&product.product_id).copied(),
                    today,
                    self.policy.trend_band_pct,
                );
                let assessment = assess_stock(
                    product.current_stock,
                    profile.daily_velocity,
                    profile.days_since_last_sale,
                    &self.policy,
                );
                (index, profile, assessment.status)
            })
            .collect();

        let rows: Vec<InsightContext<'_>> = profiles
            .iter()
            .map(|(index, profile, status)| InsightContext {
                snapshot: &products[*index],
                profile,
                status: *status,
            })
            .collect();

        Ok(generate_insights(&rows, mtd_revenue, prior_revenue))
    }

    /// Totals for the dashboard header card.
    #[instrument(skip(self))]
    pub async fn sales_overview(&self) -> Result<SalesOverview, ServiceError> {
        self.sales_overview_as_of(Utc::now().date_naive()).await
    }

    pub async fn sales_overview_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<SalesOverview, ServiceError> {
        let week = DateRange::trailing(today, 7);
        let month = DateRange::new(today.with_day(1).unwrap_or(today), today)?;
        let fetch = DateRange::new(week.start.min(month.start), today)?;
        let (days, events) = tokio::try_join!(
            self.history.daily_sales(SalesScope::All, fetch),
            self.events.events_overlapping(DateRange::new(today, today)?),
        )?;

        let sum = |range: DateRange| -> (Decimal, i64) {
            days.iter()
                .filter(|day| range.contains(day.date))
                .fold((Decimal::ZERO, 0i64), |(revenue, units), day| {
                    (revenue + day.revenue, units + day.units_sold)
                })
        };
        let (revenue_today, units_today) = sum(DateRange::new(today, today)?);
        let (revenue_this_week, units_this_week) = sum(week);
        let (revenue_this_month, units_this_month) = sum(month);

        Ok(SalesOverview {
            date: today,
            revenue_today,
            units_today,
            revenue_this_week,
            units_this_week,
            revenue_this_month,
            units_this_month,
            active_event_count: events.len(),
        })
    }

    /// The pure per-product pipeline: velocity, urgency, reorder,
    /// confidence, plus the week's applicable events.
    fn forecast_one(
        &self,
        product: &ProductSnapshot,
        history: &[SalesDay],
        last_sale: Option<NaiveDate>,
        calendar: &EventCalendar,
        today: NaiveDate,
    ) -> ForecastResult {
        let profile = velocity_profile(
            product.product_id,
            history,
            last_sale,
            today,
            self.policy.trend_band_pct,
        );
        let assessment = assess_stock(
            product.current_stock,
            profile.daily_velocity,
            profile.days_since_last_sale,
            &self.policy,
        );
        let forecasted_weekly_units =
            reorder::forecasted_weekly_units(product, profile.daily_velocity, calendar, today);
        let suggested_reorder_qty = reorder::suggested_reorder_qty(
            assessment.status,
            product.current_stock,
            profile.daily_velocity,
            forecasted_weekly_units,
            &self.policy,
        );
        let confidence =
            reorder::confidence(profile.history_days, profile.daily_velocity, &self.policy);

        let week_ahead = DateRange::trailing(today + Duration::days(6), 7);
        let active_events = calendar
            .overlapping_for(product, week_ahead)
            .into_iter()
            .map(EventSummary::from)
            .collect();

        ForecastResult {
            product_id: product.product_id,
            product_name: product.name.clone(),
            current_stock: product.current_stock,
            avg_daily_velocity: profile.daily_velocity,
            velocity_trend: profile.trend,
            velocity_change_pct: profile.velocity_change_pct,
            days_of_stock: assessment.days_of_stock,
            stock_status: assessment.status,
            forecasted_weekly_units,
            suggested_reorder_qty,
            confidence,
            active_events,
        }
    }
}

fn group_by_product(days: &[SalesDay]) -> HashMap<Uuid, Vec<SalesDay>> {
    let mut grouped: HashMap<Uuid, Vec<SalesDay>> = HashMap::new();
    for day in days {
        grouped.entry(day.product_id).or_default().push(day.clone());
    }
    grouped
}

/// Ascending coverage; unbounded (`None`) sorts last.
fn compare_coverage(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The prior month's range matching [1st, today], with the day of month
/// clamped to the shorter month (Mar 30 compares against all of February).
fn prior_month_matching_range(today: NaiveDate) -> DateRange {
    let first_of_month = today.with_day(1).unwrap_or(today);
    let prior_month_end = first_of_month - Duration::days(1);
    let prior_start = prior_month_end.with_day(1).unwrap_or(prior_month_end);
    let clamped_day = today.day().min(days_in_month(prior_start));
    let prior_end = prior_start
        .with_day(clamped_day)
        .unwrap_or(prior_month_end);
    DateRange {
        start: prior_start,
        end: prior_end,
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next_month
        .map(|next| (next - first).num_days() as u32)
        .unwrap_or(30)
}
