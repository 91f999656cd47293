use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ForecastPolicy;
use crate::services::{catalog::ProductSnapshot, events::EventCalendar};

use super::stock::StockStatus;

/// How much history backs a recommendation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

const MIN_HISTORY_DAYS: i64 = 14;
const STRONG_HISTORY_DAYS: i64 = 30;

/// Projected unit demand over the 7 days starting at `from`, event
/// multipliers applied per day, rounded once at the end. Deterministic:
/// chart jitter never reaches this figure.
pub fn forecasted_weekly_units(
    product: &ProductSnapshot,
    daily_velocity: f64,
    calendar: &EventCalendar,
    from: NaiveDate,
) -> i64 {
    let mut total = 0.0;
    for offset in 0..7 {
        let day = from + Duration::days(offset);
        let multiplier = calendar
            .applicable(product, day)
            .map(|event| event.multiplier)
            .unwrap_or(1.0);
        total += daily_velocity * multiplier;
    }
    total.round() as i64
}

/// Restock-to-target quantity. Targets `target_coverage_days` of projected
/// coverage; dead stock is never restocked, and an out-of-stock product
/// with real demand always gets at least the minimum batch.
pub fn suggested_reorder_qty(
    status: StockStatus,
    current_stock: i32,
    daily_velocity: f64,
    forecasted_weekly_units: i64,
    policy: &ForecastPolicy,
) -> i32 {
    match status {
        StockStatus::DeadStock => 0,
        StockStatus::OutOfStock if daily_velocity < policy.stale_velocity_floor => 0,
        StockStatus::OutOfStock => {
            let target = target_stock(forecasted_weekly_units, policy);
            target
                .saturating_sub(current_stock)
                .max(policy.min_restock_qty)
        }
        _ => {
            let target = target_stock(forecasted_weekly_units, policy);
            target.saturating_sub(current_stock).max(0)
        }
    }
}

fn target_stock(forecasted_weekly_units: i64, policy: &ForecastPolicy) -> i32 {
    (forecasted_weekly_units as f64 / 7.0 * policy.target_coverage_days as f64).ceil() as i32
}

/// Confidence tier for one recommendation.
pub fn confidence(history_days: i64, daily_velocity: f64, policy: &ForecastPolicy) -> Confidence {
    if history_days < MIN_HISTORY_DAYS {
        Confidence::Low
    } else if history_days >= STRONG_HISTORY_DAYS && daily_velocity >= policy.stale_velocity_floor
    {
        Confidence::High
    } else {
        Confidence::Medium
    }
}
