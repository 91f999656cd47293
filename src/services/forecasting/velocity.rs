use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::history::{DateRange, SalesDay};

/// Reported when a product has no recorded sale at all.
pub const NEVER_SOLD_DAYS: i64 = 9999;

/// Direction of week-over-week movement in sales velocity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// Trailing-window velocity for one product, derived fresh on every
/// computation and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityProfile {
    pub product_id: Uuid,
    /// Units per day, mean of the trailing 7 days.
    pub daily_velocity: f64,
    /// Unit sum over the trailing 7 days, today excluded.
    pub weekly_velocity: i64,
    /// Unit sum over the 7 days before that.
    pub prior_weekly_velocity: i64,
    pub velocity_change_pct: f64,
    pub trend: Trend,
    /// `NEVER_SOLD_DAYS` when no sale exists anywhere in the history.
    pub days_since_last_sale: i64,
    /// Days from the earliest observed sale in the fetch window through
    /// yesterday; 0 with no history. Feeds confidence scoring.
    pub history_days: i64,
}

/// Derives a velocity profile from one product's sales days.
///
/// `days` carries that product's rows for the fetch window; `last_sale`
/// comes from the dedicated last-sale query so it reflects the entire
/// recorded history rather than the window. Today's still-accumulating row
/// is excluded from both trailing weeks.
pub fn velocity_profile(
    product_id: Uuid,
    days: &[SalesDay],
    last_sale: Option<NaiveDate>,
    today: NaiveDate,
    trend_band_pct: f64,
) -> VelocityProfile {
    let yesterday = today - Duration::days(1);
    let this_week = DateRange::trailing(yesterday, 7);
    let prior_week = DateRange::trailing(today - Duration::days(8), 7);

    let weekly_velocity = sum_units(days, this_week);
    let prior_weekly_velocity = sum_units(days, prior_week);
    let daily_velocity = weekly_velocity as f64 / 7.0;

    let velocity_change_pct = if prior_weekly_velocity > 0 {
        (weekly_velocity - prior_weekly_velocity) as f64 / prior_weekly_velocity as f64 * 100.0
    } else if weekly_velocity > 0 {
        100.0
    } else {
        0.0
    };

    let trend = if velocity_change_pct > trend_band_pct {
        Trend::Increasing
    } else if velocity_change_pct < -trend_band_pct {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    let days_since_last_sale = last_sale
        .map(|date| (today - date).num_days().max(0))
        .unwrap_or(NEVER_SOLD_DAYS);

    let history_days = days
        .iter()
        .map(|day| day.date)
        .min()
        .map(|earliest| ((yesterday - earliest).num_days() + 1).max(0))
        .unwrap_or(0);

    VelocityProfile {
        product_id,
        daily_velocity,
        weekly_velocity,
        prior_weekly_velocity,
        velocity_change_pct,
        trend,
        days_since_last_sale,
        history_days,
    }
}

fn sum_units(days: &[SalesDay], range: DateRange) -> i64 {
    days.iter()
        .filter(|day| range.contains(day.date))
        .map(|day| day.units_sold)
        .sum()
}
