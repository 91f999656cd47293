use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::stock::StockStatus;
use super::velocity::{Trend, VelocityProfile};
use crate::services::catalog::ProductSnapshot;

const TREND_CHANGE_PCT: f64 = 20.0;
const TREND_MIN_WEEKLY_UNITS: i64 = 5;
const REVENUE_SHIFT_PCT: f64 = 10.0;
const DEAD_STOCK_SCORE_WEIGHT: f64 = 15.0;
const MAX_INSIGHTS: usize = 4;

/// Insight categories shown on the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightKind {
    TrendingUp,
    TrendingDown,
    RevenueShift,
    DeadStock,
    Steady,
}

/// One ranked, human-readable observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Insight {
    pub kind: InsightKind,
    pub headline: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    /// Ranking weight only; not shown to users.
    pub score: f64,
}

/// Per-product input row for insight generation.
pub struct InsightContext<'a> {
    pub snapshot: &'a ProductSnapshot,
    pub profile: &'a VelocityProfile,
    pub status: StockStatus,
}

/// Scans every product's velocity plus month-over-month revenue and keeps
/// the strongest observations, at most [`MAX_INSIGHTS`]. Never returns an
/// empty list: a quiet store gets the single steady-state insight.
pub fn generate_insights(
    rows: &[InsightContext<'_>],
    mtd_revenue: Decimal,
    prior_mtd_revenue: Decimal,
) -> Vec<Insight> {
    let mut candidates = Vec::new();

    if let Some(insight) = fastest_riser(rows) {
        candidates.push(insight);
    }
    if let Some(insight) = steepest_decliner(rows) {
        candidates.push(insight);
    }
    if let Some(insight) = revenue_shift(mtd_revenue, prior_mtd_revenue) {
        candidates.push(insight);
    }
    if let Some(insight) = dead_stock_watch(rows) {
        candidates.push(insight);
    }

    if candidates.is_empty() {
        return vec![Insight {
            kind: InsightKind::Steady,
            headline: "Sales are steady".into(),
            detail: "No standout movers or slumps this period.".into(),
            product_id: None,
            score: 0.0,
        }];
    }

    // Stable sort: equal scores keep category order.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(MAX_INSIGHTS);
    candidates
}

fn fastest_riser(rows: &[InsightContext<'_>]) -> Option<Insight> {
    rows.iter()
        .filter(|row| {
            row.profile.trend == Trend::Increasing
                && row.profile.weekly_velocity >= TREND_MIN_WEEKLY_UNITS
                && row.profile.velocity_change_pct >= TREND_CHANGE_PCT
        })
        .max_by(|a, b| {
            a.profile
                .velocity_change_pct
                .partial_cmp(&b.profile.velocity_change_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|row| Insight {
            kind: InsightKind::TrendingUp,
            headline: format!("{} is on the rise", row.snapshot.name),
            detail: format!(
                "Sold {} units this week, up {:.0}% week over week.",
                row.profile.weekly_velocity, row.profile.velocity_change_pct
            ),
            product_id: Some(row.snapshot.product_id),
            score: row.profile.velocity_change_pct,
        })
}

fn steepest_decliner(rows: &[InsightContext<'_>]) -> Option<Insight> {
    rows.iter()
        .filter(|row| {
            row.profile.trend == Trend::Decreasing
                && row.profile.prior_weekly_velocity >= TREND_MIN_WEEKLY_UNITS
                && row.profile.velocity_change_pct <= -TREND_CHANGE_PCT
        })
        .min_by(|a, b| {
            a.profile
                .velocity_change_pct
                .partial_cmp(&b.profile.velocity_change_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|row| Insight {
            kind: InsightKind::TrendingDown,
            headline: format!("{} is slowing down", row.snapshot.name),
            detail: format!(
                "Weekly sales fell {:.0}%, from {} to {} units.",
                row.profile.velocity_change_pct.abs(),
                row.profile.prior_weekly_velocity,
                row.profile.weekly_velocity
            ),
            product_id: Some(row.snapshot.product_id),
            score: row.profile.velocity_change_pct.abs(),
        })
}

fn revenue_shift(current: Decimal, prior: Decimal) -> Option<Insight> {
    let change_pct = if prior > Decimal::ZERO {
        ((current - prior) / prior * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0)
    } else if current > Decimal::ZERO {
        100.0
    } else {
        0.0
    };

    if change_pct.abs() < REVENUE_SHIFT_PCT {
        return None;
    }

    let direction = if change_pct >= 0.0 { "up" } else { "down" };
    Some(Insight {
        kind: InsightKind::RevenueShift,
        headline: format!(
            "Revenue is {} {:.0}% month over month",
            direction,
            change_pct.abs()
        ),
        detail: format!(
            "\u{20B1}{} so far this month vs \u{20B1}{} over the same days last month.",
            current.round_dp(2),
            prior.round_dp(2)
        ),
        product_id: None,
        score: change_pct.abs(),
    })
}

fn dead_stock_watch(rows: &[InsightContext<'_>]) -> Option<Insight> {
    let dead: Vec<&InsightContext<'_>> = rows
        .iter()
        .filter(|row| row.status == StockStatus::DeadStock)
        .collect();
    if dead.is_empty() {
        return None;
    }

    let capital: Decimal = dead
        .iter()
        .map(|row| row.snapshot.cost_price * Decimal::from(row.snapshot.current_stock))
        .sum();
    let names: Vec<&str> = dead.iter().map(|row| row.snapshot.name.as_str()).collect();

    let headline = if dead.len() == 1 {
        "1 product is gathering dust".to_string()
    } else {
        format!("{} products are gathering dust", dead.len())
    };
    Some(Insight {
        kind: InsightKind::DeadStock,
        headline,
        detail: format!(
            "No recent sales for {}; \u{20B1}{} sits in shelf stock.",
            name_list(&names),
            capital.round_dp(2)
        ),
        product_id: None,
        score: DEAD_STOCK_SCORE_WEIGHT * dead.len() as f64,
    })
}

/// "A", "A and B", "A, B and C", "A, B, C and 2 more".
fn name_list(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{} and {}", first, second),
        [first, second, third] => format!("{}, {} and {}", first, second, third),
        [first, second, third, rest @ ..] => format!(
            "{}, {}, {} and {} more",
            first,
            second,
            third,
            rest.len()
        ),
    }
}
