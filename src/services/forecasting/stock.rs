use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ForecastPolicy;

/// Urgency tier for one product, derived from coverage days.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    DeadStock,
    Healthy,
}

impl StockStatus {
    /// Sort rank for alert lists; lower is more urgent.
    pub fn severity(self) -> u8 {
        match self {
            StockStatus::OutOfStock => 0,
            StockStatus::Critical => 1,
            StockStatus::Low => 2,
            StockStatus::DeadStock => 3,
            StockStatus::Healthy => 4,
        }
    }

    pub fn needs_reorder_attention(self) -> bool {
        matches!(
            self,
            StockStatus::OutOfStock | StockStatus::Critical | StockStatus::Low
        )
    }
}

/// Status plus the coverage figure that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockAssessment {
    pub status: StockStatus,
    /// `None` means unbounded runway, shown as "N/A" on the dashboard.
    pub days_of_stock: Option<f64>,
}

/// Maps stock and velocity onto an urgency tier. Coverage days is the
/// operational number here: a slow item with 100 units and a fast item with
/// 5 can have the same runway.
///
/// Priority order, first match wins: out of stock, dead stock, slow mover,
/// then the coverage tiers.
pub fn assess_stock(
    current_stock: i32,
    daily_velocity: f64,
    days_since_last_sale: i64,
    policy: &ForecastPolicy,
) -> StockAssessment {
    if current_stock <= 0 {
        return StockAssessment {
            status: StockStatus::OutOfStock,
            days_of_stock: Some(0.0),
        };
    }

    if daily_velocity < policy.stale_velocity_floor {
        if days_since_last_sale > policy.dead_stock_after_days {
            return StockAssessment {
                status: StockStatus::DeadStock,
                days_of_stock: None,
            };
        }
        // Slow but not dead: runway is effectively unbounded.
        return StockAssessment {
            status: StockStatus::Healthy,
            days_of_stock: None,
        };
    }

    let coverage = round_tenth(current_stock as f64 / daily_velocity);
    let status = if coverage <= policy.critical_coverage_days {
        StockStatus::Critical
    } else if coverage <= policy.low_coverage_days {
        StockStatus::Low
    } else {
        StockStatus::Healthy
    };
    StockAssessment {
        status,
        days_of_stock: Some(coverage),
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
