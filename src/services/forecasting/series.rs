use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::{catalog::ProductSnapshot, events::EventCalendar, history::SalesDay};

/// How much history a demand series shows. The forecast horizon scales
/// with it: a quarter of history earns a month of forecast, shown weekly
/// so the chart does not imply false daily precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryWindow {
    Week,
    Month,
    Quarter,
}

struct BucketLayout {
    history_buckets: usize,
    forecast_buckets: usize,
    bucket_days: i64,
    band: f64,
}

impl HistoryWindow {
    /// Maps a requested history length in days onto a window.
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Week),
            30 => Some(Self::Month),
            90 => Some(Self::Quarter),
            _ => None,
        }
    }

    pub fn request_days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    /// Calendar days of history the series really shows. The quarter view
    /// uses 13 full weeks (91 days) so every bucket is the same width.
    pub fn history_days(self) -> i64 {
        let layout = self.layout();
        layout.bucket_days * layout.history_buckets as i64
    }

    /// Calendar days the forecast half covers.
    pub fn forecast_days(self) -> i64 {
        let layout = self.layout();
        layout.bucket_days * layout.forecast_buckets as i64
    }

    fn layout(self) -> BucketLayout {
        match self {
            Self::Week => BucketLayout {
                history_buckets: 7,
                forecast_buckets: 7,
                bucket_days: 1,
                band: 0.15,
            },
            Self::Month => BucketLayout {
                history_buckets: 30,
                forecast_buckets: 14,
                bucket_days: 1,
                band: 0.20,
            },
            Self::Quarter => BucketLayout {
                history_buckets: 13,
                forecast_buckets: 4,
                bucket_days: 7,
                band: 0.20,
            },
        }
    }
}

/// What the series measures.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DemandMetric {
    Units,
    Revenue,
}

/// Bounded multiplicative noise applied to forecast points so charted
/// projections do not render as an artificially flat line. The one
/// non-deterministic element in the engine; swap in [`NoJitter`] to make a
/// series reproducible.
pub trait JitterSource: Send + Sync {
    /// A factor in `[1 - spread, 1 + spread]`.
    fn factor(&self, spread: f64) -> f64;
}

/// Production jitter backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn factor(&self, spread: f64) -> f64 {
        if spread <= 0.0 {
            return 1.0;
        }
        rand::thread_rng().gen_range(1.0 - spread..=1.0 + spread)
    }
}

/// No jitter at all; series become fully deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn factor(&self, _spread: f64) -> f64 {
        1.0
    }
}

/// One chart bucket. `actual` and `forecast` are mutually exclusive; the
/// `bridge` annotation is set on the last historical and first forecast
/// point purely so a connecting line renders without a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DemandPoint {
    pub label: String,
    /// Bucket start day.
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<f64>,
    pub event: bool,
}

/// History-plus-forecast series for one product or the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DemandSeries {
    /// `None` means store-wide.
    pub product_id: Option<Uuid>,
    pub window: HistoryWindow,
    pub metric: DemandMetric,
    pub points: Vec<DemandPoint>,
}

/// Everything the series builder needs, already fetched and joined.
pub struct SeriesInputs<'a> {
    pub product_id: Option<Uuid>,
    pub window: HistoryWindow,
    pub metric: DemandMetric,
    pub today: NaiveDate,
    /// One entry for a product series, every active product store-wide.
    pub products: &'a [ProductSnapshot],
    /// Daily velocity per product id.
    pub velocities: &'a HashMap<Uuid, f64>,
    /// History rows for the scope; anything outside the shown window is
    /// ignored.
    pub history: &'a [SalesDay],
    pub calendar: &'a EventCalendar,
    pub jitter_spread: f64,
}

#[derive(Default)]
struct DayTotals {
    units: f64,
    revenue: f64,
    event: bool,
}

/// Assembles the chart series: zero-filled actuals through yesterday, then
/// event-aware projections from today forward, with confidence bands and
/// the bridge annotation stitching the halves together.
pub fn build_series(inputs: &SeriesInputs<'_>, jitter: &dyn JitterSource) -> DemandSeries {
    let layout = inputs.window.layout();
    let mut points = Vec::with_capacity(layout.history_buckets + layout.forecast_buckets);

    let mut by_day: HashMap<NaiveDate, DayTotals> = HashMap::new();
    for row in inputs.history {
        let entry = by_day.entry(row.date).or_default();
        entry.units += row.units_sold as f64;
        entry.revenue += row.revenue.to_f64().unwrap_or(0.0);
        entry.event |= row.had_event;
    }

    let history_start = inputs.today - Duration::days(inputs.window.history_days());
    for bucket in 0..layout.history_buckets {
        let start = history_start + Duration::days(bucket as i64 * layout.bucket_days);
        let mut value = 0.0;
        let mut event = false;
        for offset in 0..layout.bucket_days {
            if let Some(totals) = by_day.get(&(start + Duration::days(offset))) {
                value += match inputs.metric {
                    DemandMetric::Units => totals.units,
                    DemandMetric::Revenue => totals.revenue,
                };
                event |= totals.event;
            }
        }
        points.push(DemandPoint {
            label: bucket_label(start, layout.bucket_days),
            date: start,
            actual: Some(value),
            forecast: None,
            lower: None,
            upper: None,
            bridge: None,
            event,
        });
    }

    for bucket in 0..layout.forecast_buckets {
        let start = inputs.today + Duration::days(bucket as i64 * layout.bucket_days);
        let mut value = 0.0;
        let mut event = false;
        for offset in 0..layout.bucket_days {
            let day = start + Duration::days(offset);
            for product in inputs.products {
                let base = inputs
                    .velocities
                    .get(&product.product_id)
                    .copied()
                    .unwrap_or(0.0);
                let applied = inputs.calendar.applicable(product, day);
                if let Some(event_match) = applied {
                    event = true;
                    value += projected(inputs.metric, base * event_match.multiplier, product);
                } else {
                    value += projected(inputs.metric, base, product);
                }
            }
        }
        let value = (value * jitter.factor(inputs.jitter_spread)).round().max(0.0);
        let upper = (value * (1.0 + layout.band)).round();
        let lower = (value * (1.0 - layout.band)).round().max(0.0);
        points.push(DemandPoint {
            label: bucket_label(start, layout.bucket_days),
            date: start,
            actual: None,
            forecast: Some(value),
            lower: Some(lower),
            upper: Some(upper),
            bridge: None,
            event,
        });
    }

    if layout.history_buckets > 0 && layout.forecast_buckets > 0 {
        let last_actual = layout.history_buckets - 1;
        points[last_actual].bridge = points[last_actual].actual;
        points[layout.history_buckets].bridge = points[layout.history_buckets].forecast;
    }

    DemandSeries {
        product_id: inputs.product_id,
        window: inputs.window,
        metric: inputs.metric,
        points,
    }
}

fn projected(metric: DemandMetric, daily_units: f64, product: &ProductSnapshot) -> f64 {
    match metric {
        DemandMetric::Units => daily_units,
        DemandMetric::Revenue => daily_units * product.retail_price.to_f64().unwrap_or(0.0),
    }
}

fn bucket_label(start: NaiveDate, bucket_days: i64) -> String {
    if bucket_days == 1 {
        start.format("%b %-d").to_string()
    } else {
        format!("Wk of {}", start.format("%b %-d"))
    }
}
