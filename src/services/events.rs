use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::promo_events,
    errors::ServiceError,
    services::{catalog::ProductSnapshot, history::DateRange},
};

/// Where a demand multiplier comes from.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSource {
    StoreDiscount,
    ManufacturerCampaign,
    Holiday,
}

/// A calendar-scoped demand multiplier, snapshotted for one computation.
///
/// The admin UI owns the lifecycle; the engine only ever reads a frozen set
/// of active events for a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoEvent {
    pub id: Uuid,
    pub name: String,
    pub source: EventSource,
    /// Inclusive day range.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub multiplier: f64,
    pub affected_brand: Option<String>,
    pub affected_category: Option<String>,
    /// Empty means the event is not product-scoped.
    pub affected_product_ids: Vec<Uuid>,
}

impl PromoEvent {
    pub fn covers(&self, day: NaiveDate) -> bool {
        day >= self.start_date && day <= self.end_date
    }

    pub fn overlaps(&self, range: DateRange) -> bool {
        self.start_date <= range.end && self.end_date >= range.start
    }

    /// Whether this event's scope includes the product. An event with no
    /// scope fields applies to every product; otherwise matching any one
    /// populated field is enough.
    pub fn applies_to(&self, product: &ProductSnapshot) -> bool {
        let unscoped = self.affected_brand.is_none()
            && self.affected_category.is_none()
            && self.affected_product_ids.is_empty();
        if unscoped {
            return true;
        }
        if let Some(brand) = &self.affected_brand {
            if product.brand.as_deref() == Some(brand.as_str()) {
                return true;
            }
        }
        if let Some(category) = &self.affected_category {
            if product.category == *category {
                return true;
            }
        }
        self.affected_product_ids.contains(&product.product_id)
    }
}

impl From<promo_events::Model> for PromoEvent {
    fn from(model: promo_events::Model) -> Self {
        let source = model.source.parse().unwrap_or_else(|_| {
            warn!(
                event_id = %model.id,
                source = %model.source,
                "unknown event source, treating as STORE_DISCOUNT"
            );
            EventSource::StoreDiscount
        });
        let affected_product_ids = parse_product_ids(model.affected_product_ids.as_deref());
        Self {
            id: model.id,
            name: model.name,
            source,
            start_date: model.start_date,
            end_date: model.end_date,
            multiplier: model.multiplier,
            affected_brand: model.affected_brand,
            affected_category: model.affected_category,
            affected_product_ids,
        }
    }
}

/// Pipe-separated UUID list as stored by the admin UI. Entries that do not
/// parse are dropped rather than failing the whole event.
fn parse_product_ids(raw: Option<&str>) -> Vec<Uuid> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match Uuid::parse_str(part) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(entry = part, "skipping malformed product id in event scope");
                None
            }
        })
        .collect()
}

/// Read-side contract for the promotional event calendar.
#[async_trait]
pub trait EventCalendarReader: Send + Sync {
    /// Active events whose day range overlaps `range`, ordered by start
    /// date then id.
    async fn events_overlapping(&self, range: DateRange) -> Result<Vec<PromoEvent>, ServiceError>;
}

/// `EventCalendarReader` backed by the promo_events table.
#[derive(Clone)]
pub struct SqlEventCalendar {
    db: Arc<DatabaseConnection>,
}

impl SqlEventCalendar {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventCalendarReader for SqlEventCalendar {
    async fn events_overlapping(&self, range: DateRange) -> Result<Vec<PromoEvent>, ServiceError> {
        let models = promo_events::Entity::find()
            .filter(promo_events::Column::IsActive.eq(true))
            .filter(promo_events::Column::StartDate.lte(range.end))
            .filter(promo_events::Column::EndDate.gte(range.start))
            .order_by_asc(promo_events::Column::StartDate)
            .order_by_asc(promo_events::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(models.into_iter().map(PromoEvent::from).collect())
    }
}

/// Immutable snapshot of the events relevant to one computation.
#[derive(Debug, Clone, Default)]
pub struct EventCalendar {
    events: Vec<PromoEvent>,
}

impl EventCalendar {
    pub fn new(events: Vec<PromoEvent>) -> Self {
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[PromoEvent] {
        &self.events
    }

    /// The single event applied to `product` on `day`. When several
    /// overlap, the strongest multiplier wins, then the earlier start date,
    /// then the smaller id, so repeated runs pick the same winner.
    pub fn applicable(&self, product: &ProductSnapshot, day: NaiveDate) -> Option<&PromoEvent> {
        self.events
            .iter()
            .filter(|event| event.covers(day) && event.applies_to(product))
            .min_by(|a, b| {
                b.multiplier
                    .partial_cmp(&a.multiplier)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.start_date.cmp(&b.start_date))
                    .then_with(|| a.id.cmp(&b.id))
            })
    }

    /// Events overlapping `range` and scoped to `product`, in calendar
    /// order.
    pub fn overlapping_for(
        &self,
        product: &ProductSnapshot,
        range: DateRange,
    ) -> Vec<&PromoEvent> {
        self.events
            .iter()
            .filter(|event| event.overlaps(range) && event.applies_to(product))
            .collect()
    }

    /// Whether any event in the snapshot covers `day`, regardless of scope.
    pub fn any_event_on(&self, day: NaiveDate) -> bool {
        self.events.iter().any(|event| event.covers(day))
    }
}
