use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    entities::{daily_sales, promo_events, sales_transactions},
    errors::ServiceError,
};

/// Closed calendar-day range; both endpoints are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(format!(
                "invalid date range: {} is after {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `len` days ending at `end` inclusive. `len` must be at least 1.
    pub fn trailing(end: NaiveDate, len: i64) -> Self {
        Self {
            start: end - Duration::days(len - 1),
            end,
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Which products a history query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesScope {
    All,
    Product(Uuid),
}

/// One product's aggregated sales for one calendar day.
///
/// Rows for past days are immutable; the current day may still accumulate.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesDay {
    pub product_id: Uuid,
    pub date: NaiveDate,
    pub units_sold: i64,
    pub revenue: Decimal,
    /// True when an active promo or holiday overlapped this day.
    pub had_event: bool,
}

/// Read-side contract for historical sales, keyed by scope and day range.
///
/// An empty result is valid, never an error: a product with no recorded
/// sales simply forecasts to zero.
#[async_trait]
pub trait SalesHistoryReader: Send + Sync {
    /// Per-product, per-day sales for the range, ordered by (date, product).
    async fn daily_sales(
        &self,
        scope: SalesScope,
        range: DateRange,
    ) -> Result<Vec<SalesDay>, ServiceError>;

    /// Most recent day with at least one unit sold, per product, across the
    /// product's entire recorded history.
    async fn last_sale_dates(
        &self,
        scope: SalesScope,
    ) -> Result<HashMap<Uuid, NaiveDate>, ServiceError>;

    /// Store-wide revenue over the range.
    async fn revenue_between(&self, range: DateRange) -> Result<Decimal, ServiceError>;
}

#[derive(Debug, FromQueryResult)]
struct LastSaleRow {
    product_id: Uuid,
    last_sale: NaiveDate,
}

#[derive(Debug, FromQueryResult)]
struct LastSoldAtRow {
    product_id: Uuid,
    last_sale: DateTime<Utc>,
}

/// `SalesHistoryReader` backed by the relational store.
///
/// Prefers the `daily_sales` rollup. When the rollup holds no rows for the
/// requested scope and range, falls back to folding completed rows from the
/// raw `sales_transactions` ledger, attaching per-day event flags by
/// interval overlap against the active event calendar.
#[derive(Clone)]
pub struct SqlSalesHistory {
    db: Arc<DatabaseConnection>,
}

impl SqlSalesHistory {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn aggregated_sales(
        &self,
        scope: SalesScope,
        range: DateRange,
    ) -> Result<Vec<SalesDay>, ServiceError> {
        let mut query = daily_sales::Entity::find()
            .filter(daily_sales::Column::SaleDate.between(range.start, range.end));
        if let SalesScope::Product(id) = scope {
            query = query.filter(daily_sales::Column::ProductId.eq(id));
        }
        let rows = query
            .order_by_asc(daily_sales::Column::SaleDate)
            .order_by_asc(daily_sales::Column::ProductId)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| SalesDay {
                product_id: row.product_id,
                date: row.sale_date,
                units_sold: row.units_sold as i64,
                revenue: row.revenue,
                had_event: row.had_event,
            })
            .collect())
    }

    async fn folded_transactions(
        &self,
        scope: SalesScope,
        range: DateRange,
    ) -> Result<Vec<SalesDay>, ServiceError> {
        let from = range.start.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let to = (range.end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        let mut query = sales_transactions::Entity::find()
            .filter(sales_transactions::Column::Status.eq(sales_transactions::STATUS_COMPLETED))
            .filter(sales_transactions::Column::SoldAt.gte(from))
            .filter(sales_transactions::Column::SoldAt.lt(to));
        if let SalesScope::Product(id) = scope {
            query = query.filter(sales_transactions::Column::ProductId.eq(id));
        }
        let rows = query.all(&*self.db).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // BTreeMap so the output comes back ordered by (date, product) no
        // matter what order the ledger returned rows in.
        let mut folded: BTreeMap<(NaiveDate, Uuid), (i64, Decimal)> = BTreeMap::new();
        for row in rows {
            let day = row.sold_at.date_naive();
            let entry = folded
                .entry((day, row.product_id))
                .or_insert((0, Decimal::ZERO));
            entry.0 += row.quantity as i64;
            entry.1 += row.total;
        }

        let flagged = self.event_days(range).await?;
        Ok(folded
            .into_iter()
            .map(|((date, product_id), (units_sold, revenue))| SalesDay {
                product_id,
                date,
                units_sold,
                revenue,
                had_event: flagged.contains(&date),
            })
            .collect())
    }

    /// Days in the range covered by at least one active event.
    async fn event_days(&self, range: DateRange) -> Result<BTreeSet<NaiveDate>, ServiceError> {
        let events = promo_events::Entity::find()
            .filter(promo_events::Column::IsActive.eq(true))
            .filter(promo_events::Column::StartDate.lte(range.end))
            .filter(promo_events::Column::EndDate.gte(range.start))
            .all(&*self.db)
            .await?;

        let mut days = BTreeSet::new();
        for event in &events {
            for day in range.iter_days() {
                if day >= event.start_date && day <= event.end_date {
                    days.insert(day);
                }
            }
        }
        Ok(days)
    }
}

#[async_trait]
impl SalesHistoryReader for SqlSalesHistory {
    async fn daily_sales(
        &self,
        scope: SalesScope,
        range: DateRange,
    ) -> Result<Vec<SalesDay>, ServiceError> {
        let aggregated = self.aggregated_sales(scope, range).await?;
        if !aggregated.is_empty() {
            return Ok(aggregated);
        }

        debug!(
            ?scope,
            start = %range.start,
            end = %range.end,
            "daily_sales rollup empty, folding raw transactions"
        );
        self.folded_transactions(scope, range).await
    }

    async fn last_sale_dates(
        &self,
        scope: SalesScope,
    ) -> Result<HashMap<Uuid, NaiveDate>, ServiceError> {
        let mut query = daily_sales::Entity::find()
            .select_only()
            .column(daily_sales::Column::ProductId)
            .column_as(Expr::col(daily_sales::Column::SaleDate).max(), "last_sale")
            .filter(daily_sales::Column::UnitsSold.gt(0))
            .group_by(daily_sales::Column::ProductId);
        if let SalesScope::Product(id) = scope {
            query = query.filter(daily_sales::Column::ProductId.eq(id));
        }
        let rows = query.into_model::<LastSaleRow>().all(&*self.db).await?;
        if !rows.is_empty() {
            return Ok(rows
                .into_iter()
                .map(|row| (row.product_id, row.last_sale))
                .collect());
        }

        let mut query = sales_transactions::Entity::find()
            .select_only()
            .column(sales_transactions::Column::ProductId)
            .column_as(Expr::col(sales_transactions::Column::SoldAt).max(), "last_sale")
            .filter(sales_transactions::Column::Status.eq(sales_transactions::STATUS_COMPLETED))
            .filter(sales_transactions::Column::Quantity.gt(0))
            .group_by(sales_transactions::Column::ProductId);
        if let SalesScope::Product(id) = scope {
            query = query.filter(sales_transactions::Column::ProductId.eq(id));
        }
        let rows = query.into_model::<LastSoldAtRow>().all(&*self.db).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.product_id, row.last_sale.date_naive()))
            .collect())
    }

    async fn revenue_between(&self, range: DateRange) -> Result<Decimal, ServiceError> {
        let total = daily_sales::Entity::find()
            .select_only()
            .column_as(Expr::col(daily_sales::Column::Revenue).sum(), "total")
            .filter(daily_sales::Column::SaleDate.between(range.start, range.end))
            .into_tuple::<Option<Decimal>>()
            .one(&*self.db)
            .await?
            .flatten();
        if let Some(total) = total {
            return Ok(total);
        }

        let from = range.start.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let to = (range.end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let total = sales_transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(sales_transactions::Column::Total).sum(), "total")
            .filter(sales_transactions::Column::Status.eq(sales_transactions::STATUS_COMPLETED))
            .filter(sales_transactions::Column::SoldAt.gte(from))
            .filter(sales_transactions::Column::SoldAt.lt(to))
            .into_tuple::<Option<Decimal>>()
            .one(&*self.db)
            .await?
            .flatten();
        Ok(total.unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_counts_both_endpoints() {
        let range = DateRange::new(date(2025, 6, 1), date(2025, 6, 7)).unwrap();
        assert_eq!(range.days(), 7);
        assert_eq!(range.iter_days().count(), 7);
        assert!(range.contains(date(2025, 6, 1)));
        assert!(range.contains(date(2025, 6, 7)));
        assert!(!range.contains(date(2025, 6, 8)));
    }

    #[test]
    fn date_range_rejects_reversed_endpoints() {
        let result = DateRange::new(date(2025, 6, 7), date(2025, 6, 1));
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn trailing_range_ends_on_anchor_day() {
        let range = DateRange::trailing(date(2025, 6, 14), 7);
        assert_eq!(range.start, date(2025, 6, 8));
        assert_eq!(range.end, date(2025, 6, 14));
        assert_eq!(range.days(), 7);
    }

    #[test]
    fn single_day_range_is_valid() {
        let range = DateRange::new(date(2025, 6, 3), date(2025, 6, 3)).unwrap();
        assert_eq!(range.days(), 1);
        assert_eq!(range.iter_days().collect::<Vec<_>>(), vec![date(2025, 6, 3)]);
    }
}
