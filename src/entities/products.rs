use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Catalog product with its live stock level.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// EAN/UPC as scanned at the till
    pub barcode: Option<String>,

    pub brand: Option<String>,

    pub category: String,

    pub cost_price: Decimal,

    pub retail_price: Decimal,

    /// Units on hand right now
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub current_stock: i32,

    /// Archived products are excluded from forecasts and dashboards
    pub is_archived: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::daily_sales::Entity")]
    DailySales,
    #[sea_orm(has_many = "super::sales_transactions::Entity")]
    SalesTransactions,
}

impl Related<super::daily_sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailySales.def()
    }
}

impl Related<super::sales_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesTransactions.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.is_archived {
                active_model.is_archived = Set(false);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
