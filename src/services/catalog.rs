use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{entities::products, errors::ServiceError};

/// Catalog and inventory state for one product at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub brand: Option<String>,
    pub category: String,
    pub current_stock: i32,
    pub cost_price: Decimal,
    pub retail_price: Decimal,
    pub is_archived: bool,
}

impl From<products::Model> for ProductSnapshot {
    fn from(model: products::Model) -> Self {
        Self {
            product_id: model.id,
            name: model.name,
            barcode: model.barcode,
            brand: model.brand,
            category: model.category,
            current_stock: model.current_stock,
            cost_price: model.cost_price,
            retail_price: model.retail_price,
            is_archived: model.is_archived,
        }
    }
}

/// Read-side contract for the product catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// One product by id, archived or not; `None` when it does not exist.
    async fn product(&self, product_id: Uuid) -> Result<Option<ProductSnapshot>, ServiceError>;

    /// Every non-archived product, ordered by name.
    async fn active_products(&self) -> Result<Vec<ProductSnapshot>, ServiceError>;
}

/// `CatalogReader` backed by the products table.
#[derive(Clone)]
pub struct SqlCatalog {
    db: Arc<DatabaseConnection>,
}

impl SqlCatalog {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogReader for SqlCatalog {
    async fn product(&self, product_id: Uuid) -> Result<Option<ProductSnapshot>, ServiceError> {
        let model = products::Entity::find_by_id(product_id).one(&*self.db).await?;
        Ok(model.map(ProductSnapshot::from))
    }

    async fn active_products(&self) -> Result<Vec<ProductSnapshot>, ServiceError> {
        let models = products::Entity::find()
            .filter(products::Column::IsArchived.eq(false))
            .order_by_asc(products::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(models.into_iter().map(ProductSnapshot::from).collect())
    }
}
