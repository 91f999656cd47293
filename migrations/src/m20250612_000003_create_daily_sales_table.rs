use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailySales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailySales::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DailySales::ProductId).uuid().not_null())
                    .col(ColumnDef::new(DailySales::SaleDate).date().not_null())
                    .col(
                        ColumnDef::new(DailySales::UnitsSold)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DailySales::Revenue)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(DailySales::HadEvent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_sales_product_id")
                            .from(DailySales::Table, DailySales::ProductId)
                            .to(
                                super::m20250612_000001_create_products_table::Products::Table,
                                super::m20250612_000001_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One aggregate row per product per calendar day.
        manager
            .create_index(
                Index::create()
                    .name("uq_daily_sales_product_date")
                    .table(DailySales::Table)
                    .col(DailySales::ProductId)
                    .col(DailySales::SaleDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_daily_sales_sale_date")
                    .table(DailySales::Table)
                    .col(DailySales::SaleDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailySales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DailySales {
    Table,
    Id,
    ProductId,
    SaleDate,
    UnitsSold,
    Revenue,
    HadEvent,
}
