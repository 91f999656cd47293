use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SalesTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SalesTransactions::ProductId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesTransactions::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesTransactions::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesTransactions::Total)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesTransactions::Status)
                            .string_len(32)
                            .not_null()
                            .default("completed"),
                    )
                    .col(
                        ColumnDef::new(SalesTransactions::PaymentMethod)
                            .string_len(32)
                            .not_null()
                            .default("CASH"),
                    )
                    .col(
                        ColumnDef::new(SalesTransactions::SoldAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_transactions_product_id")
                            .from(SalesTransactions::Table, SalesTransactions::ProductId)
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

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_transactions_product_sold_at")
                    .table(SalesTransactions::Table)
                    .col(SalesTransactions::ProductId)
                    .col(SalesTransactions::SoldAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_transactions_sold_at")
                    .table(SalesTransactions::Table)
                    .col(SalesTransactions::SoldAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SalesTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SalesTransactions {
    Table,
    Id,
    ProductId,
    Quantity,
    UnitPrice,
    Total,
    Status,
    PaymentMethod,
    SoldAt,
}
