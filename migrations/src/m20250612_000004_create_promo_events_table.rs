use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromoEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromoEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PromoEvents::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(PromoEvents::Source)
                            .string_len(32)
                            .not_null()
                            .default("STORE_DISCOUNT"),
                    )
                    .col(ColumnDef::new(PromoEvents::StartDate).date().not_null())
                    .col(ColumnDef::new(PromoEvents::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(PromoEvents::Multiplier)
                            .double()
                            .not_null()
                            .default(2.0),
                    )
                    .col(
                        ColumnDef::new(PromoEvents::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PromoEvents::AffectedBrand)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PromoEvents::AffectedCategory)
                            .string_len(100)
                            .null(),
                    )
                    // Pipe-separated product UUID list; empty/null means not
                    // product-scoped.
                    .col(ColumnDef::new(PromoEvents::AffectedProductIds).text().null())
                    .col(
                        ColumnDef::new(PromoEvents::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PromoEvents::UpdatedAt)
                            .timestamp()
                            .null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_promo_events_dates")
                    .table(PromoEvents::Table)
                    .col(PromoEvents::StartDate)
                    .col(PromoEvents::EndDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_promo_events_is_active")
                    .table(PromoEvents::Table)
                    .col(PromoEvents::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromoEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PromoEvents {
    Table,
    Id,
    Name,
    Source,
    StartDate,
    EndDate,
    Multiplier,
    IsActive,
    AffectedBrand,
    AffectedCategory,
    AffectedProductIds,
    CreatedAt,
    UpdatedAt,
}
