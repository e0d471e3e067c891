use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OhlcPrices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OhlcPrices::CoinId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OhlcPrices::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OhlcPrices::Open)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OhlcPrices::High)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OhlcPrices::Low)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OhlcPrices::Close)
                            .decimal()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_ohlc_prices")
                            .col(OhlcPrices::CoinId)
                            .col(OhlcPrices::Timestamp),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OhlcPrices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OhlcPrices {
    Table,
    CoinId,
    Timestamp,
    Open,
    High,
    Low,
    Close,
}
