use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HistoricalPrices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HistoricalPrices::CoinId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistoricalPrices::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistoricalPrices::Price)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistoricalPrices::MarketCap)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(HistoricalPrices::Volume)
                            .decimal()
                            .null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_historical_prices")
                            .col(HistoricalPrices::CoinId)
                            .col(HistoricalPrices::Timestamp),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for time range scans per coin
        manager
            .create_index(
                Index::create()
                    .name("idx_historical_prices_coin_ts")
                    .table(HistoricalPrices::Table)
                    .col(HistoricalPrices::CoinId)
                    .col(HistoricalPrices::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HistoricalPrices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HistoricalPrices {
    Table,
    CoinId,
    Timestamp,
    Price,
    MarketCap,
    Volume,
}
