use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prices::CoinId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Prices::CurrentPrice)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prices::MarketCap)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prices::MarketCapRank)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::FullyDilutedValuation)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::TotalVolume)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::High24h)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::Low24h)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::PriceChange24h)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::PriceChangePercentage24h)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prices::MarketCapChange24h)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::MarketCapChangePercentage24h)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prices::CirculatingSupply)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::TotalSupply)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::MaxSupply)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::Ath)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::AthDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::Atl)
                            .decimal()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::AtlDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Prices::LastUpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prices::ImagePath)
                            .string()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for market cap ordered listings
        manager
            .create_index(
                Index::create()
                    .name("idx_prices_market_cap")
                    .table(Prices::Table)
                    .col(Prices::MarketCap)
                    .to_owned(),
            )
            .await?;

        // Index for gainers/losers ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_prices_change_pct_24h")
                    .table(Prices::Table)
                    .col(Prices::PriceChangePercentage24h)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Prices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Prices {
    Table,
    CoinId,
    CurrentPrice,
    MarketCap,
    MarketCapRank,
    FullyDilutedValuation,
    TotalVolume,
    High24h,
    Low24h,
    PriceChange24h,
    PriceChangePercentage24h,
    MarketCapChange24h,
    MarketCapChangePercentage24h,
    CirculatingSupply,
    TotalSupply,
    MaxSupply,
    Ath,
    AthDate,
    Atl,
    AtlDate,
    LastUpdatedAt,
    ImagePath,
}
