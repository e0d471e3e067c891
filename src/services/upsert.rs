//! Bulk insert-or-update writes keyed by each table's natural key.
//!
//! Every function commits one batch inside its own transaction: either all
//! rows land or none do. Conflicting rows are overwritten column by column,
//! except the portfolio table where amounts merge additively.

use sea_orm::sea_query::{Alias, Expr, OnConflict};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, TransactionTrait};

use crate::entities::{coins, historical_prices, ohlc_prices, portfolio, prices};

/// Upsert coin identity rows keyed by `coin_id`.
pub async fn upsert_coins(
    db: &DatabaseConnection,
    rows: Vec<coins::ActiveModel>,
) -> Result<u64, DbErr> {
    if rows.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let affected = coins::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::column(coins::Column::CoinId)
                .update_columns([coins::Column::Symbol, coins::Column::Name])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
    txn.commit().await?;

    Ok(affected)
}

/// Upsert current-state snapshot rows keyed by `coin_id`. Every non-key
/// column is overwritten with the incoming value.
pub async fn upsert_prices(
    db: &DatabaseConnection,
    rows: Vec<prices::ActiveModel>,
) -> Result<u64, DbErr> {
    if rows.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let affected = prices::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::column(prices::Column::CoinId)
                .update_columns([
                    prices::Column::CurrentPrice,
                    prices::Column::MarketCap,
                    prices::Column::MarketCapRank,
                    prices::Column::FullyDilutedValuation,
                    prices::Column::TotalVolume,
                    prices::Column::High24h,
                    prices::Column::Low24h,
                    prices::Column::PriceChange24h,
                    prices::Column::PriceChangePercentage24h,
                    prices::Column::MarketCapChange24h,
                    prices::Column::MarketCapChangePercentage24h,
                    prices::Column::CirculatingSupply,
                    prices::Column::TotalSupply,
                    prices::Column::MaxSupply,
                    prices::Column::Ath,
                    prices::Column::AthDate,
                    prices::Column::Atl,
                    prices::Column::AtlDate,
                    prices::Column::LastUpdatedAt,
                    prices::Column::ImagePath,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
    txn.commit().await?;

    Ok(affected)
}

/// Upsert historical points keyed by `(coin_id, timestamp)`. Re-ingesting an
/// overlapping window updates values in place without duplicating keys.
pub async fn upsert_historical_prices(
    db: &DatabaseConnection,
    rows: Vec<historical_prices::ActiveModel>,
) -> Result<u64, DbErr> {
    if rows.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let affected = historical_prices::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                historical_prices::Column::CoinId,
                historical_prices::Column::Timestamp,
            ])
            .update_columns([
                historical_prices::Column::Price,
                historical_prices::Column::MarketCap,
                historical_prices::Column::Volume,
            ])
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
    txn.commit().await?;

    Ok(affected)
}

/// Upsert OHLC candles keyed by `(coin_id, timestamp)`.
pub async fn upsert_ohlc_prices(
    db: &DatabaseConnection,
    rows: Vec<ohlc_prices::ActiveModel>,
) -> Result<u64, DbErr> {
    if rows.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let affected = ohlc_prices::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                ohlc_prices::Column::CoinId,
                ohlc_prices::Column::Timestamp,
            ])
            .update_columns([
                ohlc_prices::Column::Open,
                ohlc_prices::Column::High,
                ohlc_prices::Column::Low,
                ohlc_prices::Column::Close,
            ])
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
    txn.commit().await?;

    Ok(affected)
}

/// Upsert portfolio holdings keyed by `(user_id, coin_id)`. Holdings
/// represent incremental acquisitions, so a conflicting row increments the
/// stored amount instead of replacing it.
pub async fn upsert_portfolio_entries(
    db: &DatabaseConnection,
    rows: Vec<portfolio::ActiveModel>,
) -> Result<u64, DbErr> {
    if rows.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let affected = portfolio::Entity::insert_many(rows)
        .on_conflict(portfolio_on_conflict())
        .exec_without_returning(&txn)
        .await?;
    txn.commit().await?;

    Ok(affected)
}

fn portfolio_on_conflict() -> OnConflict {
    OnConflict::columns([portfolio::Column::UserId, portfolio::Column::CoinId])
        .value(
            portfolio::Column::Amount,
            Expr::col((portfolio::Entity, portfolio::Column::Amount))
                .add(Expr::col((Alias::new("excluded"), portfolio::Column::Amount))),
        )
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait, Set};

    fn coin(id: &str) -> coins::ActiveModel {
        coins::ActiveModel {
            coin_id: Set(id.to_string()),
            symbol: Set(id[..3.min(id.len())].to_string()),
            name: Set(id.to_string()),
        }
    }

    fn holding(user_id: i32, coin_id: &str, amount: rust_decimal::Decimal) -> portfolio::ActiveModel {
        portfolio::ActiveModel {
            user_id: Set(user_id),
            coin_id: Set(coin_id.to_string()),
            amount: Set(amount),
            created_at: Set(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let affected = upsert_coins(&db, vec![]).await.unwrap();
        assert_eq!(affected, 0);

        // Nothing was executed, not even a transaction
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn coin_batch_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        let affected = upsert_coins(&db, vec![coin("bitcoin"), coin("ethereum")])
            .await
            .unwrap();
        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn persistence_error_is_surfaced() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("connection lost".to_string())])
            .into_connection();

        let result = upsert_coins(&db, vec![coin("bitcoin")]).await;
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_upsert_targets_the_coin_id_key() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let row = prices::ActiveModel {
            coin_id: Set("bitcoin".to_string()),
            current_price: Set(dec!(42000)),
            market_cap: Set(dec!(800000000000)),
            market_cap_rank: Set(Some(1)),
            fully_diluted_valuation: Set(None),
            total_volume: Set(None),
            high_24h: Set(None),
            low_24h: Set(None),
            price_change_24h: Set(None),
            price_change_percentage_24h: Set(dec!(0)),
            market_cap_change_24h: Set(None),
            market_cap_change_percentage_24h: Set(dec!(0)),
            circulating_supply: Set(None),
            total_supply: Set(None),
            max_supply: Set(None),
            ath: Set(None),
            ath_date: Set(None),
            atl: Set(None),
            atl_date: Set(None),
            last_updated_at: Set(now),
            image_path: Set(None),
        };

        let sql = prices::Entity::insert_many([row])
            .on_conflict(
                OnConflict::column(prices::Column::CoinId)
                    .update_columns([prices::Column::CurrentPrice])
                    .to_owned(),
            )
            .build(DatabaseBackend::Postgres)
            .sql;

        assert!(sql.contains("ON CONFLICT"));
        assert!(sql.contains("coin_id"));
    }

    #[test]
    fn portfolio_conflict_merges_amounts_additively() {
        let sql = portfolio::Entity::insert_many([holding(1, "bitcoin", dec!(2.5))])
            .on_conflict(portfolio_on_conflict())
            .build(DatabaseBackend::Postgres)
            .sql;

        // amount = portfolio.amount + excluded.amount, never a plain overwrite
        assert!(sql.contains(r#"ON CONFLICT ("user_id", "coin_id") DO UPDATE"#));
        assert!(sql.contains(r#"SET "amount" = "portfolio"."amount" + "excluded"."amount""#));
    }

    #[tokio::test]
    async fn portfolio_upsert_runs_single_statement_batch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();

        let affected = upsert_portfolio_entries(&db, vec![holding(7, "ethereum", dec!(1.0))])
            .await
            .unwrap();
        assert_eq!(affected, 1);
    }
}
