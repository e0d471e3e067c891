//! `SeaORM` Entity for historical_prices
//!
//! Append/merge only; the (coin_id, timestamp) key keeps overlapping
//! re-ingestion windows idempotent.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "historical_prices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub coin_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub timestamp: DateTimeUtc,
    pub price: Decimal,
    pub market_cap: Option<Decimal>,
    pub volume: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
