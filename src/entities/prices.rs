//! `SeaORM` Entity for the prices current-state table
//!
//! One row per coin holding the latest market snapshot. Each ingestion
//! cycle overwrites the row in place; history lives in historical_prices.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub coin_id: String,
    pub current_price: Decimal,
    pub market_cap: Decimal,
    pub market_cap_rank: Option<i32>,
    pub fully_diluted_valuation: Option<Decimal>,
    pub total_volume: Option<Decimal>,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    pub price_change_24h: Option<Decimal>,
    pub price_change_percentage_24h: Decimal,
    pub market_cap_change_24h: Option<Decimal>,
    pub market_cap_change_percentage_24h: Decimal,
    pub circulating_supply: Option<Decimal>,
    pub total_supply: Option<Decimal>,
    pub max_supply: Option<Decimal>,
    pub ath: Option<Decimal>,
    pub ath_date: Option<DateTimeUtc>,
    pub atl: Option<Decimal>,
    pub atl_date: Option<DateTimeUtc>,
    pub last_updated_at: DateTimeUtc,
    pub image_path: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
