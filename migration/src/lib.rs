pub use sea_orm_migration::prelude::*;

mod m20250801_000001_create_coins;
mod m20250801_000002_create_prices;
mod m20250801_000003_create_historical_prices;
mod m20250801_000004_create_ohlc_prices;
mod m20250801_000005_create_users;
mod m20250801_000006_create_portfolio;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_coins::Migration),
            Box::new(m20250801_000002_create_prices::Migration),
            Box::new(m20250801_000003_create_historical_prices::Migration),
            Box::new(m20250801_000004_create_ohlc_prices::Migration),
            Box::new(m20250801_000005_create_users::Migration),
            Box::new(m20250801_000006_create_portfolio::Migration),
        ]
    }
}
