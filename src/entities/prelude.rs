pub use super::coins::Entity as Coins;
pub use super::historical_prices::Entity as HistoricalPrices;
pub use super::ohlc_prices::Entity as OhlcPrices;
pub use super::portfolio::Entity as Portfolio;
pub use super::prices::Entity as Prices;
pub use super::users::Entity as Users;
