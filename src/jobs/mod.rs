pub mod coins_sync;
pub mod prices_sync;
pub mod historical_sync;
pub mod ohlc_sync;
