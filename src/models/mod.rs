pub mod auth;
pub mod coin;
pub mod common;
pub mod historical;
pub mod portfolio;
