pub mod account;
pub mod asset;
pub mod dashboard;
pub mod holdings;
pub mod profile;
pub mod rates;
pub mod transaction;
