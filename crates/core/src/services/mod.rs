pub mod asset_registry;
pub mod conversion;
pub mod dashboard;
pub mod holdings;
pub mod ledger;
pub mod rate_cache;
pub mod rate_gateway;
