pub mod encoding;
pub mod price_api;
pub mod traits;
