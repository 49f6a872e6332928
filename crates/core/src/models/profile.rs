use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user settings. `main_currency` is the reporting currency every
/// valuation converts into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Same as the owning user's id.
    pub id: Uuid,
    pub nickname: Option<String>,
    pub main_currency: String,
}

impl Profile {
    pub fn new(user_id: Uuid, main_currency: impl Into<String>) -> Self {
        Self {
            id: user_id,
            nickname: None,
            main_currency: main_currency.into(),
        }
    }
}
