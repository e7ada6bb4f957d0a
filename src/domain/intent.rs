use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrantDetails {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentLineItem {
    pub item_code: String,
    pub name: String,
    pub event_date: Option<NaiveDate>,
    pub unit_price_minor: i64,
    pub category: String,
}

/// A submitted-but-unpaid registration. Lives only in the intent store
/// until payment confirms or the TTL elapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationIntent {
    pub reference: String,
    pub registrant: RegistrantDetails,
    pub form_data: serde_json::Value,
    pub line_items: Vec<IntentLineItem>,
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RegistrationIntent {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
