use crate::domain::intent::IntentLineItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod mock;
pub mod stripe;

/// Metadata key carrying the intent reference on every checkout session.
pub const METADATA_REFERENCE_KEY: &str = "registration_ref";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("checkout gateway unavailable: {0}")]
    Unavailable(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),
    #[error("checkout session not found: {0}")]
    SessionNotFound(String),
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
    #[error("webhook signature rejected: {0}")]
    InvalidSignature(String),
}

#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub line_items: Vec<IntentLineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionHandle {
    pub session_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Open,
    Paid,
    Failed,
    Expired,
}

/// The gateway's current view of one checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusReport {
    pub session_id: String,
    pub state: SessionState,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl SessionStatusReport {
    pub fn intent_reference(&self) -> Option<&str> {
        self.metadata.get(METADATA_REFERENCE_KEY).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub event_type: String,
    pub session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub attributes: serde_json::Value,
}

#[async_trait::async_trait]
pub trait CheckoutGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSessionHandle, GatewayError>;

    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatusReport, GatewayError>;

    fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<WebhookEvent, GatewayError>;
}
