use crate::domain::intent::{IntentLineItem, RegistrantDetails};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Online,
    BankTransfer,
    WalkIn,
}

impl PaymentMode {
    pub fn as_db(&self) -> &'static str {
        match self {
            PaymentMode::Online => "ONLINE",
            PaymentMode::BankTransfer => "BANK_TRANSFER",
            PaymentMode::WalkIn => "WALK_IN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRecordStatus {
    Pending,
    Confirmed,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Pending => "PENDING",
            PaymentRecordStatus::Confirmed => "CONFIRMED",
            PaymentRecordStatus::Failed => "FAILED",
        }
    }
}

pub fn status_from_db(s: &str) -> PaymentRecordStatus {
    match s {
        "CONFIRMED" => PaymentRecordStatus::Confirmed,
        "FAILED" => PaymentRecordStatus::Failed,
        _ => PaymentRecordStatus::Pending,
    }
}

/// Which channel flipped a payment record to confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmingActor {
    GatewayWebhook,
    ClientPoll,
    Operator,
    TestHarness,
}

impl ConfirmingActor {
    pub fn as_db(&self) -> &'static str {
        match self {
            ConfirmingActor::GatewayWebhook => "GATEWAY_WEBHOOK",
            ConfirmingActor::ClientPoll => "CLIENT_POLL",
            ConfirmingActor::Operator => "OPERATOR",
            ConfirmingActor::TestHarness => "TEST_HARNESS",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRegistrationRequest {
    pub registrant: RegistrantDetails,
    #[serde(default)]
    pub form_data: serde_json::Value,
    pub line_items: Vec<IntentLineItem>,
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SubmitRegistrationResponse {
    CheckoutStarted {
        reference: String,
        session_id: String,
        redirect_url: String,
    },
    Registered {
        registration_id: Uuid,
        payment_record_id: Option<Uuid>,
    },
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
