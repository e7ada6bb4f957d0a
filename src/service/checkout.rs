use crate::domain::intent::RegistrationIntent;
use crate::domain::registration::{
    ErrorEnvelope, ErrorPayload, PaymentMode, SubmitRegistrationRequest,
    SubmitRegistrationResponse,
};
use crate::gateways::{CheckoutGateway, CreateSessionRequest, GatewayError};
use crate::intents::IntentStore;
use crate::service::materializer::{MaterializeOutcome, PaymentAttributes, RegistrationMaterializer};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Submission orchestration: online registrations become an intent plus a
/// checkout session; offline ones are materialized eagerly with a pending
/// payment record awaiting the operator.
#[derive(Clone)]
pub struct CheckoutService {
    pub gateway: Arc<dyn CheckoutGateway>,
    pub intents: Arc<dyn IntentStore>,
    pub materializer: RegistrationMaterializer,
    pub currency: String,
    pub intent_ttl_secs: u64,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutService {
    pub async fn submit(
        &self,
        req: SubmitRegistrationRequest,
    ) -> Result<SubmitRegistrationResponse, (StatusCode, ErrorEnvelope)> {
        validate_request(&req)?;
        let amount_minor: i64 = req.line_items.iter().map(|i| i.unit_price_minor).sum();

        match req.payment_mode {
            PaymentMode::Online => self.start_checkout(req, amount_minor).await,
            PaymentMode::BankTransfer | PaymentMode::WalkIn => {
                self.register_offline(req, amount_minor).await
            }
        }
    }

    async fn start_checkout(
        &self,
        req: SubmitRegistrationRequest,
        amount_minor: i64,
    ) -> Result<SubmitRegistrationResponse, (StatusCode, ErrorEnvelope)> {
        let now = Utc::now();
        let intent = RegistrationIntent {
            reference: format!("reg_{}", Uuid::new_v4().simple()),
            registrant: req.registrant,
            form_data: req.form_data,
            line_items: req.line_items,
            amount_minor,
            currency: self.currency.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(self.intent_ttl_secs as i64),
        };

        self.intents.put(&intent).await.map_err(internal)?;

        let session = self
            .gateway
            .create_session(CreateSessionRequest {
                reference: intent.reference.clone(),
                amount_minor,
                currency: self.currency.clone(),
                line_items: intent.line_items.clone(),
                success_url: self.success_url.clone(),
                cancel_url: self.cancel_url.clone(),
            })
            .await
            .map_err(gateway_error)?;

        tracing::info!(
            reference = %intent.reference,
            session_id = %session.session_id,
            amount_minor,
            "checkout session created"
        );

        Ok(SubmitRegistrationResponse::CheckoutStarted {
            reference: intent.reference,
            session_id: session.session_id,
            redirect_url: session.redirect_url,
        })
    }

    async fn register_offline(
        &self,
        req: SubmitRegistrationRequest,
        amount_minor: i64,
    ) -> Result<SubmitRegistrationResponse, (StatusCode, ErrorEnvelope)> {
        let now = Utc::now();
        // never stored: offline submissions materialize in the same call
        let intent = RegistrationIntent {
            reference: format!("offline_{}", Uuid::new_v4().simple()),
            registrant: req.registrant,
            form_data: req.form_data,
            line_items: req.line_items,
            amount_minor,
            currency: self.currency.clone(),
            created_at: now,
            expires_at: now,
        };

        let outcome = self
            .materializer
            .materialize(&intent, PaymentAttributes::pending_offline(req.payment_mode))
            .await
            .map_err(internal)?;

        match outcome {
            MaterializeOutcome::Created {
                registration_id,
                payment_record_id,
            } => Ok(SubmitRegistrationResponse::Registered {
                registration_id,
                payment_record_id: Some(payment_record_id),
            }),
            MaterializeOutcome::Existing { registration_id } => {
                Ok(SubmitRegistrationResponse::Registered {
                    registration_id,
                    payment_record_id: None,
                })
            }
        }
    }
}

fn validate_request(req: &SubmitRegistrationRequest) -> Result<(), (StatusCode, ErrorEnvelope)> {
    if req.registrant.email.trim().is_empty() || !req.registrant.email.contains('@') {
        return Err((
            StatusCode::BAD_REQUEST,
            err("INVALID_EMAIL", "registrant email is required"),
        ));
    }
    if req.line_items.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            err("NO_LINE_ITEMS", "at least one line item is required"),
        ));
    }
    let total: i64 = req.line_items.iter().map(|i| i.unit_price_minor).sum();
    if total <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            err("INVALID_AMOUNT", "line item total must be > 0"),
        ));
    }
    Ok(())
}

fn gateway_error(e: GatewayError) -> (StatusCode, ErrorEnvelope) {
    match e {
        GatewayError::InvalidAmount(_) => (
            StatusCode::BAD_REQUEST,
            err("INVALID_AMOUNT", &e.to_string()),
        ),
        GatewayError::Unavailable(_) => (
            StatusCode::BAD_GATEWAY,
            err("GATEWAY_UNAVAILABLE", "checkout gateway unreachable, retry shortly"),
        ),
        other => internal(other.into()),
    }
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}

pub fn internal(e: anyhow::Error) -> (StatusCode, ErrorEnvelope) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        err("INTERNAL_ERROR", &e.to_string()),
    )
}
