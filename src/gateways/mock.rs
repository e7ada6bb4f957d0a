use crate::gateways::{
    CheckoutGateway, CheckoutSessionHandle, CreateSessionRequest, GatewayError, SessionState,
    SessionStatusReport, WebhookEvent, METADATA_REFERENCE_KEY,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory gateway for tests and local runs. Sessions start `open`;
/// `set_state` scripts the outcome a real buyer would produce.
#[derive(Default)]
pub struct MockCheckoutGateway {
    sessions: Mutex<HashMap<String, SessionStatusReport>>,
}

impl MockCheckoutGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, session_id: &str, state: SessionState) {
        let mut sessions = self.sessions.lock().expect("mock session map poisoned");
        if let Some(report) = sessions.get_mut(session_id) {
            report.state = state;
            if state == SessionState::Paid && report.payment_id.is_none() {
                report.payment_id = Some(format!("pi_mock_{}", uuid::Uuid::new_v4().simple()));
            }
        }
    }
}

#[async_trait::async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSessionHandle, GatewayError> {
        if request.amount_minor <= 0 {
            return Err(GatewayError::InvalidAmount(request.amount_minor));
        }

        let session_id = format!("cs_mock_{}", uuid::Uuid::new_v4().simple());
        let mut metadata = HashMap::new();
        metadata.insert(METADATA_REFERENCE_KEY.to_string(), request.reference.clone());

        let report = SessionStatusReport {
            session_id: session_id.clone(),
            state: SessionState::Open,
            payment_id: None,
            payment_method: Some("card".to_string()),
            reference_number: Some(request.reference),
            metadata,
        };
        self.sessions
            .lock()
            .expect("mock session map poisoned")
            .insert(session_id.clone(), report);

        Ok(CheckoutSessionHandle {
            redirect_url: format!("https://checkout.mock.local/pay/{session_id}"),
            session_id,
        })
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatusReport, GatewayError> {
        self.sessions
            .lock()
            .expect("mock session map poisoned")
            .get(session_id)
            .cloned()
            .ok_or_else(|| GatewayError::SessionNotFound(session_id.to_string()))
    }

    fn parse_webhook(
        &self,
        payload: &[u8],
        _signature_header: Option<&str>,
    ) -> Result<WebhookEvent, GatewayError> {
        let v: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;
        let event_type = v
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| GatewayError::MalformedPayload("event type missing".to_string()))?
            .to_string();
        let object = v.pointer("/data/object").cloned().unwrap_or(serde_json::Value::Null);

        Ok(WebhookEvent {
            session_id: if event_type.starts_with("checkout.session.") {
                object.get("id").and_then(|id| id.as_str()).map(ToString::to_string)
            } else {
                None
            },
            payment_intent_id: object
                .get("payment_intent")
                .and_then(|p| p.as_str())
                .map(ToString::to_string),
            event_type,
            attributes: object,
        })
    }
}
