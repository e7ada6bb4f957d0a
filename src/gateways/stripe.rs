use crate::gateways::{
    CheckoutGateway, CheckoutSessionHandle, CreateSessionRequest, GatewayError, SessionState,
    SessionStatusReport, WebhookEvent, METADATA_REFERENCE_KEY,
};
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use sha2::Sha256;
use std::collections::HashMap;

const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct StripeCheckoutGateway {
    pub base_url: String,
    pub secret_key: String,
    pub webhook_secret: Option<String>,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

#[async_trait::async_trait]
impl CheckoutGateway for StripeCheckoutGateway {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSessionHandle, GatewayError> {
        if request.amount_minor <= 0 {
            return Err(GatewayError::InvalidAmount(request.amount_minor));
        }

        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("client_reference_id".to_string(), request.reference.clone()),
            (
                format!("metadata[{}]", METADATA_REFERENCE_KEY),
                request.reference.clone(),
            ),
        ];
        for (i, item) in request.line_items.iter().enumerate() {
            params.push((format!("line_items[{i}][quantity]"), "1".to_string()));
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                request.currency.to_lowercase(),
            ));
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_price_minor.to_string(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
        }

        let url = format!("{}/v1/checkout/sessions", self.base_url);
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&params)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => {
                let v: serde_json::Value = r
                    .json()
                    .await
                    .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
                let session_id = v
                    .get("id")
                    .and_then(|id| id.as_str())
                    .ok_or_else(|| GatewayError::Unavailable("session id missing in response".to_string()))?
                    .to_string();
                let redirect_url = v
                    .get("url")
                    .and_then(|u| u.as_str())
                    .ok_or_else(|| GatewayError::Unavailable("redirect url missing in response".to_string()))?
                    .to_string();
                Ok(CheckoutSessionHandle {
                    session_id,
                    redirect_url,
                })
            }
            Ok(r) => {
                let status = r.status();
                let body = r.text().await.unwrap_or_default();
                Err(GatewayError::Unavailable(format!(
                    "HTTP_{}: {}",
                    status.as_u16(),
                    body.chars().take(200).collect::<String>()
                )))
            }
            Err(e) if e.is_timeout() => Err(GatewayError::Unavailable("gateway timeout".to_string())),
            Err(e) => Err(GatewayError::Unavailable(e.to_string())),
        }
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionStatusReport, GatewayError> {
        let url = format!("{}/v1/checkout/sessions/{}", self.base_url, session_id);
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => {
                let v: serde_json::Value = r
                    .json()
                    .await
                    .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
                Ok(report_from_session_object(session_id, &v))
            }
            Ok(r) if r.status() == StatusCode::NOT_FOUND => {
                Err(GatewayError::SessionNotFound(session_id.to_string()))
            }
            Ok(r) => {
                let status = r.status();
                let body = r.text().await.unwrap_or_default();
                Err(GatewayError::Unavailable(format!(
                    "HTTP_{}: {}",
                    status.as_u16(),
                    body.chars().take(200).collect::<String>()
                )))
            }
            Err(e) if e.is_timeout() => Err(GatewayError::Unavailable("gateway timeout".to_string())),
            Err(e) => Err(GatewayError::Unavailable(e.to_string())),
        }
    }

    fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<WebhookEvent, GatewayError> {
        if let Some(secret) = &self.webhook_secret {
            let header = signature_header
                .ok_or_else(|| GatewayError::InvalidSignature("missing signature header".to_string()))?;
            verify_signature(payload, header, secret, chrono::Utc::now().timestamp())?;
        }

        let v: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;
        let event_type = v
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| GatewayError::MalformedPayload("event type missing".to_string()))?
            .to_string();

        let object = v.pointer("/data/object").cloned().unwrap_or(serde_json::Value::Null);
        let session_id = if event_type.starts_with("checkout.session.") {
            object.get("id").and_then(|id| id.as_str()).map(ToString::to_string)
        } else {
            None
        };
        let payment_intent_id = object
            .get("payment_intent")
            .and_then(|p| p.as_str())
            .map(ToString::to_string);

        Ok(WebhookEvent {
            event_type,
            session_id,
            payment_intent_id,
            attributes: object,
        })
    }
}

fn report_from_session_object(session_id: &str, v: &serde_json::Value) -> SessionStatusReport {
    let status = v.get("status").and_then(|s| s.as_str()).unwrap_or("open");
    let payment_status = v
        .get("payment_status")
        .and_then(|s| s.as_str())
        .unwrap_or("unpaid");

    let metadata: HashMap<String, String> = v
        .get("metadata")
        .and_then(|m| m.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, val)| val.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    SessionStatusReport {
        session_id: session_id.to_string(),
        state: map_session_state(status, payment_status),
        payment_id: v
            .get("payment_intent")
            .and_then(|p| p.as_str())
            .map(ToString::to_string),
        payment_method: v
            .pointer("/payment_method_types/0")
            .and_then(|p| p.as_str())
            .map(ToString::to_string),
        reference_number: v
            .get("client_reference_id")
            .and_then(|r| r.as_str())
            .map(ToString::to_string),
        metadata,
    }
}

fn map_session_state(status: &str, payment_status: &str) -> SessionState {
    if payment_status == "paid" || payment_status == "no_payment_required" {
        return SessionState::Paid;
    }
    match status {
        "expired" => SessionState::Expired,
        // the session finished without the payment ever landing
        "complete" => SessionState::Failed,
        _ => SessionState::Open,
    }
}

pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_epoch: i64,
) -> Result<(), GatewayError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => signature = Some(v),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| GatewayError::InvalidSignature("timestamp missing".to_string()))?;
    let signature = signature
        .ok_or_else(|| GatewayError::InvalidSignature("v1 signature missing".to_string()))?;
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| GatewayError::InvalidSignature("unparseable timestamp".to_string()))?;
    if (now_epoch - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(GatewayError::InvalidSignature("timestamp outside tolerance".to_string()));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::InvalidSignature("bad signing secret".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if expected != signature {
        return Err(GatewayError::InvalidSignature("digest mismatch".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_wins_over_session_status() {
        assert_eq!(map_session_state("complete", "paid"), SessionState::Paid);
        assert_eq!(map_session_state("open", "paid"), SessionState::Paid);
    }

    #[test]
    fn unpaid_complete_is_failed() {
        assert_eq!(map_session_state("complete", "unpaid"), SessionState::Failed);
    }

    #[test]
    fn expired_and_open_map_directly() {
        assert_eq!(map_session_state("expired", "unpaid"), SessionState::Expired);
        assert_eq!(map_session_state("open", "unpaid"), SessionState::Open);
    }
}
