use hmac::{Hmac, Mac};
use registration_payments::gateways::stripe::{verify_signature, StripeCheckoutGateway};
use registration_payments::gateways::{CheckoutGateway, GatewayError};
use sha2::Sha256;

const SECRET: &str = "whsec_test123secret456";

fn gateway(webhook_secret: Option<&str>) -> StripeCheckoutGateway {
    StripeCheckoutGateway {
        base_url: "https://api.stripe.test".to_string(),
        secret_key: "sk_test_xxx".to_string(),
        webhook_secret: webhook_secret.map(ToString::to_string),
        timeout_ms: 1000,
        client: reqwest::Client::new(),
    }
}

fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[test]
fn completed_event_yields_session_and_payment_ids() {
    let payload = br#"{
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_123", "payment_intent": "pi_456"}}
    }"#;

    let event = gateway(None).parse_webhook(payload, None).unwrap();
    assert_eq!(event.event_type, "checkout.session.completed");
    assert_eq!(event.session_id.as_deref(), Some("cs_123"));
    assert_eq!(event.payment_intent_id.as_deref(), Some("pi_456"));
}

#[test]
fn non_session_event_carries_no_session_id() {
    let payload = br#"{
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_456"}}
    }"#;

    let event = gateway(None).parse_webhook(payload, None).unwrap();
    assert!(event.session_id.is_none());
}

#[test]
fn unparseable_payload_is_rejected() {
    let result = gateway(None).parse_webhook(b"not json at all", None);
    assert!(matches!(result, Err(GatewayError::MalformedPayload(_))));
}

#[test]
fn payload_without_event_type_is_rejected() {
    let result = gateway(None).parse_webhook(br#"{"data": {}}"#, None);
    assert!(matches!(result, Err(GatewayError::MalformedPayload(_))));
}

#[test]
fn valid_signature_is_accepted() {
    let payload = br#"{"type": "checkout.session.completed", "data": {"object": {"id": "cs_1"}}}"#;
    let header = sign(payload, SECRET, chrono::Utc::now().timestamp());

    let event = gateway(Some(SECRET))
        .parse_webhook(payload, Some(&header))
        .unwrap();
    assert_eq!(event.session_id.as_deref(), Some("cs_1"));
}

#[test]
fn wrong_secret_is_rejected() {
    let payload = br#"{"type": "checkout.session.completed"}"#;
    let header = sign(payload, "wrong_secret", chrono::Utc::now().timestamp());

    let result = gateway(Some(SECRET)).parse_webhook(payload, Some(&header));
    assert!(matches!(result, Err(GatewayError::InvalidSignature(_))));
}

#[test]
fn tampered_payload_is_rejected() {
    let payload = br#"{"type": "checkout.session.completed"}"#;
    let header = sign(payload, SECRET, chrono::Utc::now().timestamp());
    let tampered = br#"{"type": "checkout.session.completed", "extra": true}"#;

    let result = gateway(Some(SECRET)).parse_webhook(tampered, Some(&header));
    assert!(matches!(result, Err(GatewayError::InvalidSignature(_))));
}

#[test]
fn missing_header_is_rejected_when_secret_configured() {
    let payload = br#"{"type": "checkout.session.completed"}"#;
    let result = gateway(Some(SECRET)).parse_webhook(payload, None);
    assert!(matches!(result, Err(GatewayError::InvalidSignature(_))));
}

#[test]
fn stale_timestamp_is_rejected() {
    let payload = b"{}";
    let ts = 1_700_000_000;
    let header = sign(payload, SECRET, ts);

    let result = verify_signature(payload, &header, SECRET, ts + 600);
    assert!(matches!(result, Err(GatewayError::InvalidSignature(_))));
}

#[test]
fn timestamp_within_tolerance_verifies() {
    let payload = b"{}";
    let ts = 1_700_000_000;
    let header = sign(payload, SECRET, ts);

    assert!(verify_signature(payload, &header, SECRET, ts + 120).is_ok());
}

#[test]
fn header_without_v1_part_is_rejected() {
    let result = verify_signature(b"{}", "t=1700000000", SECRET, 1_700_000_000);
    assert!(matches!(result, Err(GatewayError::InvalidSignature(_))));
}
