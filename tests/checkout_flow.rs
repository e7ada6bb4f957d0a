use registration_payments::domain::intent::IntentLineItem;
use registration_payments::gateways::mock::MockCheckoutGateway;
use registration_payments::gateways::{
    CheckoutGateway, CreateSessionRequest, GatewayError, SessionState,
};

fn session_request(reference: &str, amount_minor: i64) -> CreateSessionRequest {
    CreateSessionRequest {
        reference: reference.to_string(),
        amount_minor,
        currency: "eur".to_string(),
        line_items: vec![IntentLineItem {
            item_code: "main-event".to_string(),
            name: "Main event".to_string(),
            event_date: None,
            unit_price_minor: amount_minor,
            category: "general".to_string(),
        }],
        success_url: "https://example.org/return".to_string(),
        cancel_url: "https://example.org/register".to_string(),
    }
}

#[tokio::test]
async fn fresh_session_is_open_and_keeps_the_reference() {
    let gateway = MockCheckoutGateway::new();
    let handle = gateway
        .create_session(session_request("ref-123", 9500))
        .await
        .unwrap();
    assert!(handle.redirect_url.contains(&handle.session_id));

    let report = gateway.fetch_session(&handle.session_id).await.unwrap();
    assert_eq!(report.state, SessionState::Open);
    assert_eq!(report.intent_reference(), Some("ref-123"));
}

#[tokio::test]
async fn paid_session_reports_paid_with_a_payment_id() {
    let gateway = MockCheckoutGateway::new();
    let handle = gateway
        .create_session(session_request("ref-123", 9500))
        .await
        .unwrap();

    gateway.set_state(&handle.session_id, SessionState::Paid);

    let report = gateway.fetch_session(&handle.session_id).await.unwrap();
    assert_eq!(report.state, SessionState::Paid);
    assert!(report.payment_id.is_some());
    assert_eq!(report.intent_reference(), Some("ref-123"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let gateway = MockCheckoutGateway::new();
    let result = gateway.fetch_session("cs_missing").await;
    assert!(matches!(result, Err(GatewayError::SessionNotFound(_))));
}

#[tokio::test]
async fn non_positive_amount_is_rejected_before_any_session_exists() {
    let gateway = MockCheckoutGateway::new();
    let result = gateway.create_session(session_request("ref-zero", 0)).await;
    assert!(matches!(result, Err(GatewayError::InvalidAmount(0))));
}
