use registration_payments::gateways::{SessionState, WebhookEvent};
use registration_payments::http::handlers::verify::ui_state;
use registration_payments::service::reconciler::{
    classify_session, reconcilable_session, ReconcileOutcome, SessionClass,
};
use uuid::Uuid;

#[test]
fn paid_session_triggers_materialization_path() {
    assert_eq!(classify_session(SessionState::Paid), SessionClass::Paid);
}

#[test]
fn open_session_waits() {
    assert_eq!(classify_session(SessionState::Open), SessionClass::StillOpen);
}

#[test]
fn failed_and_expired_sessions_create_nothing() {
    assert_eq!(
        classify_session(SessionState::Failed),
        SessionClass::TerminallyUnpaid
    );
    assert_eq!(
        classify_session(SessionState::Expired),
        SessionClass::TerminallyUnpaid
    );
}

#[test]
fn completed_event_routes_to_reconciliation() {
    let event = event("checkout.session.completed", Some("cs_123"));
    assert_eq!(reconcilable_session(&event), Some("cs_123"));
}

#[test]
fn async_payment_events_route_to_reconciliation() {
    for event_type in [
        "checkout.session.async_payment_succeeded",
        "checkout.session.async_payment_failed",
        "checkout.session.expired",
    ] {
        let event = event(event_type, Some("cs_456"));
        assert_eq!(reconcilable_session(&event), Some("cs_456"), "{event_type}");
    }
}

#[test]
fn unrelated_event_is_acknowledged_without_reconciling() {
    let event = event("payment_intent.created", Some("cs_789"));
    assert_eq!(reconcilable_session(&event), None);
}

#[test]
fn both_confirmation_outcomes_render_as_confirmed() {
    let id = Uuid::new_v4();
    let (state, reg) = ui_state(&ReconcileOutcome::NewlyConfirmed { registration_id: id });
    assert_eq!((state, reg), ("confirmed", Some(id)));

    let (state, reg) = ui_state(&ReconcileOutcome::AlreadyConfirmed { registration_id: id });
    assert_eq!((state, reg), ("confirmed", Some(id)));
}

#[test]
fn in_flight_and_failed_outcomes_render_their_own_states() {
    assert_eq!(ui_state(&ReconcileOutcome::NotYetPaid), ("processing", None));
    assert_eq!(ui_state(&ReconcileOutcome::PaymentFailed), ("failed", None));
}

#[test]
fn missing_intent_is_routed_to_support_not_success() {
    let (state, reg) = ui_state(&ReconcileOutcome::IntentMissing);
    assert_eq!(state, "needs_support");
    assert!(reg.is_none());
}

fn event(event_type: &str, session_id: Option<&str>) -> WebhookEvent {
    WebhookEvent {
        event_type: event_type.to_string(),
        session_id: session_id.map(ToString::to_string),
        payment_intent_id: None,
        attributes: serde_json::Value::Null,
    }
}
