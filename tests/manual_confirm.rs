use registration_payments::domain::registration::PaymentRecordStatus;
use registration_payments::service::manual_confirm::{confirmation_directive, ConfirmDirective};

#[test]
fn pending_record_gets_confirmed() {
    assert_eq!(
        confirmation_directive(PaymentRecordStatus::Pending),
        ConfirmDirective::Confirm
    );
}

#[test]
fn second_confirmation_is_an_idempotent_no_op() {
    assert_eq!(
        confirmation_directive(PaymentRecordStatus::Confirmed),
        ConfirmDirective::AlreadyConfirmed
    );
}

#[test]
fn failed_record_stays_failed() {
    assert!(matches!(
        confirmation_directive(PaymentRecordStatus::Failed),
        ConfirmDirective::Rejected(_)
    ));
}
