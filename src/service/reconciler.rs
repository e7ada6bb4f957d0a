use crate::domain::registration::{status_from_db, ConfirmingActor, PaymentRecordStatus};
use crate::gateways::{CheckoutGateway, SessionState, WebhookEvent};
use crate::intents::IntentStore;
use crate::repo::payment_records_repo::PaymentRecordsRepo;
use crate::service::materializer::{MaterializeOutcome, PaymentAttributes, RegistrationMaterializer};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Everything a confirmation channel can learn from one reconciliation
/// call. All five are normal results; only infrastructure failures
/// surface as errors.
#[derive(Debug)]
pub enum ReconcileOutcome {
    AlreadyConfirmed { registration_id: Uuid },
    NewlyConfirmed { registration_id: Uuid },
    NotYetPaid,
    PaymentFailed,
    IntentMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionClass {
    Paid,
    StillOpen,
    TerminallyUnpaid,
}

pub fn classify_session(state: SessionState) -> SessionClass {
    match state {
        SessionState::Paid => SessionClass::Paid,
        SessionState::Open => SessionClass::StillOpen,
        SessionState::Failed | SessionState::Expired => SessionClass::TerminallyUnpaid,
    }
}

/// Webhook event types whose session is worth reconciling. Anything else
/// is acknowledged without touching the state machine.
pub fn reconcilable_session(event: &WebhookEvent) -> Option<&str> {
    match event.event_type.as_str() {
        "checkout.session.completed"
        | "checkout.session.async_payment_succeeded"
        | "checkout.session.async_payment_failed"
        | "checkout.session.expired" => event.session_id.as_deref(),
        _ => None,
    }
}

/// The single reconciliation path shared by the webhook handler, the
/// client poll handler and any test harness. Duplicate and concurrent
/// calls for one session id all resolve to the same registration; the
/// database unique constraint on the session id is what serializes them.
#[derive(Clone)]
pub struct ConfirmationReconciler {
    pub gateway: Arc<dyn CheckoutGateway>,
    pub intents: Arc<dyn IntentStore>,
    pub payments_repo: PaymentRecordsRepo,
    pub materializer: RegistrationMaterializer,
}

impl ConfirmationReconciler {
    pub async fn reconcile(
        &self,
        session_id: &str,
        actor: ConfirmingActor,
    ) -> Result<ReconcileOutcome> {
        if let Some(record) = self.payments_repo.find_by_session_id(session_id).await? {
            match status_from_db(&record.status) {
                PaymentRecordStatus::Confirmed => {
                    return Ok(ReconcileOutcome::AlreadyConfirmed {
                        registration_id: record.registration_id,
                    })
                }
                PaymentRecordStatus::Failed => return Ok(ReconcileOutcome::PaymentFailed),
                PaymentRecordStatus::Pending => {}
            }
        }

        let report = self.gateway.fetch_session(session_id).await?;

        match classify_session(report.state) {
            SessionClass::StillOpen => Ok(ReconcileOutcome::NotYetPaid),
            SessionClass::TerminallyUnpaid => {
                let failed = self.payments_repo.fail_pending_by_session(session_id).await?;
                if failed > 0 {
                    tracing::info!(session_id, "marked pending payment record failed");
                }
                Ok(ReconcileOutcome::PaymentFailed)
            }
            SessionClass::Paid => self.confirm_paid_session(session_id, &report, actor).await,
        }
    }

    async fn confirm_paid_session(
        &self,
        session_id: &str,
        report: &crate::gateways::SessionStatusReport,
        actor: ConfirmingActor,
    ) -> Result<ReconcileOutcome> {
        let Some(reference) = report.intent_reference() else {
            tracing::error!(
                session_id,
                payment_id = ?report.payment_id,
                "paid session carries no intent reference; manual follow-up required"
            );
            return Ok(ReconcileOutcome::IntentMissing);
        };

        let Some(intent) = self.intents.get(reference).await? else {
            tracing::error!(
                session_id,
                reference,
                payment_id = ?report.payment_id,
                "paid session has no stored intent; money moved without a registration, manual follow-up required"
            );
            return Ok(ReconcileOutcome::IntentMissing);
        };

        let attributes = PaymentAttributes::confirmed_online(report, actor, Utc::now());
        let outcome = self.materializer.materialize(&intent, attributes).await?;

        // settled either way; a failed delete is the sweeper's problem
        if let Err(err) = self.intents.delete(reference).await {
            tracing::warn!(reference, error = %err, "intent delete after materialization failed");
        }

        match outcome {
            MaterializeOutcome::Created {
                registration_id, ..
            } => {
                tracing::info!(
                    session_id,
                    %registration_id,
                    actor = actor.as_db(),
                    "registration materialized from paid session"
                );
                Ok(ReconcileOutcome::NewlyConfirmed { registration_id })
            }
            MaterializeOutcome::Existing { registration_id } => {
                Ok(ReconcileOutcome::AlreadyConfirmed { registration_id })
            }
        }
    }
}
