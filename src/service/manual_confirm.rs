use crate::domain::registration::{status_from_db, ConfirmingActor, PaymentRecordStatus};
use crate::repo::payment_records_repo::{PaymentRecordRow, PaymentRecordsRepo};
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDirective {
    Confirm,
    AlreadyConfirmed,
    Rejected(&'static str),
}

/// Pure transition rule for an operator confirmation. Confirmed records
/// are an idempotent no-op; failed records stay failed.
pub fn confirmation_directive(status: PaymentRecordStatus) -> ConfirmDirective {
    match status {
        PaymentRecordStatus::Pending => ConfirmDirective::Confirm,
        PaymentRecordStatus::Confirmed => ConfirmDirective::AlreadyConfirmed,
        PaymentRecordStatus::Failed => {
            ConfirmDirective::Rejected("payment record already failed; cannot confirm")
        }
    }
}

#[derive(Debug)]
pub enum ManualConfirmOutcome {
    Confirmed(PaymentRecordRow),
    AlreadyConfirmed(PaymentRecordRow),
}

#[derive(Debug, thiserror::Error)]
pub enum ManualConfirmError {
    #[error("payment record not found")]
    NotFound,
    #[error("{0}")]
    InvalidState(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Operator override for offline payment modes (bank transfer, walk-in).
/// Never talks to the gateway.
#[derive(Clone)]
pub struct ManualConfirmation {
    pub payments_repo: PaymentRecordsRepo,
}

impl ManualConfirmation {
    pub async fn confirm(
        &self,
        payment_record_id: Uuid,
        operator: &str,
        transaction_reference: Option<&str>,
        note: Option<&str>,
    ) -> Result<ManualConfirmOutcome, ManualConfirmError> {
        let record = self
            .payments_repo
            .get(payment_record_id)
            .await?
            .ok_or(ManualConfirmError::NotFound)?;

        match confirmation_directive(status_from_db(&record.status)) {
            ConfirmDirective::AlreadyConfirmed => {
                Ok(ManualConfirmOutcome::AlreadyConfirmed(record))
            }
            ConfirmDirective::Rejected(reason) => Err(ManualConfirmError::InvalidState(reason)),
            ConfirmDirective::Confirm => {
                let annotated = match note {
                    Some(n) => format!("confirmed by {operator}: {n}"),
                    None => format!("confirmed by {operator}"),
                };

                let updated = self
                    .payments_repo
                    .confirm_pending(
                        payment_record_id,
                        ConfirmingActor::Operator,
                        transaction_reference,
                        Some(&annotated),
                        Utc::now(),
                    )
                    .await?;

                match updated {
                    Some(row) => {
                        tracing::info!(
                            payment_record_id = %payment_record_id,
                            operator,
                            "payment record confirmed manually"
                        );
                        Ok(ManualConfirmOutcome::Confirmed(row))
                    }
                    // the guarded update matched nothing: someone else won
                    None => {
                        let current = self
                            .payments_repo
                            .get(payment_record_id)
                            .await?
                            .ok_or(ManualConfirmError::NotFound)?;
                        if status_from_db(&current.status) == PaymentRecordStatus::Confirmed {
                            Ok(ManualConfirmOutcome::AlreadyConfirmed(current))
                        } else {
                            Err(ManualConfirmError::InvalidState(
                                "payment record no longer pending",
                            ))
                        }
                    }
                }
            }
        }
    }
}
