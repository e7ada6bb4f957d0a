use crate::domain::intent::RegistrationIntent;
use crate::domain::registration::{ConfirmingActor, PaymentMode, PaymentRecordStatus};
use crate::gateways::SessionStatusReport;
use crate::repo::payment_records_repo::{
    is_unique_violation, PaymentRecordInput, PaymentRecordsRepo,
};
use crate::repo::registrations_repo::{RegistrationInput, RegistrationsRepo};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PaymentAttributes {
    pub mode: PaymentMode,
    pub status: PaymentRecordStatus,
    pub gateway_session_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub payment_method_label: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<ConfirmingActor>,
    pub notes: Option<String>,
}

impl PaymentAttributes {
    pub fn confirmed_online(
        report: &SessionStatusReport,
        actor: ConfirmingActor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            mode: PaymentMode::Online,
            status: PaymentRecordStatus::Confirmed,
            gateway_session_id: Some(report.session_id.clone()),
            gateway_payment_id: report.payment_id.clone(),
            payment_method_label: report.payment_method.clone(),
            confirmed_at: Some(now),
            confirmed_by: Some(actor),
            notes: None,
        }
    }

    pub fn pending_offline(mode: PaymentMode) -> Self {
        Self {
            mode,
            status: PaymentRecordStatus::Pending,
            gateway_session_id: None,
            gateway_payment_id: None,
            payment_method_label: None,
            confirmed_at: None,
            confirmed_by: None,
            notes: None,
        }
    }
}

#[derive(Debug)]
pub enum MaterializeOutcome {
    Created {
        registration_id: Uuid,
        payment_record_id: Uuid,
    },
    Existing {
        registration_id: Uuid,
    },
}

/// Turns an intent plus payment attributes into the durable rows, all in
/// one transaction. The unique constraints on registrants.email,
/// registrations.registrant_id and payment_records.gateway_session_id are
/// the serialization points; a losing transaction resolves to the winner's
/// registration instead of erroring.
#[derive(Clone)]
pub struct RegistrationMaterializer {
    pub pool: PgPool,
    pub registrations_repo: RegistrationsRepo,
    pub payments_repo: PaymentRecordsRepo,
}

impl RegistrationMaterializer {
    pub async fn materialize(
        &self,
        intent: &RegistrationIntent,
        payment: PaymentAttributes,
    ) -> Result<MaterializeOutcome> {
        let mut tx = self.pool.begin().await?;

        let registrant_id =
            RegistrationsRepo::upsert_registrant_tx(&mut tx, &intent.registrant).await?;

        if let Some(existing) =
            RegistrationsRepo::find_by_registrant_tx(&mut tx, registrant_id).await?
        {
            tx.rollback().await?;
            return Ok(MaterializeOutcome::Existing {
                registration_id: existing,
            });
        }

        let registration_id = Uuid::new_v4();
        let payment_record_id = Uuid::new_v4();

        let inserted = async {
            RegistrationsRepo::insert_registration_tx(
                &mut tx,
                &RegistrationInput {
                    registration_id,
                    registrant_id,
                    total_amount_minor: intent.amount_minor,
                    currency: intent.currency.clone(),
                },
            )
            .await?;
            RegistrationsRepo::insert_line_items_tx(&mut tx, registration_id, &intent.line_items)
                .await?;
            PaymentRecordsRepo::insert_tx(
                &mut tx,
                &PaymentRecordInput {
                    id: payment_record_id,
                    registration_id,
                    amount_minor: intent.amount_minor,
                    currency: intent.currency.clone(),
                    mode: payment.mode,
                    status: payment.status,
                    gateway_session_id: payment.gateway_session_id.clone(),
                    gateway_payment_id: payment.gateway_payment_id.clone(),
                    payment_method_label: payment.payment_method_label.clone(),
                    confirmed_at: payment.confirmed_at,
                    confirmed_by: payment.confirmed_by,
                    notes: payment.notes.clone(),
                },
            )
            .await
        }
        .await;

        if let Err(err) = inserted {
            tx.rollback().await?;
            if is_unique_violation(&err) {
                if let Some(winner) = self.resolve_winner(intent, &payment).await? {
                    return Ok(MaterializeOutcome::Existing {
                        registration_id: winner,
                    });
                }
            }
            return Err(err);
        }

        tx.commit().await?;
        Ok(MaterializeOutcome::Created {
            registration_id,
            payment_record_id,
        })
    }

    /// After a duplicate-key rollback, find the row the winning transaction
    /// produced: by checkout session first, by subject as fallback.
    async fn resolve_winner(
        &self,
        intent: &RegistrationIntent,
        payment: &PaymentAttributes,
    ) -> Result<Option<Uuid>> {
        if let Some(session_id) = &payment.gateway_session_id {
            if let Some(record) = self.payments_repo.find_by_session_id(session_id).await? {
                return Ok(Some(record.registration_id));
            }
        }
        self.registrations_repo
            .find_by_email(&intent.registrant.email)
            .await
    }
}
