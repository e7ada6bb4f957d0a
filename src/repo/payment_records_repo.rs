use crate::domain::registration::{ConfirmingActor, PaymentMode, PaymentRecordStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentRecordsRepo {
    pub pool: PgPool,
}

pub struct PaymentRecordInput {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub mode: PaymentMode,
    pub status: PaymentRecordStatus,
    pub gateway_session_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub payment_method_label: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<ConfirmingActor>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentRecordRow {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub mode: String,
    pub status: String,
    pub gateway_session_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub payment_method_label: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

const RECORD_COLUMNS: &str = "id, registration_id, amount_minor, currency, mode, status, \
     gateway_session_id, gateway_payment_id, payment_method_label, confirmed_at, confirmed_by, notes, created_at";

impl PaymentRecordsRepo {
    pub async fn find_by_session_id(&self, session_id: &str) -> Result<Option<PaymentRecordRow>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records WHERE gateway_session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(record_from_row))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<PaymentRecordRow>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(record_from_row))
    }

    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: &PaymentRecordInput,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_records (
                id, registration_id, amount_minor, currency, mode, status,
                gateway_session_id, gateway_payment_id, payment_method_label,
                confirmed_at, confirmed_by, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(input.id)
        .bind(input.registration_id)
        .bind(input.amount_minor)
        .bind(&input.currency)
        .bind(input.mode.as_db())
        .bind(input.status.as_db())
        .bind(&input.gateway_session_id)
        .bind(&input.gateway_payment_id)
        .bind(&input.payment_method_label)
        .bind(input.confirmed_at)
        .bind(input.confirmed_by.map(|a| a.as_db()))
        .bind(&input.notes)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    /// Guarded flip to CONFIRMED. Returns the updated row, or None when the
    /// record was no longer PENDING (someone else got there first, or it
    /// already failed).
    pub async fn confirm_pending(
        &self,
        id: Uuid,
        actor: ConfirmingActor,
        transaction_reference: Option<&str>,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<PaymentRecordRow>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE payment_records SET
                status = 'CONFIRMED',
                confirmed_at = $2,
                confirmed_by = $3,
                gateway_payment_id = COALESCE($4, gateway_payment_id),
                notes = CASE WHEN $5::text IS NULL THEN notes ELSE concat_ws(E'\n', notes, $5) END
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .bind(actor.as_db())
        .bind(transaction_reference)
        .bind(note)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(record_from_row))
    }

    pub async fn fail_pending_by_session(&self, session_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE payment_records SET status = 'FAILED' WHERE gateway_session_id = $1 AND status = 'PENDING'",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn record_from_row(r: PgRow) -> PaymentRecordRow {
    PaymentRecordRow {
        id: r.get("id"),
        registration_id: r.get("registration_id"),
        amount_minor: r.get("amount_minor"),
        currency: r.get("currency"),
        mode: r.get("mode"),
        status: r.get("status"),
        gateway_session_id: r.get("gateway_session_id"),
        gateway_payment_id: r.get("gateway_payment_id"),
        payment_method_label: r.get("payment_method_label"),
        confirmed_at: r.get("confirmed_at"),
        confirmed_by: r.get("confirmed_by"),
        notes: r.get("notes"),
        created_at: r.get("created_at"),
    }
}

/// True when the error is the database rejecting a duplicate key, which is
/// how a losing materialization race announces itself.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}
