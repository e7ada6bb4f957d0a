use crate::domain::intent::{IntentLineItem, RegistrantDetails};
use anyhow::Result;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

#[derive(Clone)]
pub struct RegistrationsRepo {
    pub pool: PgPool,
}

pub struct RegistrationInput {
    pub registration_id: Uuid,
    pub registrant_id: Uuid,
    pub total_amount_minor: i64,
    pub currency: String,
}

impl RegistrationsRepo {
    /// Find-or-create by email. The upsert row-locks the registrant, which
    /// serializes two transactions racing on the same subject.
    pub async fn upsert_registrant_tx(
        tx: &mut Transaction<'_, Postgres>,
        details: &RegistrantDetails,
    ) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO registrants (id, full_name, email, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                phone = COALESCE(EXCLUDED.phone, registrants.phone)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&details.full_name)
        .bind(&details.email)
        .bind(&details.phone)
        .fetch_one(tx.as_mut())
        .await?;

        Ok(row.get("id"))
    }

    pub async fn find_by_registrant_tx(
        tx: &mut Transaction<'_, Postgres>,
        registrant_id: Uuid,
    ) -> Result<Option<Uuid>> {
        let row = sqlx::query("SELECT id FROM registrations WHERE registrant_id = $1")
            .bind(registrant_id)
            .fetch_optional(tx.as_mut())
            .await?;

        Ok(row.map(|r| r.get("id")))
    }

    pub async fn insert_registration_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: &RegistrationInput,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO registrations (id, registrant_id, total_amount_minor, currency)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(input.registration_id)
        .bind(input.registrant_id)
        .bind(input.total_amount_minor)
        .bind(&input.currency)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }

    pub async fn insert_line_items_tx(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: Uuid,
        items: &[IntentLineItem],
    ) -> Result<()> {
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO registration_line_items (id, registration_id, item_code, name, event_date, unit_price_minor, category)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(registration_id)
            .bind(&item.item_code)
            .bind(&item.name)
            .bind(item.event_date)
            .bind(item.unit_price_minor)
            .bind(&item.category)
            .execute(tx.as_mut())
            .await?;
        }

        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query(
            r#"
            SELECT r.id FROM registrations r
            JOIN registrants s ON s.id = r.registrant_id
            WHERE s.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("id")))
    }

}
