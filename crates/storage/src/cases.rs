use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use recovery_core::{
    Case, CaseChanges, CaseId, CaseListQuery, CaseStatus, CaseWithClient, Client, NewCase,
};

use crate::{is_foreign_key_violation, is_unique_violation, to_rfc3339};

const CASE_WITH_CLIENT_SELECT: &str = r#"
SELECT c.id,
       c.client_id,
       c.invoice_number,
       c.invoice_amount,
       c.invoice_date,
       c.due_date,
       c.status,
       c.last_follow_up_notes,
       c.created_at,
       c.updated_at,
       cl.client_name,
       cl.company_name,
       cl.city,
       cl.contact_person,
       cl.phone,
       cl.email,
       cl.created_at AS client_created_at,
       cl.updated_at AS client_updated_at
  FROM cases AS c
  JOIN clients AS cl
    ON cl.id = c.client_id
"#;

/// Repository for recovery cases.
#[derive(Clone)]
pub struct CaseRepository {
    pool: SqlitePool,
}

impl CaseRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a new case for an existing client.
    ///
    /// The owning client is checked before the invoice number. Both checks
    /// are repeated by the foreign key and the `UNIQUE` constraint at insert time.
    pub async fn create(&self, case: &NewCase, now: DateTime<Utc>) -> Result<Case, CaseError> {
        let client_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE id = ?")
            .bind(case.client_id)
            .fetch_one(&self.pool)
            .await?;
        if client_count == 0 {
            return Err(CaseError::ClientNotFound);
        }

        let invoice_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cases WHERE invoice_number = ?")
                .bind(&case.invoice_number)
                .fetch_one(&self.pool)
                .await?;
        if invoice_count > 0 {
            return Err(CaseError::DuplicateInvoiceNumber);
        }

        self.insert_row(case, now).await
    }

    async fn insert_row(&self, case: &NewCase, now: DateTime<Utc>) -> Result<Case, CaseError> {
        let timestamp = to_rfc3339(now);
        let row = sqlx::query_as::<_, CaseRow>(
            "INSERT INTO cases \
             (client_id, invoice_number, invoice_amount, invoice_date, due_date, status, last_follow_up_notes, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, client_id, invoice_number, invoice_amount, invoice_date, due_date, status, last_follow_up_notes, created_at, updated_at",
        )
        .bind(case.client_id)
        .bind(&case.invoice_number)
        .bind(case.invoice_amount.to_string())
        .bind(case.invoice_date)
        .bind(case.due_date)
        .bind(case.status.as_str())
        .bind(&case.last_follow_up_notes)
        .bind(&timestamp)
        .bind(&timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                CaseError::DuplicateInvoiceNumber
            } else if is_foreign_key_violation(&err) {
                CaseError::ClientNotFound
            } else {
                CaseError::Database(err)
            }
        })?;

        row.into_domain()
    }

    /// Lists cases with their owning client, filtered and ordered per `query`.
    pub async fn list(&self, query: &CaseListQuery) -> Result<Vec<CaseWithClient>, CaseError> {
        let mut builder = QueryBuilder::<Sqlite>::new(CASE_WITH_CLIENT_SELECT);
        if let Some(status) = query.status {
            builder.push(" WHERE c.status = ").push_bind(status.as_str());
        }

        let (field, order) = query.effective_ordering();
        builder.push(format!(
            " ORDER BY c.{} {}, c.id ASC",
            field.column(),
            order.keyword()
        ));

        let rows = builder
            .build_query_as::<CaseWithClientRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CaseWithClientRow::into_domain).collect()
    }

    /// Loads one case with its owning client.
    pub async fn fetch_with_client(&self, id: CaseId) -> Result<CaseWithClient, CaseError> {
        let mut builder = QueryBuilder::<Sqlite>::new(CASE_WITH_CLIENT_SELECT);
        builder.push(" WHERE c.id = ").push_bind(id);

        builder
            .build_query_as::<CaseWithClientRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CaseError::NotFound)?
            .into_domain()
    }

    pub async fn fetch(&self, id: CaseId) -> Result<Case, CaseError> {
        sqlx::query_as::<_, CaseRow>(
            "SELECT id, client_id, invoice_number, invoice_amount, invoice_date, due_date, status, last_follow_up_notes, created_at, updated_at \
             FROM cases WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CaseError::NotFound)?
        .into_domain()
    }

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// Fields left absent in `changes` keep their stored value. An update that
    /// carries no field returns the stored case untouched.
    pub async fn update(
        &self,
        id: CaseId,
        changes: &CaseChanges,
        now: DateTime<Utc>,
    ) -> Result<Case, CaseError> {
        if changes.is_empty() {
            return self.fetch(id).await;
        }

        let notes = changes.last_follow_up_notes.as_ref().into_option();
        let row = sqlx::query_as::<_, CaseRow>(
            "UPDATE cases \
             SET status = COALESCE(?, status), \
                 last_follow_up_notes = CASE WHEN ? THEN ? ELSE last_follow_up_notes END, \
                 updated_at = ? \
             WHERE id = ? \
             RETURNING id, client_id, invoice_number, invoice_amount, invoice_date, due_date, status, last_follow_up_notes, created_at, updated_at",
        )
        .bind(changes.status.map(CaseStatus::as_str))
        .bind(notes.is_some())
        .bind(notes.flatten())
        .bind(to_rfc3339(now))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CaseError::NotFound)?;

        row.into_domain()
    }
}

/// Errors raised by [`CaseRepository`].
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("case not found")]
    NotFound,
    #[error("client not found")]
    ClientNotFound,
    #[error("invoice number already exists")]
    DuplicateInvoiceNumber,
    #[error("stored case is malformed: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct CaseRow {
    id: i64,
    client_id: i64,
    invoice_number: String,
    invoice_amount: String,
    invoice_date: NaiveDate,
    due_date: NaiveDate,
    status: String,
    last_follow_up_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CaseRow {
    fn into_domain(self) -> Result<Case, CaseError> {
        let invoice_amount = Decimal::from_str(&self.invoice_amount).map_err(|err| {
            CaseError::Decode(format!(
                "invoice_amount '{}' of case {}: {err}",
                self.invoice_amount, self.id
            ))
        })?;
        let status = self.status.parse::<CaseStatus>().map_err(|err| {
            CaseError::Decode(format!("status of case {}: {err}", self.id))
        })?;

        Ok(Case {
            id: self.id,
            client_id: self.client_id,
            invoice_number: self.invoice_number,
            invoice_amount,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            status,
            last_follow_up_notes: self.last_follow_up_notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Case joined with its owning client.
#[derive(Debug, sqlx::FromRow)]
struct CaseWithClientRow {
    #[sqlx(flatten)]
    case: CaseRow,
    client_name: String,
    company_name: String,
    city: String,
    contact_person: String,
    phone: String,
    email: String,
    client_created_at: DateTime<Utc>,
    client_updated_at: DateTime<Utc>,
}

impl CaseWithClientRow {
    fn into_domain(self) -> Result<CaseWithClient, CaseError> {
        let client = Client {
            id: self.case.client_id,
            client_name: self.client_name,
            company_name: self.company_name,
            city: self.city,
            contact_person: self.contact_person,
            phone: self.phone,
            email: self.email,
            created_at: self.client_created_at,
            updated_at: self.client_updated_at,
        };

        Ok(CaseWithClient {
            case: self.case.into_domain()?,
            client,
        })
    }
}
