use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

use recovery_core::{Client, ClientId, NewClient};

use crate::{is_unique_violation, to_rfc3339};

/// Repository for the `clients` table.
#[derive(Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a new client, rejecting emails that are already registered.
    ///
    /// The lookup is a fast path; the `UNIQUE` constraint on `clients.email`
    /// still decides when two inserts race.
    pub async fn create(
        &self,
        client: &NewClient,
        now: DateTime<Utc>,
    ) -> Result<Client, ClientError> {
        if self.email_exists(&client.email).await? {
            return Err(ClientError::EmailTaken);
        }

        self.insert_row(client, now).await
    }

    async fn insert_row(
        &self,
        client: &NewClient,
        now: DateTime<Utc>,
    ) -> Result<Client, ClientError> {
        let timestamp = to_rfc3339(now);
        let row = sqlx::query_as::<_, ClientRow>(
            "INSERT INTO clients \
             (client_name, company_name, city, contact_person, phone, email, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, client_name, company_name, city, contact_person, phone, email, created_at, updated_at",
        )
        .bind(&client.client_name)
        .bind(&client.company_name)
        .bind(&client.city)
        .bind(&client.contact_person)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&timestamp)
        .bind(&timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ClientError::EmailTaken
            } else {
                ClientError::Database(err)
            }
        })?;

        Ok(row.into())
    }

    /// Lists every client in insertion order.
    pub async fn list(&self) -> Result<Vec<Client>, ClientError> {
        let rows = sqlx::query_as::<_, ClientRow>(
            "SELECT id, client_name, company_name, city, contact_person, phone, email, created_at, updated_at \
             FROM clients ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    pub async fn fetch(&self, id: ClientId) -> Result<Option<Client>, ClientError> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT id, client_name, company_name, city, contact_person, phone, email, created_at, updated_at \
             FROM clients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ClientError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Deletes a client together with its cases. Returns `false` when the id is unknown.
    pub async fn delete(&self, id: ClientId) -> Result<bool, ClientError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Errors raised by [`ClientRepository`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("email already exists")]
    EmailTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: i64,
    client_name: String,
    company_name: String,
    city: String,
    contact_person: String,
    phone: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            client_name: row.client_name,
            company_name: row.company_name,
            city: row.city,
            contact_person: row.contact_person,
            phone: row.phone,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
