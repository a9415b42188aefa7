use sqlx::{sqlite::SqliteRow, Row};

use vendebot_core::sale::{CustomerDirectory, CustomerRef, LookupError};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlCustomerDirectory {
    pool: DbPool,
}

impl SqlCustomerDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn lookup(&self, phone: &str) -> Result<Option<CustomerRef>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name
             FROM clients
             WHERE phone = ?
             ORDER BY created_at ASC, id ASC
             LIMIT 1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(customer_from_row).transpose()
    }
}

#[async_trait::async_trait]
impl CustomerDirectory for SqlCustomerDirectory {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<CustomerRef>, LookupError> {
        self.lookup(phone).await.map_err(|error| LookupError::Storage(error.to_string()))
    }
}

fn customer_from_row(row: SqliteRow) -> Result<CustomerRef, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    Ok(CustomerRef { id, name })
}
