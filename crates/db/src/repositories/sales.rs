use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use vendebot_core::dialog::states::SaleDraft;
use vendebot_core::sale::{CommitError, OrderReference, SaleLedger};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlSaleLedger {
    pool: DbPool,
}

enum CustomerRecord<'a> {
    New { name: &'a str },
    Existing { id: &'a str },
}

impl SqlSaleLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert_sale(
        &self,
        draft: &SaleDraft,
        phone: &str,
        total: i64,
        customer: CustomerRecord<'_>,
    ) -> Result<OrderReference, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let client_id = match customer {
            CustomerRecord::New { name } => {
                let client_id = Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO clients (id, phone, name, source_client_id)
                     VALUES (?, ?, ?, ?)",
                )
                .bind(&client_id)
                .bind(phone)
                .bind(name)
                .bind(format!("telegram_{phone}"))
                .execute(&mut *tx)
                .await?;
                client_id
            }
            CustomerRecord::Existing { id } => id.to_string(),
        };

        let order_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO orders (id, client_id, order_date, total, status)
             VALUES (?, ?, ?, ?, 'pending')",
        )
        .bind(&order_id)
        .bind(&client_id)
        .bind(Utc::now().date_naive().to_string())
        .bind(total)
        .execute(&mut *tx)
        .await?;

        for line in &draft.lines {
            let product_id: Option<String> = sqlx::query(
                "SELECT id FROM products
                 WHERE name = ? AND (variant = ? OR (variant IS NULL AND ? IS NULL))",
            )
            .bind(&line.name)
            .bind(line.variant.as_deref())
            .bind(line.variant.as_deref())
            .fetch_optional(&mut *tx)
            .await?
            .map(|row| row.try_get("id"))
            .transpose()?;

            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, product_name, variant, quantity, unit)
                 VALUES (?, ?, ?, ?, ?, ?, 'caja')",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(product_id)
            .bind(&line.name)
            .bind(line.variant.as_deref())
            .bind(i64::from(line.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(OrderReference { order_id })
    }
}

#[async_trait::async_trait]
impl SaleLedger for SqlSaleLedger {
    async fn commit(&self, draft: &SaleDraft) -> Result<OrderReference, CommitError> {
        let phone = draft.phone.as_deref().ok_or(CommitError::IncompleteDraft("phone"))?;
        let total = draft.total.ok_or(CommitError::IncompleteDraft("total"))?;
        let customer = if draft.new_customer {
            let name = draft
                .customer_name
                .as_deref()
                .ok_or(CommitError::IncompleteDraft("customer name"))?;
            CustomerRecord::New { name }
        } else {
            let id = draft
                .customer_id
                .as_deref()
                .ok_or(CommitError::IncompleteDraft("customer id"))?;
            CustomerRecord::Existing { id }
        };

        self.insert_sale(draft, phone, total, customer)
            .await
            .map_err(|error| CommitError::Storage(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::Row;

    use vendebot_core::dialog::states::{LineItem, SaleDraft};
    use vendebot_core::sale::{CommitError, SaleLedger};

    use super::SqlSaleLedger;
    use crate::migrations;
    use crate::{connect, DbPool};

    #[tokio::test]
    async fn commit_for_new_customer_writes_client_order_and_items() {
        let pool = setup_pool().await;
        seed_product(&pool, "prod-muffin-banano", "Muffin", Some("Banano")).await;
        seed_product(&pool, "prod-brownie", "Brownie", None).await;

        let ledger = SqlSaleLedger::new(pool.clone());
        let draft = new_customer_draft(
            "3150000001",
            vec![line("Muffin", Some("Banano"), 3), line("Brownie", None, 2)],
        );

        let reference = ledger.commit(&draft).await.expect("commit sale");

        let client = sqlx::query("SELECT id, name, source_client_id FROM clients WHERE phone = ?")
            .bind("3150000001")
            .fetch_one(&pool)
            .await
            .expect("client row");
        assert_eq!(client.get::<String, _>("name"), "Ana María");
        assert_eq!(client.get::<String, _>("source_client_id"), "telegram_3150000001");

        let order =
            sqlx::query("SELECT client_id, order_date, total, status FROM orders WHERE id = ?")
                .bind(&reference.order_id)
                .fetch_one(&pool)
                .await
                .expect("order row");
        assert_eq!(order.get::<String, _>("client_id"), client.get::<String, _>("id"));
        assert_eq!(order.get::<String, _>("order_date"), Utc::now().date_naive().to_string());
        assert_eq!(order.get::<i64, _>("total"), 66_000);
        assert_eq!(order.get::<String, _>("status"), "pending");

        let items = sqlx::query(
            "SELECT product_id, product_name, variant, quantity, unit
             FROM order_items WHERE order_id = ? ORDER BY product_name",
        )
        .bind(&reference.order_id)
        .fetch_all(&pool)
        .await
        .expect("item rows");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get::<Option<String>, _>("product_id"), Some("prod-brownie".into()));
        assert_eq!(items[0].get::<Option<String>, _>("variant"), None);
        assert_eq!(items[0].get::<i64, _>("quantity"), 2);
        assert_eq!(items[0].get::<String, _>("unit"), "caja");
        assert_eq!(
            items[1].get::<Option<String>, _>("product_id"),
            Some("prod-muffin-banano".into())
        );
        assert_eq!(items[1].get::<String, _>("product_name"), "Muffin");
        assert_eq!(items[1].get::<i64, _>("quantity"), 3);

        pool.close().await;
    }

    #[tokio::test]
    async fn commit_for_existing_customer_reuses_client_row() {
        let pool = setup_pool().await;
        sqlx::query(
            "INSERT INTO clients (id, phone, name, source_client_id)
             VALUES ('client-regular', '3150000002', 'Laura Gómez', 'seed_client-regular')",
        )
        .execute(&pool)
        .await
        .expect("seed client");

        let ledger = SqlSaleLedger::new(pool.clone());
        let draft = existing_customer_draft(
            "3150000002",
            "client-regular",
            vec![line("Waffle", Some("Plátano y Queso"), 1)],
        );

        let reference = ledger.commit(&draft).await.expect("commit sale");

        let client_count = sqlx::query("SELECT COUNT(*) AS count FROM clients WHERE phone = ?")
            .bind("3150000002")
            .fetch_one(&pool)
            .await
            .expect("count clients")
            .get::<i64, _>("count");
        assert_eq!(client_count, 1);

        let order_client = sqlx::query("SELECT client_id FROM orders WHERE id = ?")
            .bind(&reference.order_id)
            .fetch_one(&pool)
            .await
            .expect("order row")
            .get::<String, _>("client_id");
        assert_eq!(order_client, "client-regular");

        pool.close().await;
    }

    #[tokio::test]
    async fn unmatched_product_keeps_line_with_null_product_id() {
        let pool = setup_pool().await;

        let ledger = SqlSaleLedger::new(pool.clone());
        let draft = new_customer_draft("3150000003", vec![line("Empanada", Some("Pollo"), 4)]);

        let reference = ledger.commit(&draft).await.expect("commit sale");

        let item = sqlx::query(
            "SELECT product_id, product_name, variant FROM order_items WHERE order_id = ?",
        )
        .bind(&reference.order_id)
        .fetch_one(&pool)
        .await
        .expect("item row");
        assert_eq!(item.get::<Option<String>, _>("product_id"), None);
        assert_eq!(item.get::<String, _>("product_name"), "Empanada");
        assert_eq!(item.get::<Option<String>, _>("variant"), Some("Pollo".into()));

        pool.close().await;
    }

    #[tokio::test]
    async fn variant_resolution_distinguishes_null_from_named() {
        let pool = setup_pool().await;
        seed_product(&pool, "prod-arepa-yuca", "Arepa", Some("Yuca y Queso")).await;
        seed_product(&pool, "prod-arepa", "Arepa", None).await;

        let ledger = SqlSaleLedger::new(pool.clone());
        let draft = new_customer_draft(
            "3150000004",
            vec![line("Arepa", Some("Yuca y Queso"), 1), line("Arepa", None, 1)],
        );

        let reference = ledger.commit(&draft).await.expect("commit sale");

        let items = sqlx::query(
            "SELECT product_id, variant FROM order_items WHERE order_id = ? ORDER BY variant",
        )
        .bind(&reference.order_id)
        .fetch_all(&pool)
        .await
        .expect("item rows");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get::<Option<String>, _>("variant"), None);
        assert_eq!(items[0].get::<Option<String>, _>("product_id"), Some("prod-arepa".into()));
        assert_eq!(
            items[1].get::<Option<String>, _>("variant"),
            Some("Yuca y Queso".into())
        );
        assert_eq!(
            items[1].get::<Option<String>, _>("product_id"),
            Some("prod-arepa-yuca".into())
        );

        pool.close().await;
    }

    #[tokio::test]
    async fn failed_line_insert_rolls_back_the_whole_sale() {
        let pool = setup_pool().await;

        let ledger = SqlSaleLedger::new(pool.clone());
        let mut draft = new_customer_draft(
            "3150000005",
            vec![line("Galleta", None, 2), line("Muffin", Some("Chocolate"), 0)],
        );
        draft.total = Some(77_777);

        let error = ledger.commit(&draft).await.expect_err("zero quantity must fail");
        assert!(matches!(error, CommitError::Storage(_)));

        let client_count = sqlx::query("SELECT COUNT(*) AS count FROM clients WHERE phone = ?")
            .bind("3150000005")
            .fetch_one(&pool)
            .await
            .expect("count clients")
            .get::<i64, _>("count");
        assert_eq!(client_count, 0);

        let order_count = sqlx::query("SELECT COUNT(*) AS count FROM orders WHERE total = ?")
            .bind(77_777_i64)
            .fetch_one(&pool)
            .await
            .expect("count orders")
            .get::<i64, _>("count");
        assert_eq!(order_count, 0);

        let item_count =
            sqlx::query("SELECT COUNT(*) AS count FROM order_items WHERE product_name = ?")
                .bind("Galleta")
                .fetch_one(&pool)
                .await
                .expect("count items")
                .get::<i64, _>("count");
        assert_eq!(item_count, 0);

        pool.close().await;
    }

    #[tokio::test]
    async fn commit_rejects_incomplete_drafts() {
        let pool = setup_pool().await;
        let ledger = SqlSaleLedger::new(pool.clone());

        let mut missing_phone = new_customer_draft("3150000006", vec![line("Brownie", None, 1)]);
        missing_phone.phone = None;
        let error = ledger.commit(&missing_phone).await.expect_err("phone required");
        assert_eq!(error, CommitError::IncompleteDraft("phone"));

        let mut missing_total = new_customer_draft("3150000006", vec![line("Brownie", None, 1)]);
        missing_total.total = None;
        let error = ledger.commit(&missing_total).await.expect_err("total required");
        assert_eq!(error, CommitError::IncompleteDraft("total"));

        let mut missing_name = new_customer_draft("3150000006", vec![line("Brownie", None, 1)]);
        missing_name.customer_name = None;
        let error = ledger.commit(&missing_name).await.expect_err("name required");
        assert_eq!(error, CommitError::IncompleteDraft("customer name"));

        let mut missing_id = existing_customer_draft(
            "3150000006",
            "client-unused",
            vec![line("Brownie", None, 1)],
        );
        missing_id.customer_id = None;
        let error = ledger.commit(&missing_id).await.expect_err("customer id required");
        assert_eq!(error, CommitError::IncompleteDraft("customer id"));

        let client_count = sqlx::query("SELECT COUNT(*) AS count FROM clients WHERE phone = ?")
            .bind("3150000006")
            .fetch_one(&pool)
            .await
            .expect("count clients")
            .get::<i64, _>("count");
        assert_eq!(client_count, 0);

        pool.close().await;
    }

    async fn setup_pool() -> DbPool {
        let pool =
            connect("sqlite::memory:?cache=shared", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    async fn seed_product(pool: &DbPool, id: &str, name: &str, variant: Option<&str>) {
        sqlx::query("INSERT INTO products (id, name, variant) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(variant)
            .execute(pool)
            .await
            .expect("seed product");
    }

    fn line(name: &str, variant: Option<&str>, quantity: u32) -> LineItem {
        LineItem { name: name.to_string(), variant: variant.map(str::to_string), quantity }
    }

    fn new_customer_draft(phone: &str, lines: Vec<LineItem>) -> SaleDraft {
        SaleDraft {
            phone: Some(phone.to_string()),
            customer_name: Some("Ana María".to_string()),
            customer_id: None,
            new_customer: true,
            lines,
            pending: None,
            total: Some(66_000),
        }
    }

    fn existing_customer_draft(phone: &str, client_id: &str, lines: Vec<LineItem>) -> SaleDraft {
        SaleDraft {
            phone: Some(phone.to_string()),
            customer_name: None,
            customer_id: Some(client_id.to_string()),
            new_customer: false,
            lines,
            pending: None,
            total: Some(30_000),
        }
    }
}
