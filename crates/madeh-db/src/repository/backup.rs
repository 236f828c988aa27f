//! # Backup Repository
//!
//! Snapshot and restore of the three data tables.
//!
//! ```text
//! snapshot(): one read transaction ──► BackupData
//! restore():  one write transaction
//!             products ──► purchases ──► purchase_items   (upsert by id)
//! ```
//!
//! Restore never deletes. Rows absent from the document are left alone.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{PRODUCT_COLUMNS, PURCHASE_COLUMNS, PURCHASE_ITEM_COLUMNS};
use crate::error::DbResult;
use madeh_core::backup::{BackupData, BackupDocument, RestoreReport};
use madeh_core::{Product, Purchase, PurchaseItem};

#[derive(Debug, Clone)]
pub struct BackupRepository {
    pool: SqlitePool,
}

impl BackupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BackupRepository { pool }
    }

    /// Reads every row of products, purchases and purchase_items.
    pub async fn snapshot(&self) -> DbResult<BackupDocument> {
        let mut tx = self.pool.begin().await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases ORDER BY created_at, id"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let purchase_items = sqlx::query_as::<_, PurchaseItem>(&format!(
            "SELECT {PURCHASE_ITEM_COLUMNS} FROM purchase_items ORDER BY created_at, id"
        ))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            products = products.len(),
            purchases = purchases.len(),
            purchase_items = purchase_items.len(),
            "Snapshot taken"
        );

        Ok(BackupDocument::new(BackupData {
            products,
            purchases,
            purchase_items,
        }))
    }

    /// Upserts a backup in dependency order. All or nothing.
    pub async fn restore(&self, document: &BackupDocument) -> DbResult<RestoreReport> {
        let data = &document.data;
        let mut tx = self.pool.begin().await?;

        for product in &data.products {
            upsert_product(&mut tx, product).await?;
        }
        for purchase in &data.purchases {
            upsert_purchase(&mut tx, purchase).await?;
        }
        for item in &data.purchase_items {
            upsert_purchase_item(&mut tx, item).await?;
        }

        tx.commit().await?;

        let report = RestoreReport {
            products: data.products.len(),
            purchases: data.purchases.len(),
            purchase_items: data.purchase_items.len(),
        };
        info!(
            backup_created_at = %document.created_at,
            products = report.products,
            purchases = report.purchases,
            purchase_items = report.purchase_items,
            "Backup restored"
        );
        Ok(report)
    }
}

async fn upsert_product(conn: &mut SqliteConnection, p: &Product) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO products (id, name, category, price_cents, cost_cents, stock, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         ON CONFLICT(id) DO UPDATE SET \
            name = excluded.name, category = excluded.category, \
            price_cents = excluded.price_cents, cost_cents = excluded.cost_cents, \
            stock = excluded.stock, created_at = excluded.created_at, updated_at = excluded.updated_at",
    )
    .bind(&p.id)
    .bind(&p.name)
    .bind(&p.category)
    .bind(p.price_cents)
    .bind(p.cost_cents)
    .bind(p.stock)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_purchase(conn: &mut SqliteConnection, p: &Purchase) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO purchases (id, total_cents, payment_status, payment_method, customer_name, \
             customer_id_number, created_by, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
         ON CONFLICT(id) DO UPDATE SET \
            total_cents = excluded.total_cents, payment_status = excluded.payment_status, \
            payment_method = excluded.payment_method, customer_name = excluded.customer_name, \
            customer_id_number = excluded.customer_id_number, created_by = excluded.created_by, \
            created_at = excluded.created_at, updated_at = excluded.updated_at",
    )
    .bind(&p.id)
    .bind(p.total_cents)
    .bind(p.payment_status)
    .bind(p.payment_method)
    .bind(&p.customer_name)
    .bind(&p.customer_id_number)
    .bind(&p.created_by)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_purchase_item(conn: &mut SqliteConnection, i: &PurchaseItem) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO purchase_items (id, purchase_id, product_id, quantity, price_cents, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(id) DO UPDATE SET \
            purchase_id = excluded.purchase_id, product_id = excluded.product_id, \
            quantity = excluded.quantity, price_cents = excluded.price_cents, \
            created_at = excluded.created_at",
    )
    .bind(&i.id)
    .bind(&i.purchase_id)
    .bind(&i.product_id)
    .bind(i.quantity)
    .bind(i.price_cents)
    .bind(i.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::{database, new_product};
    use madeh_core::checkout::{CheckoutLine, CheckoutRequest};
    use madeh_core::{PaymentMethod, PaymentStatus};

    async fn seeded() -> crate::Database {
        let db = database().await;
        let brush = db.products().insert(&new_product("Paint Brush", 1599, 10)).await.unwrap();
        let tape = db.products().insert(&new_product("Masking Tape", 875, 6)).await.unwrap();
        db.products().insert(&new_product("Unsold Rake", 2200, 1)).await.unwrap();

        for status in [PaymentStatus::Paid, PaymentStatus::Unpaid] {
            let order = CheckoutRequest {
                items: vec![
                    CheckoutLine {
                        product_id: brush.id.clone(),
                        quantity: 2,
                        price_cents: brush.price_cents,
                    },
                    CheckoutLine {
                        product_id: tape.id.clone(),
                        quantity: 1,
                        price_cents: tape.price_cents,
                    },
                ],
                payment_method: PaymentMethod::BankTransfer,
                payment_status: status,
                customer_name: Some("Jane Wanjiku".into()),
                customer_id_number: Some("12345678".into()),
            }
            .validate()
            .unwrap();
            db.purchases().create_purchase(&order, "admin-1").await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_round_trip_into_empty_store() {
        let source = seeded().await;
        let document = source.backups().snapshot().await.unwrap();
        assert_eq!(document.data.products.len(), 3);
        assert_eq!(document.data.purchases.len(), 2);
        assert_eq!(document.data.purchase_items.len(), 4);

        // Through JSON, as it would travel to storage and back.
        let parsed = BackupDocument::from_json(&document.to_json().unwrap()).unwrap();

        let target = database().await;
        let report = target.backups().restore(&parsed).await.unwrap();
        assert_eq!(
            report,
            RestoreReport {
                products: 3,
                purchases: 2,
                purchase_items: 4
            }
        );

        let restored = target.backups().snapshot().await.unwrap();
        assert_eq!(restored.data, document.data);
    }

    #[tokio::test]
    async fn test_restore_upserts_without_deleting() {
        let db = seeded().await;
        let mut document = db.backups().snapshot().await.unwrap();

        let extra = db.products().insert(&new_product("Added Later", 100, 1)).await.unwrap();
        document.data.products[0].stock = 99;

        db.backups().restore(&document).await.unwrap();

        let restored = db.products().get_required(&document.data.products[0].id).await.unwrap();
        assert_eq!(restored.stock, 99);
        assert!(db.products().get_by_id(&extra.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_restore_leaves_nothing() {
        let source = seeded().await;
        let mut document = source.backups().snapshot().await.unwrap();
        document.data.purchase_items[0].product_id = "missing-product".into();

        let target = database().await;
        let err = target.backups().restore(&document).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(target.products().count().await.unwrap(), 0);
    }
}
