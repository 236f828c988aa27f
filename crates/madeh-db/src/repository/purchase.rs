//! # Purchase Repository
//!
//! Checkout, payment status, and the reads behind the payments, reports and
//! dashboard screens.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   for each line:                                                        │
//! │     UPDATE products SET stock = stock - q                               │
//! │      WHERE id = ? AND stock >= q        ── 0 rows? ──► ROLLBACK         │
//! │                                              (InsufficientStock /       │
//! │                                               ProductNotFound)          │
//! │   INSERT purchases      (total = Σ q × price)                           │
//! │   INSERT purchase_items (one per line)                                  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is the first statement, so the transaction takes SQLite's
//! write lock before it reads anything. A second checkout on the same
//! product waits for the lock and then sees the committed stock.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{PURCHASE_COLUMNS, PURCHASE_ITEM_COLUMNS};
use crate::error::{DbError, DbResult};
use madeh_core::checkout::{CheckoutReceipt, ValidatedCheckout};
use madeh_core::{
    CoreError, MarkPaidOutcome, Money, PaymentStatus, Purchase, PurchaseDetail, PurchaseItem,
    PurchaseItemDetail, PurchaseSummary,
};

const SUMMARY_SELECT: &str = "SELECT p.id, p.total_cents, p.payment_status, p.payment_method, \
     p.customer_name, p.customer_id_number, p.created_by, p.created_at, p.updated_at, \
     a.username AS created_by_name \
     FROM purchases p LEFT JOIN admins a ON a.id = p.created_by";

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Records a checkout atomically.
    ///
    /// ## Errors
    /// - `Domain(InsufficientStock)` when any line exceeds current stock
    /// - `Domain(ProductNotFound)` for an unknown product
    ///
    /// On error nothing is written.
    pub async fn create_purchase(
        &self,
        checkout: &ValidatedCheckout,
        created_by: &str,
    ) -> DbResult<CheckoutReceipt> {
        let now = Utc::now();
        let purchase_id = Uuid::new_v4().to_string();

        debug!(
            purchase_id = %purchase_id,
            lines = checkout.items.len(),
            total = %checkout.total,
            "Starting checkout transaction"
        );

        let mut tx = self.pool.begin().await?;

        for line in &checkout.items {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
                 WHERE id = ?1 AND stock >= ?2",
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let current: Option<(String, i64)> =
                    sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1")
                        .bind(&line.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                let err = match current {
                    Some((name, stock)) => CoreError::InsufficientStock {
                        product: name,
                        available: stock,
                        requested: line.quantity,
                    },
                    None => CoreError::ProductNotFound(line.product_id.clone()),
                };
                warn!(purchase_id = %purchase_id, error = %err, "Checkout rejected");
                return Err(err.into());
            }
        }

        let purchase = Purchase {
            id: purchase_id,
            total_cents: checkout.total.cents(),
            payment_status: checkout.payment_status,
            payment_method: checkout.payment_method,
            customer_name: checkout.customer_name.clone(),
            customer_id_number: checkout.customer_id_number.clone(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        insert_purchase(&mut tx, &purchase).await?;

        let mut items = Vec::with_capacity(checkout.items.len());
        for line in &checkout.items {
            let item = PurchaseItem {
                id: Uuid::new_v4().to_string(),
                purchase_id: purchase.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                price_cents: line.price_cents,
                created_at: now,
            };
            insert_purchase_item(&mut tx, &item).await?;
            items.push(item);
        }

        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            total = %purchase.total(),
            status = %purchase.payment_status,
            method = %purchase.payment_method,
            "Purchase recorded"
        );

        Ok(CheckoutReceipt { purchase, items })
    }

    /// Moves a purchase from Unpaid to Paid. Already Paid is a no-op.
    ///
    /// Only `payment_status` and `updated_at` change.
    pub async fn mark_paid(&self, id: &str) -> DbResult<MarkPaidOutcome> {
        let result = sqlx::query(
            "UPDATE purchases SET payment_status = ?2, updated_at = ?3 \
             WHERE id = ?1 AND payment_status = ?4",
        )
        .bind(id)
        .bind(PaymentStatus::Paid)
        .bind(Utc::now())
        .bind(PaymentStatus::Unpaid)
        .execute(&self.pool)
        .await?;

        let purchase = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::from(CoreError::PurchaseNotFound(id.to_string())))?;

        let already_paid = result.rows_affected() == 0;
        if already_paid {
            debug!(id = %id, "Purchase already paid");
        } else {
            info!(id = %id, "Purchase marked paid");
        }

        Ok(MarkPaidOutcome {
            purchase,
            already_paid,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(purchase)
    }

    /// Purchase with creator name and each line's product name and category.
    pub async fn get_detail(&self, id: &str) -> DbResult<PurchaseDetail> {
        let sql = format!("{SUMMARY_SELECT} WHERE p.id = ?1");
        let purchase = sqlx::query_as::<_, PurchaseSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::from(CoreError::PurchaseNotFound(id.to_string())))?;

        let items = sqlx::query_as::<_, PurchaseItemDetail>(
            "SELECT i.id, i.purchase_id, i.product_id, i.quantity, i.price_cents, i.created_at, \
                    pr.name AS product_name, pr.category AS product_category \
             FROM purchase_items i LEFT JOIN products pr ON pr.id = i.product_id \
             WHERE i.purchase_id = ?1 ORDER BY i.created_at, i.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PurchaseDetail { purchase, items })
    }

    /// Lines of a purchase without joins.
    pub async fn items(&self, purchase_id: &str) -> DbResult<Vec<PurchaseItem>> {
        let sql = format!(
            "SELECT {PURCHASE_ITEM_COLUMNS} FROM purchase_items WHERE purchase_id = ?1 ORDER BY created_at, id"
        );
        let items = sqlx::query_as::<_, PurchaseItem>(&sql)
            .bind(purchase_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Newest first, optionally restricted to one payment status.
    pub async fn list(&self, status: Option<PaymentStatus>) -> DbResult<Vec<PurchaseSummary>> {
        let sql = format!(
            "{SUMMARY_SELECT} WHERE (?1 IS NULL OR p.payment_status = ?1) ORDER BY p.created_at DESC"
        );
        let purchases = sqlx::query_as::<_, PurchaseSummary>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(purchases)
    }

    pub async fn recent(&self, limit: u32) -> DbResult<Vec<PurchaseSummary>> {
        let sql = format!("{SUMMARY_SELECT} ORDER BY p.created_at DESC LIMIT ?1");
        let purchases = sqlx::query_as::<_, PurchaseSummary>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(purchases)
    }

    /// Every Paid purchase, newest first. Input to report aggregation.
    pub async fn paid(&self) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE payment_status = ?1 ORDER BY created_at DESC"
        );
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(PaymentStatus::Paid)
            .fetch_all(&self.pool)
            .await?;
        Ok(purchases)
    }

    pub async fn count_by_status(&self, status: PaymentStatus) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM purchases WHERE payment_status = ?1",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sum of every Paid purchase total.
    pub async fn get_total_sales(&self) -> DbResult<Money> {
        let cents = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(total_cents), 0) FROM purchases WHERE payment_status = ?1",
        )
        .bind(PaymentStatus::Paid)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_cents(cents))
    }
}

async fn insert_purchase(conn: &mut sqlx::SqliteConnection, purchase: &Purchase) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO purchases (id, total_cents, payment_status, payment_method, customer_name, \
             customer_id_number, created_by, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&purchase.id)
    .bind(purchase.total_cents)
    .bind(purchase.payment_status)
    .bind(purchase.payment_method)
    .bind(&purchase.customer_name)
    .bind(&purchase.customer_id_number)
    .bind(&purchase.created_by)
    .bind(purchase.created_at)
    .bind(purchase.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_purchase_item(conn: &mut sqlx::SqliteConnection, item: &PurchaseItem) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO purchase_items (id, purchase_id, product_id, quantity, price_cents, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&item.id)
    .bind(&item.purchase_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.price_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
