//! # Product Repository
//!
//! Catalog reads and writes, including the bulk CSV paths.
//!
//! Stock is only ever decreased by the checkout transaction in
//! [`PurchaseRepository`](super::purchase::PurchaseRepository); this
//! repository sets it outright from admin edits.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::PRODUCT_COLUMNS;
use crate::error::{DbError, DbResult};
use madeh_core::import::{UpdatePlan, UpdateReport, UploadPlan, UploadReport};
use madeh_core::validation::{validate_new_product, validate_product_update, validate_search_query};
use madeh_core::{NewProduct, Product, ProductUpdate};

/// List filter. Both fields are optional and combinable.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of name or category.
    pub query: Option<String>,
    /// Exact category.
    pub category: Option<String>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let hammers = repo.list(&ProductFilter { query: Some("hammer".into()), ..Default::default() }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let query = match filter.query.as_deref() {
            Some(q) => validate_search_query(q).map_err(madeh_core::CoreError::from)?,
            None => String::new(),
        };
        let pattern = (!query.is_empty()).then(|| format!("%{}%", query.to_lowercase()));
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        debug!(query = %query, category = ?category, "Listing products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE (?1 IS NULL OR LOWER(name) LIKE ?1 OR LOWER(category) LIKE ?1) \
             AND (?2 IS NULL OR category = ?2) \
             ORDER BY name COLLATE NOCASE"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by ID, failing with NotFound.
    pub async fn get_required(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Distinct categories, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products ORDER BY category COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Products with `stock <= threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= ?1 ORDER BY stock, name COLLATE NOCASE"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Creates a product.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for bad fields
    /// - `UniqueViolation` when the name is taken (case-insensitive)
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product).map_err(madeh_core::CoreError::from)?;

        debug!(name = %product.name, "Inserting product");

        let mut conn = self.pool.acquire().await?;
        insert_product(&mut conn, product)
            .await
            .map_err(|e| name_conflict(e, &product.name))
    }

    /// Applies a partial update and returns the stored result.
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update).map_err(madeh_core::CoreError::from)?;

        debug!(id = %id, "Updating product");

        let mut conn = self.pool.acquire().await?;
        let updated = apply_update(&mut conn, id, update).await.map_err(|e| match &update.name {
            Some(name) => name_conflict(e, name),
            None => e,
        })?;

        if !updated {
            return Err(DbError::not_found("Product", id));
        }
        drop(conn);

        self.get_required(id).await
    }

    /// Deletes a product.
    ///
    /// Fails with `ForeignKeyViolation` when the product appears on a purchase.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Lowercased names of every product, for upload duplicate checks.
    pub async fn existing_names(&self) -> DbResult<HashSet<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM products")
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().map(|n| n.to_lowercase()).collect())
    }

    /// IDs of every product, for bulk update lookups.
    pub async fn existing_ids(&self) -> DbResult<HashSet<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM products")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Inserts every valid row of an upload plan in one transaction.
    pub async fn apply_upload(&self, plan: UploadPlan) -> DbResult<UploadReport> {
        let mut tx = self.pool.begin().await?;

        for product in &plan.products {
            insert_product(&mut tx, product)
                .await
                .map_err(|e| name_conflict(e, &product.name))?;
        }

        tx.commit().await?;

        info!(
            inserted = plan.products.len(),
            rejected = plan.errors.len(),
            "Bulk upload applied"
        );

        Ok(UploadReport {
            success: plan.products.len(),
            errors: plan.errors,
        })
    }

    /// Applies every valid row of an update plan in one transaction.
    pub async fn apply_update_plan(&self, plan: UpdatePlan) -> DbResult<UpdateReport> {
        let mut tx = self.pool.begin().await?;
        let mut success = 0;

        for (id, update) in &plan.updates {
            if apply_update(&mut tx, id, update).await? {
                success += 1;
            }
        }

        tx.commit().await?;

        info!(
            updated = success,
            rejected = plan.errors.len(),
            not_found = plan.not_found.len(),
            "Bulk update applied"
        );

        Ok(UpdateReport {
            success,
            errors: plan.errors,
            not_found: plan.not_found,
        })
    }
}

async fn insert_product(conn: &mut sqlx::SqliteConnection, product: &NewProduct) -> DbResult<Product> {
    let now = Utc::now();
    let stored = Product {
        id: Uuid::new_v4().to_string(),
        name: product.name.trim().to_string(),
        category: product.category.trim().to_string(),
        price_cents: product.price_cents,
        cost_cents: product.cost_cents,
        stock: product.stock,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO products (id, name, category, price_cents, cost_cents, stock, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&stored.id)
    .bind(&stored.name)
    .bind(&stored.category)
    .bind(stored.price_cents)
    .bind(stored.cost_cents)
    .bind(stored.stock)
    .bind(stored.created_at)
    .bind(stored.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(stored)
}

/// Returns `false` when no product has that id.
async fn apply_update(conn: &mut sqlx::SqliteConnection, id: &str, update: &ProductUpdate) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE products SET \
            name = COALESCE(?2, name), \
            category = COALESCE(?3, category), \
            price_cents = COALESCE(?4, price_cents), \
            cost_cents = COALESCE(?5, cost_cents), \
            stock = COALESCE(?6, stock), \
            updated_at = ?7 \
         WHERE id = ?1",
    )
    .bind(id)
    .bind(update.name.as_deref().map(str::trim))
    .bind(update.category.as_deref().map(str::trim))
    .bind(update.price_cents)
    .bind(update.cost_cents)
    .bind(update.stock)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn name_conflict(err: DbError, name: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate("name", name.trim()),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
