//! # Repositories
//!
//! One repository per table, one method per entity operation.
//!
//! ```text
//! admin.rs     AdminRepository     admins
//! product.rs   ProductRepository   products
//! purchase.rs  PurchaseRepository  purchases + purchase_items (checkout)
//! backup.rs    BackupRepository    snapshot / restore of the three data tables
//! ```

pub mod admin;
pub mod backup;
pub mod product;
pub mod purchase;

/// Column list shared by every query returning `Product`.
pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, category, price_cents, cost_cents, stock, created_at, updated_at";

/// Column list shared by every query returning `Purchase`.
pub(crate) const PURCHASE_COLUMNS: &str = "id, total_cents, payment_status, payment_method, \
     customer_name, customer_id_number, created_by, created_at, updated_at";

/// Column list shared by every query returning `PurchaseItem`.
pub(crate) const PURCHASE_ITEM_COLUMNS: &str =
    "id, purchase_id, product_id, quantity, price_cents, created_at";

#[cfg(test)]
pub(crate) mod test_support {
    use madeh_core::NewProduct;

    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn new_product(name: &str, price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: "Tools".to_string(),
            price_cents,
            cost_cents: None,
            stock,
        }
    }
}
