//! # Domain Types
//!
//! Core domain types used throughout Madeh Hardware.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Purchase     │   │  PurchaseItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──┤  id (UUID)      │◄──┤  purchase_id    │       │
//! │  │  name, category │   │  total_cents    │   │  product_id ────┼──►    │
//! │  │  price_cents    │   │  payment_status │   │  quantity       │       │
//! │  │  stock          │   │  created_by     │   │  price_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Admin       │   │ PaymentStatus   │   │ PaymentMethod   │       │
//! │  │  role, status   │   │  Paid / Unpaid  │   │  Cash / M-Pesa  │       │
//! │  └─────────────────┘   └─────────────────┘   │  Bank Transfer  │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Enum wire values match the stored text exactly (`"Super Admin"`,
//! `"M-Pesa"`, `"Bank Transfer"`), in JSON and in SQLite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Admin
// =============================================================================

/// Role of an admin account. Controls which features are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum AdminRole {
    #[serde(rename = "Super Admin")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Super Admin"))]
    SuperAdmin,
    Admin,
    Cashier,
}

impl AdminRole {
    /// Backup and account management are Super Admin only.
    pub fn can_manage_backups(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }
}

/// Whether an admin account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    Active,
    Inactive,
}

/// An authenticated user of the management system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Admin {
    pub id: String,

    /// Sign-in identity.
    pub email: String,

    /// Display name shown in the header and on purchase records.
    pub username: String,

    pub role: AdminRole,
    pub status: AdminStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the hardware catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,
    pub category: String,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Buying price in cents (for margin), optional.
    pub cost_cents: Option<i64>,

    /// Current sellable quantity. Never negative.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    pub stock: i64,
}

/// Partial update of a product. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price_cents.is_none()
            && self.cost_cents.is_none()
            && self.stock.is_none()
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Whether a purchase has been paid. The only transition is Unpaid → Paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Unpaid => "Unpaid",
        })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "M-Pesa")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "M-Pesa"))]
    MPesa,
    #[serde(rename = "Bank Transfer")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Bank Transfer"))]
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::MPesa,
        PaymentMethod::BankTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::MPesa => "M-Pesa",
            PaymentMethod::BankTransfer => "Bank Transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "payment_method".to_string(),
                reason: format!("unknown payment method '{}'", s.trim()),
            })
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// One completed or pending sale transaction.
///
/// Immutable after checkout except for `payment_status` (Unpaid → Paid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,

    /// Sum of line quantity × unit price, in cents.
    pub total_cents: i64,

    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,

    pub customer_name: Option<String>,
    pub customer_id_number: Option<String>,

    /// Admin id of the cashier who checked out.
    pub created_by: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

/// A purchase joined with its creator's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub purchase: Purchase,

    /// `None` when the creator account no longer exists.
    pub created_by_name: Option<String>,
}

// =============================================================================
// Purchase Item
// =============================================================================

/// A single product line within a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub quantity: i64,

    /// Unit price at time of sale, in cents.
    pub price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A purchase line joined with the product's name and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItemDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub item: PurchaseItem,

    /// Read through a LEFT JOIN. The `product_id` foreign key keeps it set.
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

/// Purchase detail view: the purchase plus its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseDetail {
    pub purchase: PurchaseSummary,
    pub items: Vec<PurchaseItemDetail>,
}

/// Result of an Unpaid → Paid request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarkPaidOutcome {
    pub purchase: Purchase,

    /// `true` if the purchase was already Paid and nothing changed.
    pub already_paid: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(serde_json::to_string(&AdminRole::SuperAdmin).unwrap(), "\"Super Admin\"");
        assert_eq!(serde_json::to_string(&PaymentMethod::MPesa).unwrap(), "\"M-Pesa\"");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"Bank Transfer\""
        );
        assert_eq!(serde_json::to_string(&PaymentStatus::Unpaid).unwrap(), "\"Unpaid\"");
        assert_eq!(serde_json::to_string(&AdminStatus::Inactive).unwrap(), "\"inactive\"");
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("m-pesa".parse::<PaymentMethod>().unwrap(), PaymentMethod::MPesa);
        assert_eq!(" Cash ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("Cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_only_super_admin_manages_backups() {
        assert!(AdminRole::SuperAdmin.can_manage_backups());
        assert!(!AdminRole::Admin.can_manage_backups());
        assert!(!AdminRole::Cashier.can_manage_backups());
    }
}
