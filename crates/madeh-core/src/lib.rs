//! # madeh-core: Pure Business Logic for Madeh Hardware
//!
//! All business rules of the hardware store backend as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Madeh Hardware Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  │   /api/products  /api/purchases  /api/reports  /api/backups     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ madeh-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   types  money  cart  checkout  report  import  backup          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    madeh-db (Database Layer)                    │   │
//! │  │       SQLite repositories, checkout transaction, restore        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Admin, Product, Purchase, PurchaseItem)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - In-memory cart with frozen unit prices
//! - [`checkout`] - Checkout request validation
//! - [`report`] - Sales report filtering and aggregation
//! - [`import`] - Bulk CSV upload/update validation
//! - [`backup`] - Backup document schema
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use madeh_core::money::Money;
//!
//! let price = Money::parse_decimal("15.99").unwrap();
//! let total = price.checked_mul(2).unwrap() + Money::from_cents(875);
//! assert_eq!(total.to_string(), "40.73");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod import;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Stops accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest selling or buying price, in cents (100,000,000.00).
///
/// With `MAX_ITEM_QUANTITY` and `MAX_CART_ITEMS` this keeps every cart
/// total far below `i64::MAX`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Minimum length of an admin password.
pub const MIN_PASSWORD_LENGTH: usize = 6;
