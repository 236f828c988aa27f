//! # Cart
//!
//! In-memory cart built at the checkout counter.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item(product, qty)                                                 │
//! │     ├── stock == 0            → OutOfStock                              │
//! │     ├── already in cart       → merge quantity                          │
//! │     └── qty > known stock     → InsufficientStock                       │
//! │                                                                         │
//! │  update_quantity(id, qty)                                               │
//! │     └── qty <= 0              → line removed                            │
//! │                                                                         │
//! │  checkout_lines()  → frozen (product_id, quantity, unit price)          │
//! │                      handed to the checkout transaction                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock known to the cart is a snapshot. The checkout transaction
//! re-checks it against the live row.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::checkout::{total_of, CheckoutLine};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_price_cents;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A single line in the cart. Prices are frozen when the product is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub unit_price_cents: i64,
    pub quantity: i64,

    /// Stock at the time the product was added.
    pub available_stock: i64,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            available_stock: product.stock,
        }
    }

    pub fn line_total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_mul(self.quantity)
    }
}

/// Shopping cart. Lines are unique per product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product, merging into an existing line for the same product.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(crate::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if product.stock <= 0 {
            return Err(CoreError::OutOfStock(product.name.clone()));
        }
        validate_price_cents(product.price_cents)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            check_quantity(&product.name, new_qty, product.stock)?;
            item.quantity = new_qty;
            item.available_stock = product.stock;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        check_quantity(&product.name, quantity, product.stock)?;
        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero or less removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        check_quantity(&item.name, quantity, item.available_stock)?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ quantity × unit price.
    pub fn total(&self) -> CoreResult<Money> {
        total_of(self.items.iter().map(CartItem::line_total))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines in the shape the checkout transaction takes.
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.items
            .iter()
            .map(|i| CheckoutLine {
                product_id: i.product_id.clone(),
                quantity: i.quantity,
                price_cents: i.unit_price_cents,
            })
            .collect()
    }
}

fn check_quantity(name: &str, quantity: i64, stock: i64) -> CoreResult<()> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    if quantity > stock {
        return Err(CoreError::InsufficientStock {
            product: name.to_string(),
            available: stock,
            requested: quantity,
        });
    }
    Ok(())
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
}

impl TryFrom<&Cart> for CartTotals {
    type Error = CoreError;

    fn try_from(cart: &Cart) -> CoreResult<Self> {
        Ok(CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_cents: cart.total()?.cents(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
