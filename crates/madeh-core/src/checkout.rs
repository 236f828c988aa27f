//! # Checkout Request
//!
//! Pure validation of a checkout before it reaches the database transaction.
//!
//! ```text
//! CheckoutRequest ──validate()──► ValidatedCheckout ──► PurchaseRepository::create_purchase
//!                                  (normalized customer,     (one transaction: decrement,
//!                                   computed total)           purchase row, item rows)
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, PaymentStatus, Purchase, PurchaseItem};
use crate::validation::{normalize_optional, validate_price_cents, validate_quantity};
use crate::MAX_CART_ITEMS;

/// One line to be sold: product, quantity and the unit price frozen by the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

impl CheckoutLine {
    /// quantity × price. `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        Money::from_cents(self.price_cents).checked_mul(self.quantity)
    }
}

/// Σ quantity × price over lines, refusing a total that does not fit in `i64`.
pub(crate) fn total_of<I>(line_totals: I) -> CoreResult<Money>
where
    I: IntoIterator<Item = Option<Money>>,
{
    line_totals
        .into_iter()
        .try_fold(Money::zero(), |total, line| line.and_then(|l| total.checked_add(l)))
        .ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "total".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into()
        })
}

/// Checkout as submitted by the counter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_id_number: Option<String>,
}

/// What the checkout transaction wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutReceipt {
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

/// A checkout that passed every rule that can be checked without the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub items: Vec<CheckoutLine>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub customer_name: Option<String>,
    pub customer_id_number: Option<String>,
    pub total: Money,
}

impl CheckoutRequest {
    /// Checks the request.
    ///
    /// ## Rules
    /// - At least one line, at most `MAX_CART_ITEMS`
    /// - Each product appears once, with a valid quantity and price
    /// - The total fits in `i64`
    /// - `Unpaid` requires a non-empty customer name and ID number
    /// - Blank customer fields are stored as absent
    pub fn validate(self) -> CoreResult<ValidatedCheckout> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if self.items.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        let mut seen = HashSet::new();
        for line in &self.items {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "product_id".to_string(),
                }
                .into());
            }
            if !seen.insert(line.product_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "product".to_string(),
                    value: line.product_id.clone(),
                }
                .into());
            }
            validate_quantity(line.quantity)?;
            validate_price_cents(line.price_cents)?;
        }

        let customer_name = normalize_optional(self.customer_name.as_deref());
        let customer_id_number = normalize_optional(self.customer_id_number.as_deref());

        if self.payment_status == PaymentStatus::Unpaid {
            if customer_name.is_none() {
                return Err(ValidationError::Required {
                    field: "customer_name".to_string(),
                }
                .into());
            }
            if customer_id_number.is_none() {
                return Err(ValidationError::Required {
                    field: "customer_id_number".to_string(),
                }
                .into());
            }
        }

        let total = total_of(self.items.iter().map(CheckoutLine::line_total))?;

        Ok(ValidatedCheckout {
            items: self.items,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            customer_name,
            customer_id_number,
            total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: i64, price_cents: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: id.to_string(),
            quantity,
            price_cents,
        }
    }

    fn request(status: PaymentStatus) -> CheckoutRequest {
        CheckoutRequest {
            items: vec![line("a", 2, 1599), line("b", 1, 875)],
            payment_method: PaymentMethod::MPesa,
            payment_status: status,
            customer_name: None,
            customer_id_number: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let checkout = request(PaymentStatus::Paid).validate().unwrap();
        assert_eq!(checkout.total.cents(), 4073);
    }

    #[test]
    fn test_unpaid_requires_customer() {
        let err = request(PaymentStatus::Unpaid).validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: customer_name is required");

        let mut req = request(PaymentStatus::Unpaid);
        req.customer_name = Some("Jane Wanjiku".into());
        req.customer_id_number = Some("   ".into());
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: customer_id_number is required");

        let mut req = request(PaymentStatus::Unpaid);
        req.customer_name = Some(" Jane Wanjiku ".into());
        req.customer_id_number = Some("12345678".into());
        let checkout = req.validate().unwrap();
        assert_eq!(checkout.customer_name.as_deref(), Some("Jane Wanjiku"));
    }

    #[test]
    fn test_paid_blank_customer_becomes_none() {
        let mut req = request(PaymentStatus::Paid);
        req.customer_name = Some("".into());
        let checkout = req.validate().unwrap();
        assert_eq!(checkout.customer_name, None);
    }

    #[test]
    fn test_rejects_empty_and_bad_lines() {
        let mut req = request(PaymentStatus::Paid);
        req.items.clear();
        assert!(matches!(req.validate(), Err(CoreError::EmptyCart)));

        let mut req = request(PaymentStatus::Paid);
        req.items[0].quantity = 0;
        assert!(req.validate().is_err());

        let mut req = request(PaymentStatus::Paid);
        req.items.push(line("a", 1, 1599));
        assert!(matches!(
            req.validate(),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_huge_price_rejected_instead_of_wrapping() {
        let mut req = request(PaymentStatus::Paid);
        req.items = vec![line("a", 3, 6_148_914_691_236_517_206)];
        assert!(matches!(
            req.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "price"
        ));
    }

    #[test]
    fn test_largest_cart_total_fits() {
        let mut req = request(PaymentStatus::Paid);
        req.items = (0..MAX_CART_ITEMS)
            .map(|i| line(&format!("p{i}"), crate::MAX_ITEM_QUANTITY, crate::MAX_PRICE_CENTS))
            .collect();
        let checkout = req.validate().unwrap();
        assert_eq!(
            checkout.total.cents(),
            crate::MAX_PRICE_CENTS * crate::MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64
        );
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let lines = [Some(Money::from_cents(i64::MAX)), Some(Money::from_cents(1))];
        assert!(matches!(
            total_of(lines),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "total"
        ));
        assert!(total_of([None]).is_err());
        assert_eq!(total_of([Some(Money::from_cents(5))]).unwrap().cents(), 5);
    }
}
