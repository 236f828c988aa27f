use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ApiResult;
use crate::extract::CurrentAdmin;
use crate::state::SharedState;
use madeh_core::cart::{Cart, CartTotals};
use madeh_core::CoreError;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct QuoteLine {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct QuoteRequest {
    pub items: Vec<QuoteLine>,
}

/// A priced cart, ready to be turned into a checkout.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct CartQuote {
    pub cart: Cart,
    pub totals: CartTotals,
}

/// Prices a cart against current catalog prices and stock.
///
/// Lines for the same product are merged, exactly as adding a product to
/// the cart twice would.
pub async fn quote(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> ApiResult<Json<CartQuote>> {
    let Json(request) = payload?;
    let products = state.db.products();
    let mut cart = Cart::new();

    for line in &request.items {
        let product = products
            .get_by_id(&line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        cart.add_item(&product, line.quantity)?;
    }

    let totals = CartTotals::try_from(&cart)?;
    Ok(Json(CartQuote { cart, totals }))
}
