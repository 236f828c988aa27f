use axum::extract::State;
use axum::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::error::ApiResult;
use crate::extract::CurrentAdmin;
use crate::state::SharedState;
use madeh_core::{PaymentStatus, Product, PurchaseSummary};

const RECENT_PURCHASES: u32 = 5;

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub product_count: i64,
    /// Sum of Paid purchase totals.
    pub total_sales_cents: i64,
    pub unpaid_count: i64,
    pub recent_purchases: Vec<PurchaseSummary>,
    pub low_stock_threshold: i64,
    pub low_stock: Vec<Product>,
}

pub async fn dashboard(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
) -> ApiResult<Json<Dashboard>> {
    let products = state.db.products();
    let purchases = state.db.purchases();
    let threshold = state.config.low_stock_threshold;

    Ok(Json(Dashboard {
        product_count: products.count().await?,
        total_sales_cents: purchases.get_total_sales().await?.cents(),
        unpaid_count: purchases.count_by_status(PaymentStatus::Unpaid).await?,
        recent_purchases: purchases.recent(RECENT_PURCHASES).await?,
        low_stock_threshold: threshold,
        low_stock: products.low_stock(threshold).await?,
    }))
}
