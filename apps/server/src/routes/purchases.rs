//! Checkout and purchase history.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::extract::CurrentAdmin;
use crate::state::SharedState;
use madeh_core::checkout::{CheckoutReceipt, CheckoutRequest};
use madeh_core::{MarkPaidOutcome, PaymentStatus, PurchaseDetail, PurchaseSummary};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<PaymentStatus>,
}

/// Sells a cart atomically. 409 `INSUFFICIENT_STOCK` leaves nothing written.
pub async fn checkout(
    State(state): State<SharedState>,
    CurrentAdmin(admin): CurrentAdmin,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CheckoutReceipt>)> {
    let Json(request) = payload?;
    let checkout = request.validate()?;

    let receipt = state
        .db
        .purchases()
        .create_purchase(&checkout, &admin.id)
        .await?;

    info!(
        purchase_id = %receipt.purchase.id,
        admin_id = %admin.id,
        total = %receipt.purchase.total(),
        status = %receipt.purchase.payment_status,
        "Checkout completed"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<PurchaseSummary>>> {
    let Query(params) = params?;
    Ok(Json(state.db.purchases().list(params.status).await?))
}

pub async fn detail(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<PurchaseDetail>> {
    Ok(Json(state.db.purchases().get_detail(&id).await?))
}

/// Unpaid → Paid. Already paid purchases come back unchanged with `already_paid`.
pub async fn mark_paid(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<MarkPaidOutcome>> {
    Ok(Json(state.db.purchases().mark_paid(&id).await?))
}
