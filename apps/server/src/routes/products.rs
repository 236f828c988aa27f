//! Catalog management and bulk CSV files.
//!
//! Bulk endpoints take the raw CSV file as the request body and answer with
//! a per-row report instead of failing the whole file.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::CurrentAdmin;
use crate::state::SharedState;
use madeh_core::import::{plan_update, plan_upload, UpdateReport, UploadReport};
use madeh_core::{NewProduct, Product, ProductUpdate};
use madeh_db::ProductFilter;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub category: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(params) = params?;
    let filter = ProductFilter {
        query: params.q,
        category: params.category,
    };
    Ok(Json(state.db.products().list(&filter).await?))
}

pub async fn categories(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.products().categories().await?))
}

pub async fn create(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(product) = payload?;
    let created = state.db.products().insert(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get_required(&id).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(update) = payload?;
    Ok(Json(state.db.products().update(&id, &update).await?))
}

pub async fn delete(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_upload(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    body: String,
) -> ApiResult<Json<UploadReport>> {
    let products = state.db.products();
    let existing = products.existing_names().await?;
    let plan = plan_upload(&body, &existing)?;
    Ok(Json(products.apply_upload(plan).await?))
}

pub async fn bulk_update(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    body: String,
) -> ApiResult<Json<UpdateReport>> {
    let products = state.db.products();
    let existing = products.existing_ids().await?;
    let plan = plan_update(&body, &existing)?;
    Ok(Json(products.apply_update_plan(plan).await?))
}
