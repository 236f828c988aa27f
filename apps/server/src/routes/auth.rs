//! Sign-in and own-account management.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentAdmin;
use crate::state::SharedState;
use madeh_core::Admin;

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub admin: Admin,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct ProfileUpdate {
    pub username: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct PasswordChange {
    pub password: String,
    pub confirmation: String,
}

pub async fn login(
    State(state): State<SharedState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;

    let admin = state
        .db
        .admins()
        .verify_credentials(&request.email, &request.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !admin.is_active() {
        warn!(admin_id = %admin.id, "Sign-in refused for inactive account");
        return Err(ApiError::unauthorized("Account is inactive"));
    }

    let token = state.jwt.generate(&admin.id)?;
    info!(admin_id = %admin.id, role = ?admin.role, "Admin signed in");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt.lifetime_secs(),
        admin,
    }))
}

pub async fn me(CurrentAdmin(admin): CurrentAdmin) -> Json<Admin> {
    Json(admin)
}

pub async fn update_profile(
    State(state): State<SharedState>,
    CurrentAdmin(admin): CurrentAdmin,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<Admin>> {
    let Json(update) = payload?;
    let updated = state
        .db
        .admins()
        .update_username(&admin.id, &update.username)
        .await?;
    Ok(Json(updated))
}

pub async fn change_password(
    State(state): State<SharedState>,
    CurrentAdmin(admin): CurrentAdmin,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(change) = payload?;
    state
        .db
        .admins()
        .change_password(&admin.id, &change.password, &change.confirmation)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
