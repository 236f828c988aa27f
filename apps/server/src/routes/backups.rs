//! Backup and restore, Super Admin only.
//!
//! ```text
//! POST /api/backups               snapshot ──► stored under the admin's namespace ──► returned
//! GET  /api/backups               stored backups, newest first (empty on storage failure)
//! POST /api/backups/restore       body document ──► upsert
//! POST /api/backups/{name}/restore stored document ──► upsert
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use ts_rs::TS;

use crate::error::ApiResult;
use crate::extract::CurrentAdmin;
use crate::state::SharedState;
use madeh_core::backup::{BackupDocument, BackupInfo, RestoreReport};

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct CreatedBackup {
    pub info: BackupInfo,
    pub document: BackupDocument,
}

pub async fn create(
    State(state): State<SharedState>,
    admin: CurrentAdmin,
) -> ApiResult<(StatusCode, Json<CreatedBackup>)> {
    admin.require_backup_access()?;

    let document = state.db.backups().snapshot().await?;
    let info = state.store.save(&admin.0.id, &document).await?;
    info!(admin_id = %admin.0.id, name = %info.name, "Backup created");

    Ok((StatusCode::CREATED, Json(CreatedBackup { info, document })))
}

pub async fn list(
    State(state): State<SharedState>,
    admin: CurrentAdmin,
) -> ApiResult<Json<Vec<BackupInfo>>> {
    admin.require_backup_access()?;
    Ok(Json(state.store.list(&admin.0.id).await))
}

pub async fn restore_body(
    State(state): State<SharedState>,
    admin: CurrentAdmin,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<RestoreReport>> {
    admin.require_backup_access()?;
    let Json(value) = payload?;

    let document = BackupDocument::from_value(value)?;
    Ok(Json(state.db.backups().restore(&document).await?))
}

pub async fn restore_stored(
    State(state): State<SharedState>,
    admin: CurrentAdmin,
    Path(name): Path<String>,
) -> ApiResult<Json<RestoreReport>> {
    admin.require_backup_access()?;

    let document = state.store.load(&admin.0.id, &name).await?;
    let report = state.db.backups().restore(&document).await?;
    info!(admin_id = %admin.0.id, name = %name, "Stored backup restored");
    Ok(Json(report))
}
