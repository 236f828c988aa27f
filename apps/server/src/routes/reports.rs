//! Sales reports over Paid purchases, bucketed in the server's local time.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Local;

use crate::error::ApiResult;
use crate::extract::CurrentAdmin;
use crate::state::SharedState;
use madeh_core::report::{export_csv, summarize, ReportFilter, SalesReport};

async fn build(state: &SharedState, filter: ReportFilter) -> ApiResult<SalesReport> {
    let paid = state.db.purchases().paid().await?;
    Ok(summarize(paid, filter, &Local::now()))
}

pub async fn sales(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    filter: Result<Query<ReportFilter>, QueryRejection>,
) -> ApiResult<Json<SalesReport>> {
    let Query(filter) = filter?;
    Ok(Json(build(&state, filter).await?))
}

pub async fn sales_csv(
    State(state): State<SharedState>,
    _admin: CurrentAdmin,
    filter: Result<Query<ReportFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter?;
    let report = build(&state, filter).await?;
    let csv = export_csv(&report.purchases, &Local)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"sales-report.csv\"",
            ),
        ],
        csv,
    ))
}
