//! Request extractors for authenticated handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn handler(CurrentAdmin(admin): CurrentAdmin) -> impl IntoResponse {
//!     format!("Hello, {}!", admin.username)
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::{debug, warn};

use crate::auth::extract_bearer_token;
use crate::error::ApiError;
use crate::state::SharedState;
use madeh_core::Admin;

/// The signed-in admin, resolved from the bearer token on every request.
///
/// Rejects with 401 when the token is missing, invalid or expired, or when
/// the account no longer exists or is inactive.
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub Admin);

impl FromRequestParts<SharedState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Sign in required"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Sign in required"))?;

        let claims = state.jwt.validate(token)?;

        let admin = state
            .db
            .admins()
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

        if !admin.is_active() {
            warn!(admin_id = %admin.id, "Inactive admin presented a session token");
            return Err(ApiError::unauthorized("Account is inactive"));
        }

        debug!(admin_id = %admin.id, "Request authenticated");
        Ok(CurrentAdmin(admin))
    }
}

impl CurrentAdmin {
    /// Backup and restore are Super Admin operations.
    pub fn require_backup_access(&self) -> Result<(), ApiError> {
        if self.0.role.can_manage_backups() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only a Super Admin can manage backups"))
        }
    }
}
