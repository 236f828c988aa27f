//! # Madeh Server
//!
//! HTTP API for the Madeh Hardware management console.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Madeh Server                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Accounts      │  │  Catalog       │  │  Sales                     ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • list/search  │  │ • cart quote               ││
//! │  │ • profile      │  │ • CRUD         │  │ • checkout (atomic)        ││
//! │  │ • password     │  │ • bulk CSV     │  │ • mark paid                ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  Reporting     │  │  Backups       │                                │
//! │  │                │  │  (Super Admin) │                                │
//! │  │ • sales + CSV  │  │ • create/list  │                                │
//! │  │ • dashboard    │  │ • restore      │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  CurrentAdmin extractor ──► JWT ──► admins table (active check)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::{AppState, SharedState};

/// Builds the full application router.
pub fn build_router(state: SharedState) -> axum::Router {
    routes::router(state)
}
