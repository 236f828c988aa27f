//! # madeh-db: Database Layer for Madeh Hardware
//!
//! SQLite storage, typed repositories, and backup object storage.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          madeh-db                                       │
//! │                                                                         │
//! │  Database (pool.rs)                                                    │
//! │  ├── admins()     → AdminRepository     sign-in, profile               │
//! │  ├── products()   → ProductRepository   catalog, bulk import           │
//! │  ├── purchases()  → PurchaseRepository  create_purchase (atomic),      │
//! │  │                                      mark_paid, get_total_sales     │
//! │  └── backups()    → BackupRepository    snapshot / restore             │
//! │                                                                         │
//! │  BackupStore (storage.rs)  one directory per admin                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries are runtime-checked (`sqlx::query_as::<_, T>`) against
//! `FromRow` types from madeh-core, so no live database is needed at build
//! time.

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;
pub mod storage;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use storage::BackupStore;

pub use repository::admin::{AdminRepository, NewAdmin};
pub use repository::backup::BackupRepository;
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::purchase::PurchaseRepository;
