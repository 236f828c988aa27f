//! # Admin Repository
//!
//! Accounts for the management console. Password hashes never leave this
//! module except through [`AdminRepository::verify_credentials`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::password::{hash_password, verify_password};
use madeh_core::validation::{validate_display_name, validate_new_password};
use madeh_core::{Admin, AdminRole, AdminStatus, CoreError};

const ADMIN_COLUMNS: &str = "id, email, username, role, status, created_at, updated_at";

/// Fields for creating an admin account.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub username: String,
    pub role: AdminRole,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: SqlitePool,
}

impl AdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdminRepository { pool }
    }

    pub async fn create(&self, admin: &NewAdmin) -> DbResult<Admin> {
        validate_display_name(&admin.username).map_err(CoreError::from)?;
        validate_new_password(&admin.password, &admin.password).map_err(CoreError::from)?;

        let email = admin.email.trim().to_lowercase();
        let now = Utc::now();
        let stored = Admin {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            username: admin.username.trim().to_string(),
            role: admin.role,
            status: AdminStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let hash = hash_password(&admin.password)?;

        sqlx::query(
            "INSERT INTO admins (id, email, username, role, status, password_hash, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&stored.id)
        .bind(&stored.email)
        .bind(&stored.username)
        .bind(stored.role)
        .bind(stored.status)
        .bind(hash)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", email.as_str()),
            other => other,
        })?;

        info!(id = %stored.id, role = ?stored.role, "Admin created");
        Ok(stored)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = ?1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    /// Returns the admin when the email exists and the password matches.
    ///
    /// Inactive accounts are returned too; the caller decides whether they
    /// may sign in.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DbResult<Option<Admin>> {
        debug!("Verifying admin credentials");

        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM admins WHERE email = ?1")
                .bind(email.trim())
                .fetch_optional(&self.pool)
                .await?;

        let Some(hash) = hash else {
            return Ok(None);
        };
        if !verify_password(password, &hash) {
            warn!("Password verification failed");
            return Ok(None);
        }

        self.get_by_email(email).await
    }

    /// Updates the display name and returns the stored profile.
    pub async fn update_username(&self, id: &str, username: &str) -> DbResult<Admin> {
        validate_display_name(username).map_err(CoreError::from)?;

        let result = sqlx::query("UPDATE admins SET username = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(username.trim())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Admin", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Admin", id))
    }

    /// Replaces the password after checking length and confirmation.
    pub async fn change_password(&self, id: &str, password: &str, confirmation: &str) -> DbResult<()> {
        validate_new_password(password, confirmation).map_err(CoreError::from)?;

        let hash = hash_password(password)?;
        let result = sqlx::query("UPDATE admins SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Admin", id));
        }

        info!(id = %id, "Admin password changed");
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: AdminStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE admins SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Admin", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database;

    fn cashier() -> NewAdmin {
        NewAdmin {
            email: "Cashier@Madeh.co.ke".into(),
            username: "Counter One".into(),
            role: AdminRole::Cashier,
            password: "till-001".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_verify() {
        let db = database().await;
        let repo = db.admins();
        let created = repo.create(&cashier()).await.unwrap();
        assert_eq!(created.email, "cashier@madeh.co.ke");

        let ok = repo.verify_credentials("CASHIER@madeh.co.ke", "till-001").await.unwrap();
        assert_eq!(ok.map(|a| a.id), Some(created.id.clone()));

        assert!(repo.verify_credentials("cashier@madeh.co.ke", "wrong").await.unwrap().is_none());
        assert!(repo.verify_credentials("nobody@madeh.co.ke", "till-001").await.unwrap().is_none());

        let err = repo.create(&cashier()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_profile_and_password() {
        let db = database().await;
        let repo = db.admins();
        let admin = repo.create(&cashier()).await.unwrap();

        let renamed = repo.update_username(&admin.id, "  Front Desk ").await.unwrap();
        assert_eq!(renamed.username, "Front Desk");
        assert!(repo.update_username(&admin.id, "   ").await.is_err());

        assert!(repo.change_password(&admin.id, "abc", "abc").await.is_err());
        assert!(repo.change_password(&admin.id, "new-pass", "new-pazz").await.is_err());
        repo.change_password(&admin.id, "new-pass", "new-pass").await.unwrap();
        assert!(repo
            .verify_credentials(&admin.email, "new-pass")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_status_round_trip() {
        let db = database().await;
        let repo = db.admins();
        let admin = repo.create(&cashier()).await.unwrap();

        repo.set_status(&admin.id, AdminStatus::Inactive).await.unwrap();
        let stored = repo.get_by_id(&admin.id).await.unwrap().unwrap();
        assert!(!stored.is_active());
    }
}
