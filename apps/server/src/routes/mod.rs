//! HTTP routes.
//!
//! Everything under `/api` requires a bearer token except `/api/auth/login`.

pub mod auth;
pub mod backups;
pub mod cart;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod purchases;
pub mod reports;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

/// Body limit for CSV imports and backup restores. Other routes keep axum's 2 MB default.
pub const BULK_BODY_LIMIT: usize = 64 * 1024 * 1024;

pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        // Accounts
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/password", put(auth::change_password))
        // Catalog
        .route("/products", get(products::list).post(products::create))
        .route("/products/categories", get(products::categories))
        .route(
            "/products/bulk-upload",
            post(products::bulk_upload).layer(DefaultBodyLimit::max(BULK_BODY_LIMIT)),
        )
        .route(
            "/products/bulk-update",
            post(products::bulk_update).layer(DefaultBodyLimit::max(BULK_BODY_LIMIT)),
        )
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        // Sales
        .route("/cart/quote", post(cart::quote))
        .route("/purchases", get(purchases::list).post(purchases::checkout))
        .route("/purchases/{id}", get(purchases::detail))
        .route("/purchases/{id}/mark-paid", post(purchases::mark_paid))
        // Reporting
        .route("/reports/sales", get(reports::sales))
        .route("/reports/sales.csv", get(reports::sales_csv))
        .route("/dashboard", get(dashboard::dashboard))
        // Backups
        .route("/backups", get(backups::list).post(backups::create))
        .route(
            "/backups/restore",
            post(backups::restore_body).layer(DefaultBodyLimit::max(BULK_BODY_LIMIT)),
        )
        .route("/backups/{name}/restore", post(backups::restore_stored));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::ServerConfig;
    use crate::state::AppState;
    use madeh_core::{AdminRole, AdminStatus, NewProduct};
    use madeh_db::{Database, DbConfig, NewAdmin};

    const PASSWORD: &str = "counter-pass";

    struct TestApp {
        router: Router,
        state: SharedState,
    }

    async fn app() -> TestApp {
        let storage = std::env::temp_dir().join(format!("madeh-api-{}", Uuid::new_v4()));
        let config = ServerConfig::from_lookup(|key| match key {
            "MADEH_STORAGE_DIR" => Some(storage.display().to_string()),
            "MADEH_JWT_SECRET" => Some("router-test-secret".to_string()),
            _ => None,
        })
        .unwrap();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = Arc::new(AppState::from_parts(config, db));
        TestApp {
            router: router(state.clone()),
            state,
        }
    }

    impl TestApp {
        async fn admin(&self, email: &str, role: AdminRole) -> String {
            self.state
                .db
                .admins()
                .create(&NewAdmin {
                    email: email.to_string(),
                    username: "Test Admin".to_string(),
                    role,
                    password: PASSWORD.to_string(),
                })
                .await
                .unwrap();
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/auth/login",
                    None,
                    Some(json!({ "email": email, "password": PASSWORD })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["token"].as_str().unwrap().to_string()
        }

        async fn product(&self, name: &str, price_cents: i64, stock: i64) -> String {
            self.state
                .db
                .products()
                .insert(&NewProduct {
                    name: name.to_string(),
                    category: "Tools".to_string(),
                    price_cents,
                    cost_cents: None,
                    stock,
                })
                .await
                .unwrap()
                .id
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.call(request).await
        }

        async fn send_text(&self, uri: &str, token: &str, body: &str) -> (StatusCode, Value) {
            let request = Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.call(request).await
        }

        async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let app = app().await;
        let (status, body) = app.send(Method::GET, "/api/products", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = app
            .send(Method::GET, "/api/products", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password_and_inactive_account() {
        let app = app().await;
        app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "cashier@madeh.co.ke", "password": "wrong-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");

        let admin = app
            .state
            .db
            .admins()
            .get_by_email("cashier@madeh.co.ke")
            .await
            .unwrap()
            .unwrap();
        app.state
            .db
            .admins()
            .set_status(&admin.id, AdminStatus::Inactive)
            .await
            .unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "cashier@madeh.co.ke", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Account is inactive");
    }

    #[tokio::test]
    async fn test_inactive_admin_loses_session() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;

        let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "Cashier");

        let id = body["id"].as_str().unwrap().to_string();
        app.state
            .db
            .admins()
            .set_status(&id, AdminStatus::Inactive)
            .await
            .unwrap();

        let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_checkout_flow() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;
        let brush = app.product("Paint Brush", 1599, 10).await;
        let tape = app.product("Masking Tape", 875, 4).await;

        // Quote merges repeated lines.
        let (status, quote) = app
            .send(
                Method::POST,
                "/api/cart/quote",
                Some(&token),
                Some(json!({ "items": [
                    { "product_id": brush, "quantity": 1 },
                    { "product_id": tape, "quantity": 1 },
                    { "product_id": brush, "quantity": 1 },
                ]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["totals"]["item_count"], 2);
        assert_eq!(quote["totals"]["total_cents"], 4073);

        let (status, receipt) = app
            .send(
                Method::POST,
                "/api/purchases",
                Some(&token),
                Some(json!({
                    "items": [
                        { "product_id": brush, "quantity": 2, "price_cents": 1599 },
                        { "product_id": tape, "quantity": 1, "price_cents": 875 },
                    ],
                    "payment_method": "M-Pesa",
                    "payment_status": "Unpaid",
                    "customer_name": "Jane Wanjiku",
                    "customer_id_number": "12345678",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["purchase"]["total_cents"], 4073);
        assert_eq!(receipt["items"].as_array().unwrap().len(), 2);
        let purchase_id = receipt["purchase"]["id"].as_str().unwrap().to_string();

        let (_, product) = app
            .send(Method::GET, &format!("/api/products/{brush}"), Some(&token), None)
            .await;
        assert_eq!(product["stock"], 8);

        let (status, detail) = app
            .send(
                Method::GET,
                &format!("/api/purchases/{purchase_id}"),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["purchase"]["created_by_name"], "Test Admin");

        let (_, unpaid) = app
            .send(Method::GET, "/api/purchases?status=Unpaid", Some(&token), None)
            .await;
        assert_eq!(unpaid.as_array().unwrap().len(), 1);

        let uri = format!("/api/purchases/{purchase_id}/mark-paid");
        let (status, outcome) = app.send(Method::POST, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["already_paid"], false);
        assert_eq!(outcome["purchase"]["payment_status"], "Paid");
        assert_eq!(outcome["purchase"]["customer_name"], "Jane Wanjiku");

        let (_, outcome) = app.send(Method::POST, &uri, Some(&token), None).await;
        assert_eq!(outcome["already_paid"], true);

        let (status, report) = app
            .send(Method::GET, "/api/reports/sales?period=today", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["count"], 1);
        assert_eq!(report["total_cents"], 4073);

        let (_, dashboard) = app.send(Method::GET, "/api/dashboard", Some(&token), None).await;
        assert_eq!(dashboard["product_count"], 2);
        assert_eq!(dashboard["total_sales_cents"], 4073);
        assert_eq!(dashboard["unpaid_count"], 0);
        // Masking Tape is down to 3, under the default threshold of 5.
        assert_eq!(dashboard["low_stock"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_insufficient_stock_is_conflict() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;
        let hammer = app.product("Claw Hammer", 125000, 3).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/purchases",
                Some(&token),
                Some(json!({
                    "items": [{ "product_id": hammer, "quantity": 5, "price_cents": 125000 }],
                    "payment_method": "Cash",
                    "payment_status": "Paid",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["details"]["available"], 3);

        let (_, purchases) = app.send(Method::GET, "/api/purchases", Some(&token), None).await;
        assert!(purchases.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unpaid_checkout_requires_customer() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;
        let hammer = app.product("Claw Hammer", 125000, 3).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/purchases",
                Some(&token),
                Some(json!({
                    "items": [{ "product_id": hammer, "quantity": 1, "price_cents": 125000 }],
                    "payment_method": "Cash",
                    "payment_status": "Unpaid",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_checkout_price_above_maximum_is_rejected() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;
        let hammer = app.product("Claw Hammer", 125000, 5).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/purchases",
                Some(&token),
                Some(json!({
                    "items": [{ "product_id": hammer, "quantity": 3, "price_cents": 6_148_914_691_236_517_206_i64 }],
                    "payment_method": "Cash",
                    "payment_status": "Paid",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (_, purchases) = app.send(Method::GET, "/api/purchases", Some(&token), None).await;
        assert!(purchases.as_array().unwrap().is_empty());
        let (_, product) = app
            .send(Method::GET, &format!("/api/products/{hammer}"), Some(&token), None)
            .await;
        assert_eq!(product["stock"], 5);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Generator", "category": "Tools",
                             "price_cents": madeh_core::MAX_PRICE_CENTS + 1, "stock": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_sold_product_is_conflict() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Admin).await;
        let nails = app.product("Wire Nails", 22000, 10).await;

        let (status, _) = app
            .send(
                Method::POST,
                "/api/purchases",
                Some(&token),
                Some(json!({
                    "items": [{ "product_id": nails, "quantity": 1, "price_cents": 22000 }],
                    "payment_method": "Cash",
                    "payment_status": "Paid",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/api/products/{nails}");
        let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_report_method_all() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;

        let (status, report) = app
            .send(Method::GET, "/api/reports/sales?period=all&method=all", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["filter"]["method"], Value::Null);

        let (status, _) = app
            .send(Method::GET, "/api/reports/sales?method=Cheque", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_upload_accepts_large_body() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Admin).await;

        // A 3 MB file: over axum's default limit, well under the bulk limit.
        let long_name = "x".repeat(3 * 1024 * 1024);
        let csv = format!("Name,Category,Price,Stock\nClaw Hammer,Tools,1250,24\n{long_name},Tools,10,1\n");
        let (status, report) = app.send_text("/api/products/bulk-upload", &token, &csv).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["success"], 1);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/products",
                Some(&token),
                Some(json!({ "name": long_name, "category": "Tools", "price_cents": 100, "stock": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_product_crud_and_bulk_upload() {
        let app = app().await;
        let token = app.admin("cashier@madeh.co.ke", AdminRole::Admin).await;

        let (status, created) = app
            .send(
                Method::POST,
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Spirit Level", "category": "Tools", "price_cents": 110000, "stock": 8 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(
                Method::POST,
                "/api/products",
                Some(&token),
                Some(json!({ "name": "spirit level", "category": "Tools", "price_cents": 100, "stock": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE");

        let csv = "Name,Category,Price,Stock\n\
                   Wire Nails,Fasteners,220.00,120\n\
                   ,Fasteners,1.00,1\n\
                   Spirit Level,Tools,1.00,1\n";
        let (status, report) = app.send_text("/api/products/bulk-upload", &token, csv).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["success"], 1);
        assert_eq!(report["errors"].as_array().unwrap().len(), 2);

        let (_, found) = app
            .send(Method::GET, "/api/products?q=nail", Some(&token), None)
            .await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, categories) = app
            .send(Method::GET, "/api/products/categories", Some(&token), None)
            .await;
        assert_eq!(categories, json!(["Fasteners", "Tools"]));

        let (status, updated) = app
            .send(
                Method::PUT,
                &format!("/api/products/{id}"),
                Some(&token),
                Some(json!({ "stock": 20 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["stock"], 20);
        assert_eq!(updated["name"], "Spirit Level");

        let (status, _) = app
            .send(Method::DELETE, &format!("/api/products/{id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app
            .send(Method::GET, &format!("/api/products/{id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_backups_are_super_admin_only() {
        let app = app().await;
        let cashier = app.admin("cashier@madeh.co.ke", AdminRole::Cashier).await;
        let owner = app.admin("owner@madeh.co.ke", AdminRole::SuperAdmin).await;
        app.product("Claw Hammer", 125000, 3).await;

        let (status, body) = app.send(Method::POST, "/api/backups", Some(&cashier), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, created) = app.send(Method::POST, "/api/backups", Some(&owner), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["document"]["data"]["products"].as_array().unwrap().len(), 1);
        let name = created["info"]["name"].as_str().unwrap().to_string();
        assert!(name.starts_with("madeh-hardware-backup-"));

        let (_, listed) = app.send(Method::GET, "/api/backups", Some(&owner), None).await;
        assert_eq!(listed[0]["name"], name.as_str());

        let (status, report) = app
            .send(
                Method::POST,
                &format!("/api/backups/{name}/restore"),
                Some(&owner),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["products"], 1);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/backups/restore",
                Some(&owner),
                Some(json!({ "createdAt": "2024-06-15T09:00:00Z", "data": { "products": [] } })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_BACKUP");

        let _ = std::fs::remove_dir_all(&app.state.config.storage_dir);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = app.call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
