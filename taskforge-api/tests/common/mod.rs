/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation (regular and admin)
/// - JWT token generation
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use sqlx::PgPool;
use taskforge_api::app::{build_router, AppState};
use taskforge_api::audit::AuditDispatcher;
use taskforge_api::config::Config;
use taskforge_shared::auth::jwt::{create_access_token, Claims};
use taskforge_shared::models::user::{User, UserRole};
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub admin: User,
    pub user_token: String,
    pub admin_token: String,
}

impl TestContext {
    /// Creates a new test context against the database in DATABASE_URL
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        // Create one regular and one admin user per context; unique emails
        // keep parallel test runs from colliding
        let user = User::create(
            &db,
            "Test User",
            &format!("user-{}@example.com", Uuid::new_v4()),
            UserRole::User,
        )
        .await?;

        let admin = User::create(
            &db,
            "Test Admin",
            &format!("admin-{}@example.com", Uuid::new_v4()),
            UserRole::Admin,
        )
        .await?;

        // Generate JWT tokens
        let user_token =
            create_access_token(&Claims::new(user.id, UserRole::User), &config.jwt.secret)?;
        let admin_token =
            create_access_token(&Claims::new(admin.id, UserRole::Admin), &config.jwt.secret)?;

        // Build app
        let audit = AuditDispatcher::spawn(db.clone(), config.audit.queue_capacity);
        let state = AppState::new(db.clone(), config.clone(), audit);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            admin,
            user_token,
            admin_token,
        })
    }

    /// Returns authorization header value for the regular user
    pub fn user_auth(&self) -> String {
        format!("Bearer {}", self.user_token)
    }

    /// Returns authorization header value for the admin
    pub fn admin_auth(&self) -> String {
        format!("Bearer {}", self.admin_token)
    }

    /// Sends a JSON request through the router
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        auth: &str,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", auth);

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().call(request).await.unwrap()
    }

    /// Cleans up test data created by this context
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM audit_logs WHERE user_id = ANY($1)")
            .bind(vec![self.user.id, self.admin.id])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM tasks WHERE assigned_to = ANY($1)")
            .bind(vec![self.user.id, self.admin.id])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(vec![self.user.id, self.admin.id])
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Reads a JSON body, panicking with the payload on unexpected status
pub async fn json_body(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if status != expected {
        panic!(
            "Expected {}, got {}: {}",
            expected,
            status,
            String::from_utf8_lossy(&bytes)
        );
    }
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}
