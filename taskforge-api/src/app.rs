/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskforge_api::{app::AppState, audit::AuditDispatcher, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let audit = AuditDispatcher::spawn(pool.clone(), config.audit.queue_capacity);
/// let state = AppState::new(pool, config, audit);
/// let app = taskforge_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{audit::AuditDispatcher, config::Config};
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskforge_shared::auth::{jwt, middleware::AuthContext};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Asynchronous audit trail dispatcher
    pub audit: AuditDispatcher,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, audit: AuditDispatcher) -> Self {
        Self {
            db,
            config: Arc::new(config),
            audit,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// The router is organized as follows:
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// ├── /v1/                          # API v1 (versioned, JWT required)
/// │   ├── /tasks/                   # Task management
/// │   │   ├── GET    /              # List (filter/sort/include/paginate)
/// │   │   ├── POST   /              # Create
/// │   │   ├── GET    /:id           # Fetch one
/// │   │   ├── PUT    /:id           # Update (version-guarded)
/// │   │   ├── DELETE /:id                 # Soft delete
/// │   │   ├── PATCH  /:id/restore         # Restore a soft-deleted task
/// │   │   └── PATCH  /:id/toggle-status   # Cycle workflow status
/// │   └── /tags/                    # Tag management (mutations admin-only)
/// │       ├── GET    /              # List
/// │       ├── POST   /              # Create
/// │       ├── GET    /:id           # Fetch one
/// │       ├── PUT    /:id           # Update
/// │       └── DELETE /:id           # Delete
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    // Import route handlers
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new()
        .route("/health", get(routes::health::health_check));

    // Task routes (require JWT authentication)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list::list_tasks))
        .route("/", post(routes::tasks::create::create_task))
        .route("/:id", get(routes::tasks::get::get_task))
        .route("/:id", put(routes::tasks::update::update_task))
        .route("/:id", delete(routes::tasks::delete::delete_task))
        .route("/:id/restore", patch(routes::tasks::restore::restore_task))
        .route(
            "/:id/toggle-status",
            patch(routes::tasks::toggle_status::toggle_task_status),
        );

    // Tag routes (require JWT authentication; mutations check admin role
    // in the handlers)
    let tag_routes = Router::new()
        .route("/", get(routes::tags::list_tags))
        .route("/", post(routes::tags::create_tag))
        .route("/:id", get(routes::tags::get_tag))
        .route("/:id", put(routes::tags::update_tag))
        .route("/:id", delete(routes::tags::delete_tag));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/tags", tag_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates JWT token from Authorization header,
/// then injects AuthContext into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    // Parse Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    // Validate token
    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    // Create auth context
    let auth_context = AuthContext::from_claims(&claims);

    // Insert into request extensions
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
