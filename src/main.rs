mod auth;
mod config;
mod db;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use auth::blacklist::RedisRevocationStore;
use auth::handlers::{
    list_users_handler, login_handler, logout_handler, me_handler, refresh_handler,
    register_handler,
};
use auth::middleware::RequireRole;
use auth::repository::PostgresCredentialStore;
use auth::service::AuthService;
use auth::session::SessionManager;
use auth::token::TokenCodec;
use config::AuthConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub sessions: Arc<SessionManager>,
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Creates and configures the application router
///
/// Role requirements are declared per route here, as plain data consumed by
/// the authorization middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_routes = Router::new()
        .route("/api/admin/users", get(list_users_handler))
        .route_layer(axum_middleware::from_fn({
            let guard = RequireRole::admin(state.sessions.clone());
            move |request, next| guard.clone().middleware(request, next)
        }));

    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        .merge(admin_routes)
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_api=debug,info".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Account API - Starting...");

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let redis_url = std::env::var("REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    let auth_config = AuthConfig::from_env().expect("Invalid auth configuration");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let redis_conn = db::create_redis(&redis_url)
        .await
        .expect("Failed to connect to Redis");

    let sessions = Arc::new(SessionManager::new(
        TokenCodec::new(&auth_config),
        Arc::new(RedisRevocationStore::new(redis_conn)),
    ));
    let auth_service = Arc::new(AuthService::new(
        Arc::new(PostgresCredentialStore::new(db_pool)),
        sessions.clone(),
    ));

    let app = create_router(AppState {
        auth: auth_service,
        sessions,
    });

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Account API is running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
