// Authentication module
// Password hashing, JWT issuance/verification, revocation and role checks

pub mod blacklist;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{
    list_users_handler, login_handler, logout_handler, me_handler, refresh_handler,
    register_handler,
};
pub use middleware::{authorize, AuthenticatedUser, RequireRole};
pub use models::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, Role, User, UserResponse};
pub use service::AuthService;
pub use session::SessionManager;
