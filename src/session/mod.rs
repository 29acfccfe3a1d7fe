// Public API - what other modules can use
pub use cookie::{CookieConfig, SESSION_COOKIE};
pub use middleware::{jwt_auth, require_admin, require_doctor, require_patient};
pub use token::TokenConfig;
pub use types::{CurrentUser, SessionClaims};

// Internal modules
mod cookie;
mod middleware;
mod token;
mod types;
