use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;
const DEFAULT_BCRYPT_COST: u32 = 10;
const DEV_JWT_SECRET: &str = "medicare-dev-secret-change-in-production";

/// Process-wide settings read from the environment at start-up
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Postgres URL; when absent the server runs on in-memory repositories
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub session_expiration_days: i64,
    /// Marks the session cookie `Secure` (production only)
    pub secure_cookies: bool,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using development secret");
            DEV_JWT_SECRET.to_string()
        });

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Self {
            port: parse_env("PORT", DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            jwt_secret,
            session_expiration_days: parse_env(
                "SESSION_EXPIRATION_DAYS",
                DEFAULT_SESSION_EXPIRATION_DAYS,
            ),
            secure_cookies: app_env.eq_ignore_ascii_case("production"),
            bcrypt_cost: parse_env("BCRYPT_COST", DEFAULT_BCRYPT_COST),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
            secure_cookies: false,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

fn parse_env<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = %key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
