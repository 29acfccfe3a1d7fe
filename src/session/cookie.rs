use axum_extra::extract::cookie::{Cookie, SameSite};

/// Name of the HTTP-only cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwtToken";

#[derive(Debug, Clone)]
pub struct CookieConfig {
    max_age_days: i64,
    secure: bool,
}

impl CookieConfig {
    pub fn new(max_age_days: i64, secure: bool) -> Self {
        Self {
            max_age_days,
            secure,
        }
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(time::Duration::days(self.max_age_days))
            .build()
    }

    /// Cookie handed to `CookieJar::remove`; path must match the session cookie
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .build()
    }
}
