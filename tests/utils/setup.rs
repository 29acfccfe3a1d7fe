use axum::Router;

use medicare_server::{build_router, AppConfig, AppState};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A router over in-memory repositories, shared by every request of a test
pub struct TestApp {
    pub router: Router,
}

pub struct TestAppBuilder {
    config: AppConfig,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig {
                // lowest cost bcrypt accepts
                bcrypt_cost: 4,
                ..AppConfig::default()
            },
        }
    }

    #[allow(dead_code)]
    pub fn with_jwt_secret(mut self, secret: &str) -> Self {
        self.config.jwt_secret = secret.to_string();
        self
    }

    pub fn build(self) -> TestApp {
        let state = AppState::in_memory(&self.config);
        TestApp {
            router: build_router(state),
        }
    }
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
