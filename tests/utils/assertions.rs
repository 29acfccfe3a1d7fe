//! Test assertion helpers - fluent API for verifying response envelopes
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::http::StatusCode;
use serde_json::Value;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct ResponseAssertion {
    status: StatusCode,
    body: Value,
}

impl ResponseAssertion {
    pub fn new((status, body): (StatusCode, Value)) -> Self {
        Self { status, body }
    }

    /// Assert a successful envelope with the given status
    pub fn succeeded_with(self, expected: StatusCode) -> Self {
        assert_eq!(self.status, expected, "unexpected status, body: {}", self.body);
        assert_eq!(self.body["success"], true, "body: {}", self.body);
        self
    }

    pub fn ok(self) -> Self {
        self.succeeded_with(StatusCode::OK)
    }

    /// Assert an error envelope with the given status
    pub fn failed_with(self, expected: StatusCode) -> Self {
        assert_eq!(self.status, expected, "unexpected status, body: {}", self.body);
        assert_eq!(self.body["success"], false, "body: {}", self.body);
        self
    }

    pub fn with_message(self, expected: &str) -> Self {
        assert_eq!(self.body["message"], expected);
        self
    }

    /// Hand back the body for field-level checks
    pub fn body(self) -> Value {
        self.body
    }
}
