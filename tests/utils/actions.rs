#![allow(dead_code)] // Not every helper is used by every test file

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::TestApp;

/// A signed-in account as seen by the tests
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

// ============================================================================
// Raw Request Helpers
// ============================================================================

impl TestApp {
    /// Send a request and return the status with the decoded JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("jwtToken={}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(token), None).await
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Register an account with the given role and return its session
    pub async fn register(&self, name: &str, email: &str, role: &str) -> Session {
        let (status, body) = self
            .post(
                "/api/v1/users/register",
                None,
                json!({
                    "name": name,
                    "email": email,
                    "password": "secret123",
                    "phone": "9876543210",
                    "gender": "female",
                    "dob": "1990-04-12",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", email, body);

        Session {
            user_id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Create a doctor profile for the session and return the doctor id
    pub async fn create_doctor_profile(&self, doctor: &Session) -> String {
        let (status, body) = self
            .post(
                "/api/v1/doctors/create-doctor-profile",
                Some(&doctor.token),
                json!({
                    "specialization": "Cardiologist",
                    "qualifications": ["MBBS", "MD"],
                    "experience": 8,
                    "department": "Cardiology",
                    "availableSlots": [{ "date": "2030-05-01", "time": "09:30" }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create doctor: {}", body);
        body["doctor"]["id"].as_str().unwrap().to_string()
    }

    /// Register the session as a patient under the given doctor
    pub async fn register_patient(&self, patient: &Session, doctor_id: Option<&str>) -> String {
        let mut request = json!({
            "bloodGroup": "O+",
            "emergencyContact": { "name": "Ravi", "relation": "Brother", "phone": "9000000000" },
            "allergies": ["Penicillin"],
        });
        if let Some(doctor_id) = doctor_id {
            request["doctorId"] = json!(doctor_id);
        }

        let (status, body) = self
            .post("/api/v1/patients/add-patient", Some(&patient.token), request)
            .await;
        assert_eq!(status, StatusCode::CREATED, "register patient: {}", body);
        body["patient"]["id"].as_str().unwrap().to_string()
    }

    /// Book an appointment the given number of days from now
    pub async fn book_in_days(&self, patient: &Session, days: i64, time: &str) -> (StatusCode, Value) {
        self.post(
            "/api/v1/appointments/book-appointment",
            Some(&patient.token),
            json!({ "date": date_in_days(days), "time": time, "symptoms": "Chest pain" }),
        )
        .await
    }
}

/// Local calendar date `days` from today, formatted the way the API expects
pub fn date_in_days(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
