// Public API - what other modules can use
pub use handlers::{
    admit_patient, discharge_patient, get_all_patients, get_patient_by_id, register_patient,
    update_patient_profile,
};
pub use service::PatientService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
