// Public API - what other modules can use
pub use handlers::{
    add_available_slot, create_doctor_profile, delete_doctor_profile, get_all_doctors,
    get_available_slots, get_doctor_profile, remove_available_slot, update_doctor_profile,
};
pub use service::DoctorService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
