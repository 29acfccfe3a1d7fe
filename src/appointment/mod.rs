// Public API - what other modules can use
pub use handlers::{
    book_appointment, delete_appointment, get_appointment_by_id, get_booked_appointments,
    get_my_appointments, update_appointment,
};
pub use service::AppointmentService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
