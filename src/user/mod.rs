// Public API - what other modules can use
pub use handlers::{
    delete_user, get_all_users, get_user_by_id, login_user, logout_user, register_user,
    reset_password, update_user_profile,
};
pub use service::UserService;

// Internal modules
mod handlers;
pub mod models;
mod password;
pub mod repository;
mod service;
pub mod types;
