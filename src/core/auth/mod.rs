// Core auth module - credential model and session acquisition logic.

pub mod auth_models;
pub mod session_service;

pub use auth_models::*;
pub use session_service::*;
