pub mod models;
pub mod platform;
pub mod services;
pub mod state_machine;
pub mod utilities;
pub mod views;
