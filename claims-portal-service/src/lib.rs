pub mod config;
pub mod handlers;
pub mod models;
pub mod service;
pub mod uploads;

pub use config::Settings;
pub use service::{AppState, build_router, create_app};
