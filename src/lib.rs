pub mod config;
pub mod error;
pub mod handlers;
pub mod libraries;
pub mod models;
pub mod server;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use server::{build_app, AppState};
