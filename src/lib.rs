pub mod charts;
pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod inference_service;
pub mod routes;
pub mod state;
pub mod translation;
pub mod xlsx;

pub use error::{Result, ServiceError};
pub use state::AppState;
