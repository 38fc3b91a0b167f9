pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod state;

pub use config::Config;
pub use errors::{ApiError, Result};
pub use state::AppState;
