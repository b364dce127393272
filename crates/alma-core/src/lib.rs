pub mod config;
pub mod error;
pub mod types;

pub use config::AlmaConfig;
pub use error::{AlmaError, Result};
pub use types::*;
