pub mod decimal;
pub mod error;
pub mod settings;
pub mod types;

pub use error::{AppError, AppResult};
