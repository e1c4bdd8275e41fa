

pub mod config;
pub mod error;

pub use config::DialectConfig;
pub use error::{DialectError, Result};
