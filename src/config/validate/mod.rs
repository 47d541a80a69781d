//! Configuration validation
//!
//! Validates task configurations for correctness before setup.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::{validate_config, validate_data, validate_trainer};
