//! Dividing an expense total among its participants.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use error::SplitError;
pub use service::divide;
pub use types::Share;
