//! Aggregating a group's expenses into per-member net balances.

pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use service::calculate;
pub use types::{BalanceView, ExpenseSnapshot, ShareSnapshot};
