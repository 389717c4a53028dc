//! Core business logic for Divvy.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All splitting and settlement calculations live here.
//!
//! # Modules
//!
//! - `split` - Dividing an expense total among its participants
//! - `settlement` - Aggregating a group's expenses into net balances

pub mod settlement;
pub mod split;
