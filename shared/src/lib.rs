//! Shared types and models for the Inventory Back-Office service
//!
//! This crate holds the domain rules that do not need a database: product
//! status derivation, order and invoice lifecycles, id generation, date
//! parsing and the analytics bucketing used by the statistics endpoints.

pub mod analytics;
pub mod ids;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
