//! HTTP handlers for the Inventory Back-Office API

pub mod auth;
pub mod cron;
pub mod health;
pub mod invoice;
pub mod order;
pub mod product;
pub mod rating;
pub mod statistics;
pub mod user;

pub use auth::*;
pub use cron::*;
pub use health::*;
pub use invoice::*;
pub use order::*;
pub use product::*;
pub use rating::*;
pub use statistics::*;
pub use user::*;
