//! Domain models for the Inventory Back-Office service

mod invoice;
mod ledger;
mod order;
mod product;
mod user;

pub use invoice::*;
pub use ledger::*;
pub use order::*;
pub use product::*;
pub use user::*;
