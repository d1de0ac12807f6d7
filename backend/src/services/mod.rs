//! Business logic services for the Inventory Back-Office

pub mod import;
pub mod invoice;
pub mod ledger;
pub mod order;
pub mod product;
pub mod rating;
pub mod statistics;
pub mod status_monitor;
pub mod user;

#[cfg(test)]
mod integration_tests;

pub use import::ImportService;
pub use invoice::InvoiceService;
pub use ledger::LedgerService;
pub use order::OrderService;
pub use product::ProductService;
pub use rating::RatingService;
pub use statistics::StatisticsService;
pub use status_monitor::StatusMonitor;
pub use user::UserService;
