//! Sync orchestration: categories, products, classify-and-create, cleanup.
//!
//! The phases talk to the outside world only through the traits in
//! [`ports`]; [`pg`] and [`probe`] provide the production implementations.

mod categories;
mod cleanup;
mod create;
mod products;

pub mod error;
pub mod pg;
pub mod ports;
pub mod probe;
pub mod report;
pub mod syncer;

#[cfg(test)]
mod fakes;

pub use error::SyncError;
pub use pg::{PgShop, PgStaging};
pub use ports::{CatalogSource, ImageProbe, ShopStore, StagingStore};
pub use probe::HttpImageProbe;
pub use report::{CategoryReport, CleanupReport, CreateReport, ProductReport, SyncReport};
pub use syncer::{SyncOptions, SyncPhase, Syncer};
