//! Jellyfin catalog mirror - shared modules for the CLI and integration tests.

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod schema;
pub mod scoring;
pub mod search;
pub mod source;
pub mod store;
pub mod sync;

pub use config::Settings;
pub use error::{Error, Result};
pub use store::Store;
