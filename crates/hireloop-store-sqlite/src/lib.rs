//! SQLite backend for the Hireloop marketplace store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod booking;
mod encode;
mod identity;
mod profiles;
mod schema;
mod store;
mod taxonomy;
mod verification;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
