//! SQLite backend for the Tally attendance store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every logical mutation is a single
//! SQLite transaction executed inside one `call`, which also makes the
//! read-reverse-apply sequence of `mark_attendance` a critical section.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
