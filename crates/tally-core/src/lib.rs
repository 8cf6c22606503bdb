//! Core types and trait definitions for the Tally attendance tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It holds the attendance arithmetic, the ledger effect table, the schedule
//! resolver, and the [`store::AttendanceStore`] abstraction that backends
//! implement.

pub mod clock;
pub mod error;
pub mod event;
pub mod ledger;
pub mod schedule;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod subject;
pub mod summary;
pub mod threshold;

pub use error::{Error, Result};
