//! Core traits for shelfsync
//!
//! This module defines the abstract interfaces the synchronizer is built on.
//!
//! - [`RecordStore`]: Remote persistence of the library tables
//! - [`Clock`]: Source of the current calendar date

pub mod clock;
pub mod record_store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use record_store::{Condition, Order, Record, RecordStore, RecordStoreFactory, Table};
