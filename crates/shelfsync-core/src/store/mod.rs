// # Record Store Implementations
//
// This module provides implementations of the RecordStore trait that ship
// with the core crate. HTTP backends live in their own crates.

pub mod file;
pub mod memory;

pub use file::{FileRecordStore, FileRecordStoreFactory};
pub use memory::{MemoryRecordStore, MemoryRecordStoreFactory};
