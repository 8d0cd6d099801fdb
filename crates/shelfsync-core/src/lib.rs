// # shelfsync-core
//
// Core library for keeping a client-side mirror of a library catalogue in
// step with a remote table store.
//
// ## Architecture Overview
//
// - **RecordStore**: Trait for the remote tables (`livros`, `membros`, `emprestimos`)
// - **Clock**: Trait supplying "today" for loan dates
// - **LibrarySynchronizer**: Mirror of the tables plus every mutation on them
// - **StoreRegistry**: Plugin-based registry of record store backends
// - **query**: Pure read-side helpers over a mirror snapshot
//
// ## Design Principles
//
// 1. **Remote first**: The mirror only changes after the store accepted a write
// 2. **Swallowed failures**: Mutations report failures as events and `None`, never panics
// 3. **Plugin-Based**: Stores are registered dynamically, no hard-coded if-else
// 4. **Library-First**: The binary is a thin shell over this crate
// 5. **Injected time**: Every date comes from a Clock, so tests pin the calendar

pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod registry;
pub mod store;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use config::{OverduePolicy, StoreConfig, SyncConfig};
pub use error::{Error, Result};
pub use model::{Book, BookPatch, Loan, LoanStatus, Member, MemberPatch, NewBook, NewMember, RecordId};
pub use query::ActiveFilter;
pub use registry::StoreRegistry;
pub use store::{FileRecordStore, MemoryRecordStore};
pub use sync::{LibraryStats, LibrarySynchronizer, Mirror, Operation, SyncEvent};
pub use traits::{Clock, FixedClock, RecordStore, SystemClock, Table};
