//! A Robin Hood-probed, open-addressed map from `u32` keys to `i64` values,
//! built around incremental (batched) migration between two coexisting
//! bucket arrays so that growth and shrink reshuffle the table gradually
//! instead of in one large pause.
//!
//! Callers are expected to have already reduced arbitrary keys to 32-bit
//! fingerprints; this crate does no key diffusion of its own beyond the
//! Fibonacci index mix applied internally to every key.
//!
//! ```
//! use hmap::Table;
//!
//! let mut table = Table::new();
//! let put = table.put(7, 100).unwrap();
//! assert!(!put.exists);
//! assert_eq!(table.get(7).unwrap().value, 100);
//! assert!(table.remove(7).unwrap());
//! assert!(table.get(7).is_none());
//! ```

/// Construction parameters and their sanitisation.
pub mod config;
/// Allocation failures and the one fallible seam of the engine.
pub mod error;

/// The allocator collaborator backing a [`Space`](crate::space::Space)'s bucket storage.
mod alloc;
/// A single slot in a space.
mod entry;
/// Fibonacci index mixing.
mod index;
/// A single bucket array plus the probing algorithms over it.
mod space;
/// The table engine: two spaces, a primary flag, and batched migration.
mod table;

pub use alloc::{SystemTableAlloc, TableAlloc};
pub use config::TableConfig;
pub use entry::Entry;
pub use error::{Result, TableError};
pub use table::{PutResult, Table};
