use std::alloc::Layout;
use thiserror::Error;

/// Failures that can occur while a [`Table`](crate::table::Table) acquires
/// bucket storage for one of its two spaces.
///
/// `get`/`put`/`remove` themselves never fail: key-not-found and
/// key-already-exists are reported through their return shapes, not through
/// this type. `TableError` only shows up on the allocation seam — lazy
/// allocation of a space's bucket array on first insert, or allocation of a
/// new primary's bucket array during resize.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("allocation failed for layout {0:?}")]
    Alloc(Layout),
    #[error("capacity overflow while sizing table for {requested} entries")]
    CapacityOverflow { requested: u32 },
}

pub type Result<T> = std::result::Result<T, TableError>;
