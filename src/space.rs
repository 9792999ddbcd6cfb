//! A single bucket array plus its derived sizing parameters (spec.md §3,
//! "Space") and the three probing algorithms that operate on it in
//! isolation: Robin Hood insert, bounded linear fetch, and backward-shift
//! remove (spec.md §4.2–§4.4).
//!
//! A `Space` never allocates eagerly — `buckets` stays `None` until the
//! first insert, mirroring the lazily-`xcalloc`'d `buckets` pointer of the
//! original `HmapSpace`.

use crate::alloc::TableAlloc;
use crate::entry::Entry;
use crate::error::TableError;
use crate::index::idx;
use std::ptr::NonNull;

const MAX_BITS: u32 = 32;

pub(crate) struct Space {
    buckets: Option<NonNull<Entry>>,
    pub log2size: u32,
    pub size: u32,
    pub mask: u32,
    pub shift: u32,
    pub offset_limit: u32,
    pub max_offset: u32,
}

/// Outcome of [`Space::insert`]: which slot the caller's key ended up in,
/// and whether it was already present (in which case nothing was mutated).
pub(crate) struct InsertOutcome {
    pub index: u32,
    pub existed: bool,
}

impl Space {
    /// A space with the given size and offset multiplier, with no backing
    /// storage allocated yet.
    pub fn new(log2size: u32, offset_mult: u32) -> Self {
        let size = 1u32 << log2size;
        Space {
            buckets: None,
            log2size,
            size,
            mask: size - 1,
            shift: MAX_BITS - log2size,
            offset_limit: offset_mult * log2size,
            max_offset: 0,
        }
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.buckets.is_some()
    }

    /// Read-only view of a slot. `i` must be `< self.size`.
    #[inline]
    pub fn entry(&self, i: u32) -> Entry {
        match self.buckets {
            // SAFETY: `i < self.size`, the allocation holds `self.size` entries.
            Some(ptr) => unsafe { *ptr.as_ptr().add(i as usize) },
            None => Entry::EMPTY,
        }
    }

    /// Lazy-delete a slot during migration: clears `inuse` without a
    /// backward shift, leaving a gap that [`Space::fetch`] tolerates. `i`
    /// must be `< self.size` and the space must be allocated.
    #[inline]
    pub fn mark_unused(&mut self, i: u32) {
        self.write(i, Entry::EMPTY);
    }

    #[inline]
    fn write(&mut self, i: u32, e: Entry) {
        let ptr = self.buckets.expect("write on an unallocated space");
        // SAFETY: `i < self.size`.
        unsafe { ptr.as_ptr().add(i as usize).write(e) };
    }

    fn ensure_allocated<A: TableAlloc>(&mut self, alloc: &A) -> Result<(), TableError> {
        if self.buckets.is_none() {
            self.buckets = Some(alloc.allocate_zeroed(self.size)?);
        }
        Ok(())
    }

    /// Release this space's bucket storage, if any. Safe to call more than
    /// once or on a never-allocated space.
    pub fn release<A: TableAlloc>(&mut self, alloc: &A) {
        if let Some(ptr) = self.buckets.take() {
            // SAFETY: `ptr` was returned by `alloc.allocate_zeroed(self.size)`
            // and has not been released before (we just took it).
            unsafe { alloc.deallocate(ptr, self.size) };
        }
    }

    /// Robin Hood insert (spec.md §4.2). Lazily allocates on first use.
    /// Returns the slot the key's value now occupies — either the
    /// pre-existing live slot (no mutation, `existed: true`), or the slot
    /// the new entry finally settled at after any displacement chain
    /// (`existed: false`).
    pub fn insert<A: TableAlloc>(
        &mut self,
        key: u32,
        value: i64,
        alloc: &A,
    ) -> Result<InsertOutcome, TableError> {
        self.ensure_allocated(alloc)?;

        let mut i = idx(key, self.shift);
        let mut candidate = Entry::new(key, value);
        let mut placed_slot: Option<u32> = None;

        while self.entry(i).inuse {
            let resident = self.entry(i);
            if resident.key == candidate.key {
                return Ok(InsertOutcome {
                    index: i,
                    existed: true,
                });
            }
            if resident.offset < candidate.offset {
                if placed_slot.is_none() {
                    placed_slot = Some(i);
                }
                // `candidate` is written here at its current offset, then
                // the loop keeps probing with `resident` (the poorer entry
                // just displaced) at a *lower* offset. `resident` may settle
                // sooner than `candidate`'s offset, so the max over the
                // whole chain has to be tracked at every write, not just the
                // one the loop happens to end on.
                if self.max_offset < candidate.offset {
                    self.max_offset = candidate.offset;
                }
                self.write(i, candidate);
                candidate = resident;
            }
            i = (i + 1) & self.mask;
            candidate.offset += 1;
        }

        self.write(i, candidate);
        if self.max_offset < candidate.offset {
            self.max_offset = candidate.offset;
        }

        Ok(InsertOutcome {
            index: placed_slot.unwrap_or(i),
            existed: false,
        })
    }

    /// Bounded linear fetch (spec.md §4.3). Probes at most `offset_limit +
    /// 1` slots and does not stop at an unused slot — migration's lazy
    /// deletes can leave gaps before a still-live match.
    pub fn fetch(&self, key: u32, offset_limit: u32) -> Option<u32> {
        if !self.is_allocated() {
            return None;
        }
        let mut i = idx(key, self.shift);
        let mut offset = 0u32;
        while offset <= offset_limit {
            let e = self.entry(i);
            if e.inuse && e.key == key {
                return Some(i);
            }
            i = (i + 1) & self.mask;
            offset += 1;
        }
        None
    }

    /// Backward-shift remove (spec.md §4.4). `max_offset` is deliberately
    /// not lowered: it remains a valid (possibly loose) upper bound.
    ///
    /// The search phase probes the full `offset_limit + 1` slots and does
    /// not stop at the first unused one, the same tolerance [`Space::fetch`]
    /// needs: a space being drained by migration accumulates lazy-deleted
    /// gaps (`mark_unused`) ahead of entries that are still live, and a
    /// search that stops at the first gap would wrongly report those
    /// entries as absent.
    pub fn remove(&mut self, key: u32) -> bool {
        if !self.is_allocated() {
            return false;
        }

        let mut i = idx(key, self.shift);
        let mut offset = 0u32;
        let mut found = false;

        while offset <= self.offset_limit {
            let e = self.entry(i);
            if e.inuse && e.key == key {
                found = true;
                break;
            }
            i = (i + 1) & self.mask;
            offset += 1;
        }

        if !found {
            return false;
        }

        self.write(i, Entry::EMPTY);
        let mut prev = i;
        let mut cur = (i + 1) & self.mask;

        loop {
            let next = self.entry(cur);
            if !next.inuse || next.offset == 0 {
                break;
            }
            let mut shifted = next;
            shifted.offset -= 1;
            self.write(prev, shifted);
            self.write(cur, Entry::EMPTY);
            prev = cur;
            cur = (cur + 1) & self.mask;
        }

        true
    }
}
