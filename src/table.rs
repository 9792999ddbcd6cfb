//! The table engine (spec.md §2): two coexisting [`Space`]s, a flag
//! selecting which one is primary, and batched migration between them.

use crate::alloc::{SystemTableAlloc, TableAlloc};
use crate::config::{TableConfig, MIGRATE_ALL};
use crate::entry::Entry;
use crate::error::Result;
use crate::space::Space;
use std::io::{self, Write};

const GROW: i8 = 1;
const SHRINK: i8 = -1;

/// Outcome of [`Table::put`]: a snapshot of the live entry for `key` (either
/// the one just inserted, or the pre-existing one if `exists` is `true`,
/// in which case nothing was mutated — spec.md §4.2's no-update-in-place
/// policy) and whether the key already existed.
///
/// `Entry` is returned by value rather than by reference: spec.md §5 notes
/// that any reference into the table is only valid until the table's next
/// mutating call, and that a reimplementation is free to model that as an
/// owned value if the target language can't express the borrow statically.
/// Here it can, almost always — except when `batch_size` is the
/// migrate-all sentinel, in which case `put` can trigger a full, synchronous
/// migration (and free the very space the new entry was inserted into) in
/// the course of a single call. Handing back an owned copy sidesteps that
/// edge case entirely instead of encoding a reference whose validity
/// depends on the table's batching configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PutResult {
    pub entry: Entry,
    pub exists: bool,
}

/// The Robin Hood hash map engine described by spec.md.
///
/// `A` is the allocator collaborator backing both spaces' bucket storage;
/// it defaults to the process's global allocator ([`SystemTableAlloc`]).
pub struct Table<A: TableAlloc = SystemTableAlloc> {
    spaces: [Space; 2],
    current: u8,
    count: u32,
    min_size: u32,
    grow_load: f64,
    shrink_load: f64,
    grow_count: u32,
    shrink_count: u32,
    offset_mult: u32,
    batch_size: u32,
    to_migrate: u32,
    migrate_pos: u32,
    migrate_dir: i8,
    alloc: A,
}

impl Table<SystemTableAlloc> {
    /// A table with default parameters (spec.md §6: log2 size 5, 0.7/0.25
    /// loads, offset multiplier 1, minimal batch size).
    pub fn new() -> Self {
        Table::with_config(TableConfig::default())
    }

    /// A table sized so that inserting `item_count` distinct keys never
    /// triggers a grow (spec.md §4.8's sizing formula, exposed as
    /// `init_for_capacity`).
    pub fn for_capacity(item_count: u32) -> Self {
        Table::with_config(TableConfig::for_capacity(item_count))
    }

    /// A table at the given log2 size, default loads/offset-mult/batch.
    pub fn with_log2_size(log2size: u32) -> Self {
        Table::with_config(TableConfig::new(
            log2size,
            crate::config::DEFAULT_GROW_LOAD,
            crate::config::DEFAULT_SHRINK_LOAD,
            crate::config::DEFAULT_OFFSET_MULT,
            crate::config::MIN_BATCH_SIZE,
        ))
    }

    /// A table built from a fully custom, sanitised [`TableConfig`]
    /// (`init_custom` in spec.md §6).
    pub fn with_config(config: TableConfig) -> Self {
        Table::with_config_and_alloc(config, SystemTableAlloc)
    }
}

impl Default for Table<SystemTableAlloc> {
    fn default() -> Self {
        Table::new()
    }
}

impl<A: TableAlloc> Table<A> {
    /// Like [`Table::with_config`], but with a caller-supplied allocator
    /// collaborator instead of the process's global allocator.
    pub fn with_config_and_alloc(config: TableConfig, alloc: A) -> Self {
        let min_size = config.log2size();
        let mut table = Table {
            spaces: [
                Space::new(min_size, config.offset_mult()),
                Space::new(min_size, config.offset_mult()),
            ],
            current: 0,
            count: 0,
            min_size,
            grow_load: config.grow_load(),
            shrink_load: config.shrink_load(),
            grow_count: 0,
            shrink_count: 0,
            offset_mult: config.offset_mult(),
            batch_size: config.batch_size(),
            to_migrate: 0,
            migrate_pos: 0,
            migrate_dir: 0,
            alloc,
        };
        table.recompute_watermarks();
        table
    }

    #[inline]
    fn current_idx(&self) -> usize {
        self.current as usize
    }

    #[inline]
    fn other_idx(&self) -> usize {
        (1 - self.current) as usize
    }

    /// Number of live entries across both spaces (spec.md I4).
    #[inline]
    pub fn len(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` while a batched migration is draining a secondary space into
    /// the primary (spec.md I7: equivalent to the secondary being
    /// allocated).
    #[inline]
    pub fn is_migrating(&self) -> bool {
        self.to_migrate > 0
    }

    fn recompute_watermarks(&mut self) {
        let space = &self.spaces[self.current_idx()];
        self.shrink_count = (space.size as f64 * self.shrink_load).floor() as u32;
        let mut grow_count = (space.size as f64 * self.grow_load).floor() as u32;
        if grow_count > space.mask {
            grow_count = space.mask;
        }
        self.grow_count = grow_count;
    }

    /// `get` (spec.md §4.7): consult the primary, then (while migrating)
    /// the secondary.
    pub fn get(&self, key: u32) -> Option<Entry> {
        let cur = &self.spaces[self.current_idx()];
        if let Some(i) = cur.fetch(key, cur.max_offset) {
            return Some(cur.entry(i));
        }
        if self.to_migrate > 0 {
            let other = &self.spaces[self.other_idx()];
            if let Some(i) = other.fetch(key, other.max_offset) {
                return Some(other.entry(i));
            }
        }
        None
    }

    /// `put` (spec.md §4.7).
    pub fn put(&mut self, key: u32, value: i64) -> Result<PutResult> {
        if self.to_migrate > 0 {
            let other_idx = self.other_idx();
            let other = &self.spaces[other_idx];
            if let Some(i) = other.fetch(key, other.max_offset) {
                let entry = other.entry(i);
                return Ok(PutResult {
                    entry,
                    exists: true,
                });
            }
            self.advance_migration(self.batch_size)?;
        }

        // Re-read after a possible migration advance above: advancing the
        // migration itself never flips `current`, only a resize trigger
        // does, and that can only happen after this insert below.
        let cur_idx = self.current_idx();
        let outcome = {
            let (spaces, alloc) = (&mut self.spaces, &self.alloc);
            spaces[cur_idx].insert(key, value, alloc)?
        };
        let entry = self.spaces[cur_idx].entry(outcome.index);

        if outcome.existed {
            return Ok(PutResult {
                entry,
                exists: true,
            });
        }

        self.count += 1;

        let grow_needed = {
            let cur = &self.spaces[cur_idx];
            cur.max_offset == cur.offset_limit || self.count >= self.grow_count
        };
        if self.to_migrate == 0 && grow_needed {
            self.trigger_resize(GROW)?;
        }

        Ok(PutResult {
            entry,
            exists: false,
        })
    }

    /// `remove` (spec.md §4.7).
    pub fn remove(&mut self, key: u32) -> Result<bool> {
        if self.to_migrate > 0 {
            let other_idx = self.other_idx();
            if self.spaces[other_idx].remove(key) {
                self.count -= 1;
                self.advance_migration(self.batch_size)?;
                return Ok(true);
            }
            self.advance_migration(self.batch_size)?;
        }

        let cur_idx = self.current_idx();
        if self.spaces[cur_idx].remove(key) {
            self.count -= 1;
            let shrink_needed = self.count <= self.shrink_count
                && self.spaces[cur_idx].log2size > self.min_size;
            if self.to_migrate == 0 && shrink_needed {
                self.trigger_resize(SHRINK)?;
            }
            return Ok(true);
        }

        Ok(false)
    }

    fn advance_migration(&mut self, n: u32) -> Result<()> {
        self.migrate(n)
    }

    /// Advance the drain of the secondary into the primary by up to `n`
    /// slots (spec.md §4.6).
    fn migrate(&mut self, n: u32) -> Result<()> {
        let mut migrated = 0u32;
        while self.to_migrate > 0 && migrated < n {
            let cur_idx = self.current_idx();
            let other_idx = self.other_idx();
            let pos = self.migrate_pos;
            let entry = self.spaces[other_idx].entry(pos);
            if entry.inuse {
                let (spaces, alloc) = (&mut self.spaces, &self.alloc);
                spaces[cur_idx].insert(entry.key, entry.value, alloc)?;
                self.spaces[other_idx].mark_unused(pos);
            }
            self.migrate_pos += 1;
            self.to_migrate -= 1;
            migrated += 1;
        }

        if self.to_migrate == 0 {
            self.migrate_dir = 0;
            self.migrate_pos = 0;
            let other_idx = self.other_idx();
            self.spaces[other_idx].release(&self.alloc);
        }

        Ok(())
    }

    /// Arm (and, for the migrate-all sentinel, immediately complete) a
    /// resize (spec.md §4.5). `dir` is `+1` to grow, `-1` to shrink.
    fn trigger_resize(&mut self, dir: i8) -> Result<()> {
        let cur_idx = self.current_idx();
        let new_log2_signed = self.spaces[cur_idx].log2size as i64 + dir as i64;

        let new_log2 = if self.count == 0 {
            self.spaces[0].release(&self.alloc);
            self.spaces[1].release(&self.alloc);
            self.min_size
        } else {
            self.migrate_dir = dir;
            self.to_migrate = self.spaces[cur_idx].size;
            self.migrate_pos = 0;
            new_log2_signed.max(self.min_size as i64) as u32
        };

        self.current = 1 - self.current;
        let new_primary_log2 = new_log2.max(self.min_size);
        self.spaces[self.current_idx()] = Space::new(new_primary_log2, self.offset_mult);
        self.recompute_watermarks();

        if self.batch_size == MIGRATE_ALL && self.count > 0 {
            let all = self.to_migrate;
            self.migrate(all)?;
        }

        Ok(())
    }

    /// Write a diagnostic dump of the table's contents: primary space
    /// first, then (while migrating) the secondary, with columns space
    /// tag / slot index / state / key (hex and decimal) / value / offset
    /// (spec.md §6). Exact whitespace is not normative.
    pub fn dump<W: Write>(&self, out: &mut W, include_empties: bool) -> io::Result<()> {
        let cur = &self.spaces[self.current_idx()];
        writeln!(
            out,
            "# In table: {} keys, primary space size {}, bits {}, max probe length {}",
            self.count, cur.size, cur.log2size, cur.max_offset
        )?;
        writeln!(out, "# space, slot, state, key, value, offset")?;
        dump_space(out, "pri", cur, include_empties)?;

        if self.to_migrate > 0 {
            let other = &self.spaces[self.other_idx()];
            writeln!(
                out,
                "# Table still migrating, left {}, old size {} bits {} max probe length {}",
                self.to_migrate, other.size, other.log2size, other.max_offset
            )?;
            writeln!(out, "# space, slot, state, key, value, offset")?;
            dump_space(out, "sec", other, include_empties)?;
        }

        Ok(())
    }

    /// Convenience wrapper around [`Table::dump`] writing to stdout.
    pub fn dump_stdout(&self, include_empties: bool) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.dump(&mut lock, include_empties)
    }
}

fn dump_space<W: Write>(
    out: &mut W,
    tag: &str,
    space: &Space,
    include_empties: bool,
) -> io::Result<()> {
    for i in 0..space.size {
        let e = space.entry(i);
        if e.inuse || include_empties {
            writeln!(
                out,
                "{}, #{:06}, {}, 0x{:08x} ({:010}), {:06}, {:06}",
                tag,
                i,
                if e.inuse { "full " } else { "empty" },
                e.key,
                e.key,
                e.value,
                e.offset
            )?;
        }
    }
    Ok(())
}

impl<A: TableAlloc> Drop for Table<A> {
    fn drop(&mut self) {
        self.spaces[0].release(&self.alloc);
        self.spaces[1].release(&self.alloc);
    }
}
