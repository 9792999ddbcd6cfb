//! Tunables and their sanitisation, kept separate from [`Table`](crate::table::Table)
//! itself, mirroring how a small, sanitised config struct typically sits
//! apart from the types it configures.

/// Lower/upper bound on any space's `log2size`.
pub const HARD_MIN_LOG2SIZE: u32 = 5;
pub const HARD_MAX_LOG2SIZE: u32 = 32;

pub const DEFAULT_LOG2SIZE: u32 = 5;
pub const DEFAULT_GROW_LOAD: f64 = 0.7;
pub const DEFAULT_SHRINK_LOAD: f64 = 0.25;
pub const DEFAULT_OFFSET_MULT: u32 = 1;
pub const MIN_BATCH_SIZE: u32 = 4;

/// Sentinel `batch_size` requesting whole-table migration at resize time
/// instead of batched, per-mutation migration.
pub const MIGRATE_ALL: u32 = 0;

/// Sanitised construction parameters for a [`Table`](crate::table::Table).
///
/// Built through [`TableConfig::new`] (or [`TableConfig::default`]) and then
/// consumed by `Table::with_config`. All fields are already clamped into
/// their valid ranges by the time a `TableConfig` exists — there is no way
/// to observe an unsanitised value through this type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    log2size: u32,
    grow_load: f64,
    shrink_load: f64,
    offset_mult: u32,
    batch_size: u32,
}

impl TableConfig {
    /// Sanitises `log2size`, `grow_load`, `shrink_load` and `batch_size`
    /// exactly as spec.md §4.8 ("Parameter sanitisation at initialisation")
    /// describes:
    ///
    /// - `log2size` is clamped to `[HARD_MIN_LOG2SIZE, HARD_MAX_LOG2SIZE]`.
    /// - `grow_load` outside `(0, 1)` is replaced by [`DEFAULT_GROW_LOAD`].
    /// - `shrink_load` outside `(0, 1)` is replaced by [`DEFAULT_SHRINK_LOAD`].
    /// - if `shrink_load > grow_load / 2`, `shrink_load` is lowered to
    ///   `grow_load / 2` (prevents an immediate re-grow right after a
    ///   shrink's migration completes).
    /// - unless `batch_size == MIGRATE_ALL`, it is raised to at least
    ///   `ceil(grow_load / shrink_load) + 1` and to at least
    ///   [`MIN_BATCH_SIZE`], so that migration of the old space finishes
    ///   before the new primary reaches `grow_count` again.
    pub fn new(
        log2size: u32,
        grow_load: f64,
        shrink_load: f64,
        offset_mult: u32,
        batch_size: u32,
    ) -> Self {
        let log2size = log2size.clamp(HARD_MIN_LOG2SIZE, HARD_MAX_LOG2SIZE);

        let grow_load = if grow_load > 0.0 && grow_load < 1.0 {
            grow_load
        } else {
            DEFAULT_GROW_LOAD
        };
        let mut shrink_load = if shrink_load > 0.0 && shrink_load < 1.0 {
            shrink_load
        } else {
            DEFAULT_SHRINK_LOAD
        };
        if shrink_load > grow_load / 2.0 {
            shrink_load = grow_load / 2.0;
        }

        let batch_size = if batch_size == MIGRATE_ALL {
            MIGRATE_ALL
        } else {
            let floor = (grow_load / shrink_load).ceil() as u32 + 1;
            batch_size.max(floor).max(MIN_BATCH_SIZE)
        };

        TableConfig {
            log2size,
            grow_load,
            shrink_load,
            offset_mult,
            batch_size,
        }
    }

    /// Picks the smallest `log2size` such that `item_count < grow_load *
    /// 2^log2size` holds, so a table sized for `item_count` entries never
    /// grows while reaching exactly that many entries (spec.md §4.8).
    pub fn for_capacity(item_count: u32) -> Self {
        let mut log2size = HARD_MIN_LOG2SIZE;
        while (item_count as f64) >= DEFAULT_GROW_LOAD * (1u64 << log2size) as f64 {
            log2size += 1;
        }
        TableConfig::new(
            log2size,
            DEFAULT_GROW_LOAD,
            DEFAULT_SHRINK_LOAD,
            DEFAULT_OFFSET_MULT,
            MIN_BATCH_SIZE,
        )
    }

    pub fn log2size(&self) -> u32 {
        self.log2size
    }
    pub fn grow_load(&self) -> f64 {
        self.grow_load
    }
    pub fn shrink_load(&self) -> f64 {
        self.shrink_load
    }
    pub fn offset_mult(&self) -> u32 {
        self.offset_mult
    }
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }
}

impl Default for TableConfig {
    /// log2 size 5, 0.7/0.25 loads, offset multiplier 1, minimal batch size.
    fn default() -> Self {
        TableConfig::new(
            DEFAULT_LOG2SIZE,
            DEFAULT_GROW_LOAD,
            DEFAULT_SHRINK_LOAD,
            DEFAULT_OFFSET_MULT,
            MIN_BATCH_SIZE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_log2size_to_hard_bounds() {
        let cfg = TableConfig::new(1, 0.7, 0.25, 1, 4);
        assert_eq!(cfg.log2size(), HARD_MIN_LOG2SIZE);

        let cfg = TableConfig::new(999, 0.7, 0.25, 1, 4);
        assert_eq!(cfg.log2size(), HARD_MAX_LOG2SIZE);
    }

    #[test]
    fn replaces_invalid_loads_with_defaults() {
        let cfg = TableConfig::new(5, 0.0, 1.0, 1, 4);
        assert_eq!(cfg.grow_load(), DEFAULT_GROW_LOAD);
        assert_eq!(cfg.shrink_load(), DEFAULT_SHRINK_LOAD);
    }

    #[test]
    fn couples_shrink_load_to_half_grow_load() {
        let cfg = TableConfig::new(5, 0.6, 0.5, 1, 4);
        assert_eq!(cfg.shrink_load(), 0.3);
    }

    #[test]
    fn enforces_batch_size_floor() {
        let cfg = TableConfig::new(5, 0.7, 0.25, 1, 1);
        assert!(cfg.batch_size() >= MIN_BATCH_SIZE);
        assert!(cfg.batch_size() as f64 >= cfg.grow_load() / cfg.shrink_load());
    }

    #[test]
    fn migrate_all_sentinel_is_preserved() {
        let cfg = TableConfig::new(5, 0.7, 0.25, 1, MIGRATE_ALL);
        assert_eq!(cfg.batch_size(), MIGRATE_ALL);
    }

    #[test]
    fn for_capacity_sizes_above_grow_watermark() {
        let cfg = TableConfig::for_capacity(100);
        let size = 1u64 << cfg.log2size();
        assert!(100.0 < DEFAULT_GROW_LOAD * size as f64);
        // and the previous log2size would not have sufficed
        let smaller = 1u64 << (cfg.log2size() - 1);
        assert!(100.0 >= DEFAULT_GROW_LOAD * smaller as f64);
    }
}
