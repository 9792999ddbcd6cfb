/// A single slot in a [`Space`](crate::space::Space).
///
/// `offset` is the probe length (a.k.a. DIB, "distance from initial bucket"):
/// the distance, modulo the space's size, between this key's ideal slot and
/// the slot it actually occupies. It is always `0` for a live entry sitting
/// in its ideal slot, and is only meaningful while `inuse` is `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: u32,
    pub value: i64,
    pub offset: u32,
    pub inuse: bool,
}

impl Entry {
    pub(crate) const EMPTY: Entry = Entry {
        key: 0,
        value: 0,
        offset: 0,
        inuse: false,
    };

    #[inline]
    pub(crate) fn new(key: u32, value: i64) -> Self {
        Entry {
            key,
            value,
            offset: 0,
            inuse: true,
        }
    }
}

impl Default for Entry {
    #[inline]
    fn default() -> Self {
        Entry::EMPTY
    }
}
