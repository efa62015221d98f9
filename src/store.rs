use rustc_hash::FxHashMap;
use tracing::trace;

use crate::macrocell::Generation;
use crate::macrocell::Handle;
use crate::macrocell::Macrocell;
use crate::macrocell::Quadrant;
use crate::rules;

/// Counters kept by a [`NodeStore`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Stats {
    /// How many times a value was already in the store
    pub hits: u64,

    /// How many times a value was not found and therefore inserted
    pub misses: u64,

    /// How many times [`rules::life_4`] was evaluated
    pub rule_evaluations: u64,
}

/// One entry of the arena.
#[derive(Clone, Copy, Debug)]
struct Slot {
    cell: Macrocell,

    /// The merge record, only ever set for level 3 and up
    generation: Option<Generation>,

    /// The centre of this macrocell, one generation ahead
    next: Option<Handle>,
}

impl Slot {
    fn new(cell: Macrocell) -> Self {
        Self {
            cell,
            generation: None,
            next: None,
        }
    }
}

/// The canonical node cache.
///
/// Every macrocell lives in `slots` and is addressed by its [`Handle`]. `index` maps a value back
/// to its handle, so that inserting a value which is already present hands out the existing
/// handle. Entries are never removed nor changed once inserted, except for the memoized results
/// attached to them.
///
/// Slot `0` is the null sentinel. Its value has every handle pointing back at slot `0`, and so do
/// its memoized generation and successor: an empty region of any size steps to an empty region.
pub struct NodeStore {
    /// This is where all of our memory goes
    slots: Vec<Slot>,

    /// Content to handle
    index: FxHashMap<Macrocell, Handle>,

    /// Handles of the dead and the alive single cell
    basis: [Option<Handle>; 2],

    stats: Stats,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        let mut store = Self {
            slots: vec![],
            index: FxHashMap::default(),
            basis: [None; 2],
            stats: Stats::default(),
        };

        store.setup_null_sentinel();
        store
    }

    /// Return the null sentinel, creating it if this is the first call.
    pub fn setup_null_sentinel(&mut self) -> Handle {
        if !self.slots.is_empty() {
            return Handle::NULL;
        }

        let null = Macrocell::null();
        self.slots.push(Slot {
            cell: null,
            generation: Some(Generation::null()),
            next: Some(Handle::NULL),
        });
        self.index.insert(null, Handle::NULL);

        Handle::NULL
    }

    /// Look `cell` up, inserting it if it was never seen before.
    pub fn get_or_insert(&mut self, cell: Macrocell) -> Handle {
        if let Some(&handle) = self.index.get(&cell) {
            self.stats.hits += 1;
            return handle;
        }

        self.stats.misses += 1;

        let handle = Handle::new(self.slots.len());
        self.slots.push(Slot::new(cell));
        self.index.insert(cell, handle);

        trace!(?handle, ?cell, "new macrocell");

        handle
    }

    /// The handle of a single dead or alive cell.
    ///
    /// A dead cell has the same content as the null sentinel, so it *is* the null sentinel.
    pub fn basis(&mut self, alive: bool) -> Handle {
        if let Some(handle) = self.basis[alive as usize] {
            return handle;
        }

        let handle = self.get_or_insert(Macrocell::basis(alive));
        self.basis[alive as usize] = Some(handle);

        handle
    }

    /// Build the macrocell of the given `level` out of its four quadrants.
    ///
    /// `bits` is derived from the quadrants as described on [`Macrocell`]: the cells themselves
    /// for level 1, the stepped centre for level 2, nothing above that.
    pub fn node(&mut self, level: u8, nw: Handle, ne: Handle, sw: Handle, se: Handle) -> Handle {
        debug_assert!(level >= 1, "a single cell has no quadrants");

        // All four quadrants empty, which is the sentinel no matter the level.
        if [nw, ne, sw, se].iter().all(|h| h.is_null()) {
            return Handle::NULL;
        }

        let bits = match level {
            1 => {
                let mut bits = 0;

                for (q, h) in Quadrant::ALL.into_iter().zip([nw, ne, sw, se]) {
                    if self.get(h).bits != 0 {
                        bits |= q.bit();
                    }
                }

                bits
            }
            2 => {
                self.stats.rule_evaluations += 1;

                let [nw, ne, sw, se] = [nw, ne, sw, se].map(|h| *self.get(h));
                rules::life_4(&nw, &ne, &sw, &se)
            }
            _ => 0,
        };

        self.get_or_insert(Macrocell {
            bits,
            nw,
            ne,
            sw,
            se,
        })
    }

    /// Build the level 1 macrocell holding the 4-bit pattern `bits`.
    pub fn from_bits(&mut self, bits: u8) -> Handle {
        let [nw, ne, sw, se] = Quadrant::ALL.map(|q| bits & q.bit() != 0);
        let [nw, ne, sw, se] = [nw, ne, sw, se].map(|alive| self.basis(alive));

        self.node(1, nw, ne, sw, se)
    }

    pub fn get(&self, handle: Handle) -> &Macrocell {
        &self.slots[handle.index()].cell
    }

    pub fn contains(&self, cell: &Macrocell) -> bool {
        self.index.contains_key(cell)
    }

    /// Number of distinct macrocells, the sentinel included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always `false`: the sentinel is there from the start.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub(crate) fn next_of(&self, handle: Handle) -> Option<Handle> {
        self.slots[handle.index()].next
    }

    pub(crate) fn set_next(&mut self, handle: Handle, next: Handle) {
        let slot = &mut self.slots[handle.index()];

        debug_assert!(slot.next.is_none_or(|n| n == next), "successor changed");
        slot.next = Some(next);
    }

    /// The merge record of `handle`, if it was stepped at level 3 or above.
    pub fn generation_of(&self, handle: Handle) -> Option<Generation> {
        self.slots[handle.index()].generation
    }

    pub(crate) fn set_generation(&mut self, handle: Handle, generation: Generation) {
        self.slots[handle.index()].generation = Some(generation);
    }
}
