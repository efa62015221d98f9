//! Stepping canonical macrocells, and turning a [`QuadTree`] into one.
//!
//! A macrocell of level `k >= 2` steps to its centre, a macrocell of level `k - 1` one
//! generation ahead. Level 2 has that centre precomputed in its `bits`. Above that, the
//! macrocell is cut into the nine overlapping squares of its [`Generation`] record, each of those
//! is stepped, and the centre is stitched back together from the nine results. Both the record
//! and the successor are memoized on the handle, so a region that was stepped once is never
//! stepped again.

use tracing::debug;
use tracing::trace;

use crate::Coord;
use crate::macrocell::Generation;
use crate::macrocell::Handle;
use crate::macrocell::Quadrant;
use crate::quadtree::NodeId;
use crate::quadtree::QuadTree;
use crate::quadtree::Range;
use crate::store::NodeStore;

impl NodeStore {
    /// The centre of `handle`, one generation ahead. `handle` must be a macrocell of `level`,
    /// with `level >= 2`, and the result has `level - 1`.
    pub fn successor(&mut self, handle: Handle, level: u8) -> Handle {
        assert!(level >= 2, "a level {level} macrocell has no centre to step");

        if let Some(next) = self.next_of(handle) {
            return next;
        }

        let next = if level == 2 {
            let bits = self.get(handle).bits;
            self.from_bits(bits)
        } else {
            let generation = self.generation(handle, level);
            self.merge(generation, level)
        };

        self.set_next(handle, next);
        next
    }

    /// The merge record of `handle`, a macrocell of `level >= 3`, computing it if needed.
    pub fn generation(&mut self, handle: Handle, level: u8) -> Generation {
        assert!(level >= 3, "a level {level} macrocell has no merge record");

        if let Some(generation) = self.generation_of(handle) {
            return generation;
        }

        let cell = *self.get(handle);
        let [nw, ne, sw, se] = cell.quadrants().map(|h| *self.get(h));
        let sub = level - 1;

        let nn = self.node(sub, nw.ne, ne.nw, nw.se, ne.sw);
        let ss = self.node(sub, sw.ne, se.nw, sw.se, se.sw);
        let ww = self.node(sub, nw.sw, nw.se, sw.nw, sw.ne);
        let ee = self.node(sub, ne.sw, ne.se, se.nw, se.ne);
        let cc = self.node(sub, nw.se, ne.sw, sw.ne, se.nw);

        let generation = Generation {
            nw: self.successor(cell.nw, sub),
            ne: self.successor(cell.ne, sub),
            sw: self.successor(cell.sw, sub),
            se: self.successor(cell.se, sub),
            nn: self.successor(nn, sub),
            ss: self.successor(ss, sub),
            ee: self.successor(ee, sub),
            ww: self.successor(ww, sub),
            cc: self.successor(cc, sub),
        };

        trace!(?handle, level, ?generation, "merge record");

        self.set_generation(handle, generation);
        generation
    }

    /// Stitch the centre of a level `level` macrocell out of its merge record.
    ///
    /// The nine results are level `level - 2` squares laid out on a 3x3 grid. The centre
    /// takes one quadrant from each of them, and four from `cc`.
    fn merge(&mut self, g: Generation, level: u8) -> Handle {
        let [nw, ne, sw, se, nn, ss, ee, ww, cc] =
            [g.nw, g.ne, g.sw, g.se, g.nn, g.ss, g.ee, g.ww, g.cc].map(|h| *self.get(h));
        let sub = level - 2;

        let q_nw = self.node(sub, nw.se, nn.sw, ww.ne, cc.nw);
        let q_ne = self.node(sub, nn.se, ne.sw, cc.ne, ee.nw);
        let q_sw = self.node(sub, ww.se, cc.sw, sw.ne, ss.nw);
        let q_se = self.node(sub, cc.se, ee.sw, ss.ne, se.nw);

        self.node(level - 1, q_nw, q_ne, q_sw, q_se)
    }

    /// Surround a level `level` macrocell with empty space, so that it becomes the centre of a
    /// level `level + 1` macrocell.
    pub fn pad(&mut self, handle: Handle, level: u8) -> Handle {
        let cell = *self.get(handle);
        let null = Handle::NULL;

        let nw = self.node(level, null, null, null, cell.nw);
        let ne = self.node(level, null, null, cell.ne, null);
        let sw = self.node(level, null, cell.sw, null, null);
        let se = self.node(level, cell.se, null, null, null);

        self.node(level + 1, nw, ne, sw, se)
    }

    /// Whether the cell at `(x, y)` is alive in `handle`, a macrocell of `level` laid over
    /// `range`. Points outside `range` are dead.
    pub fn cell_at(&self, handle: Handle, level: u8, range: Range, x: Coord, y: Coord) -> bool {
        let (mut handle, mut level, mut range) = (handle, level, range);

        while !handle.is_null() {
            let Some(q) = range.quadrant_of(x, y) else {
                return false;
            };

            let cell = self.get(handle);

            match level {
                0 => return cell.bits != 0,
                1 => {
                    return match q {
                        Quadrant::Nw => cell.bit_nw(),
                        Quadrant::Ne => cell.bit_ne(),
                        Quadrant::Sw => cell.bit_sw(),
                        Quadrant::Se => cell.bit_se(),
                    };
                }
                _ => {}
            }

            handle = cell.quadrant(q);
            range = range.child(q);
            level -= 1;
        }

        false
    }

    /// Call `f` with the coordinates of every live cell of `handle`, a macrocell of `level` laid
    /// over `range`.
    pub fn for_each_alive<F>(&self, handle: Handle, level: u8, range: Range, mut f: F)
    where
        F: FnMut(Coord, Coord),
    {
        let mut stack = vec![(handle, level, range)];

        while let Some((handle, level, range)) = stack.pop() {
            if handle.is_null() {
                continue;
            }

            if level == 0 {
                f(range.start_x, range.start_y);
                continue;
            }

            let cell = self.get(handle);

            // Reversed, so that the north-west quadrant comes off the stack first
            for q in Quadrant::ALL.into_iter().rev() {
                stack.push((cell.quadrant(q), level - 1, range.child(q)));
            }
        }
    }

    /// Number of live cells in `handle`, a macrocell of `level`.
    pub fn population(&self, handle: Handle, level: u8) -> u64 {
        let mut count = 0;
        let mut stack = vec![(handle, level)];

        while let Some((handle, level)) = stack.pop() {
            if handle.is_null() {
                continue;
            }

            let cell = self.get(handle);

            match level {
                0 => count += 1,
                1 => count += u64::from(cell.bits.count_ones()),
                _ => stack.extend(cell.quadrants().map(|q| (q, level - 1))),
            }
        }

        count
    }
}

impl QuadTree {
    /// The canonical macrocell of the subtree rooted at `id`.
    ///
    /// The result is cached on the node until a cell below it changes.
    pub fn canonicalize(&mut self, id: NodeId, store: &mut NodeStore) -> Handle {
        let node = self.node(id);

        if let Some(handle) = node.cached_macrocell() {
            return handle;
        }

        let level = node.level();

        let handle = if node.is_leaf {
            store.basis(node.pixel_count == 1)
        } else if let Some(children) = node.children() {
            if level == 1 {
                let mut bits = 0;

                for (q, child) in Quadrant::ALL.into_iter().zip(children) {
                    if self.node(child).pixel_count == 1 {
                        bits |= q.bit();
                    }
                }

                store.from_bits(bits)
            } else {
                let [nw, ne, sw, se] = children.map(|child| self.canonicalize(child, store));
                store.node(level, nw, ne, sw, se)
            }
        } else {
            Handle::NULL
        };

        self.set_cached_macrocell(id, handle);
        handle
    }

    /// Step the subtree rooted at `node` one generation.
    ///
    /// A missing node is empty and steps to the null sentinel, and so does a node without
    /// children. A leaf has no neighbourhood and is returned as its basis cell, a 2x2 node as its
    /// own canonical value. Anything bigger steps to its centre.
    pub fn next_generation_of(&mut self, node: Option<NodeId>, store: &mut NodeStore) -> Handle {
        let Some(id) = node else {
            return Handle::NULL;
        };

        let level = self.node(id).level();
        let handle = self.canonicalize(id, store);

        if level < 2 {
            return handle;
        }

        store.successor(handle, level)
    }

    /// Step the whole universe one generation.
    ///
    /// The result covers exactly [`QuadTree::bounds`]: the root is padded with empty space, and
    /// the centre of that padded square is the next generation of the root. Everything outside
    /// the bounds is dead. The result is kept until the tree changes, and is what
    /// [`QuadTree::get_next_gen_pixel`] reads from.
    pub fn next_generation(&mut self, store: &mut NodeStore) -> Handle {
        if let Some(next) = self.next {
            return next;
        }

        let depth = self.depth();
        let before = store.stats();

        let root = self.canonicalize(self.root(), store);
        let padded = store.pad(root, depth);
        let next = store.successor(padded, depth + 1);

        let after = store.stats();
        debug!(
            depth,
            nodes = store.len(),
            inserted = after.misses - before.misses,
            rule_evaluations = after.rule_evaluations - before.rule_evaluations,
            "stepped universe"
        );

        self.next = Some(next);
        next
    }
}
