use core::fmt::Debug;

use thiserror::Error;
use tracing::trace;

use crate::Coord;
use crate::macrocell::Handle;
use crate::macrocell::Quadrant;
use crate::store::NodeStore;

pub use crate::quadtree::node::NodeId;
pub use crate::quadtree::node::StructuralNode;
pub use crate::quadtree::range::Range;

mod node;
mod range;

/// Depth of the universe built by [`QuadTree::new`]
pub const DEFAULT_DEPTH: u8 = 17;

/// Deepest universe [`QuadTree::with_depth`] accepts. The bounds still fit a [`Coord`] once
/// padded for stepping.
pub const MAX_DEPTH: u8 = 62;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QuadTreeError {
    #[error("({x}, {y}) lies outside of the universe")]
    OutOfBounds { x: Coord, y: Coord },

    #[error("A universe of depth {depth} is not supported, expected 1 to 62")]
    InvalidDepth { depth: u8 },

    #[error("A {width}x{height} board does not fit {len} cells")]
    BoardSize {
        len: usize,
        width: usize,
        height: usize,
    },
}

/// The structural tree: which cells are alive, laid out spatially.
///
/// This is the write side of the engine. Cells are drawn into it one by one, and it is turned
/// into a canonical macrocell with [`QuadTree::canonicalize`] when it needs to be stepped. The
/// canonical value of every subtree is cached on its root, and dropped along the parent chain
/// when a cell below changes.
///
/// Nodes live in `nodes`. The four children of a node are allocated together in four
/// consecutive slots, and released together onto `free`.
pub struct QuadTree {
    /// The index of the root of the tree in `nodes`
    root: NodeId,

    /// The universe. Nothing lives outside of it.
    bounds: Range,

    /// `log2` of the side of `bounds`
    depth: u8,

    nodes: Vec<StructuralNode>,

    /// First slot of each released group of four
    free: Vec<NodeId>,

    /// Next value of [`StructuralNode::id`]
    uid: u64,

    /// The universe one generation ahead, as computed by [`QuadTree::next_generation`]
    pub(crate) next: Option<Handle>,
}

impl Default for QuadTree {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadTree {
    /// An empty universe spanning `[-65536, 65536)` on both axes.
    pub fn new() -> Self {
        Self::build(DEFAULT_DEPTH)
    }

    /// An empty universe of side `2^depth`, centred on the origin.
    pub fn with_depth(depth: u8) -> Result<Self, QuadTreeError> {
        if !(1..=MAX_DEPTH).contains(&depth) {
            return Err(QuadTreeError::InvalidDepth { depth });
        }

        Ok(Self::build(depth))
    }

    fn build(depth: u8) -> Self {
        let bounds = Range::centred(depth);

        QuadTree {
            root: NodeId::new(0),
            bounds,
            depth,
            nodes: vec![StructuralNode::new(0, bounds, None)],
            free: vec![],
            uid: 1,
            next: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn bounds(&self) -> Range {
        self.bounds
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn node(&self, id: NodeId) -> &StructuralNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes in use, the root included
    pub fn len(&self) -> usize {
        self.nodes.len() - 4 * self.free.len()
    }

    /// Always `false`: there's at least the root.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the cell at `(x, y)` as alive. Drawing a cell twice does nothing.
    pub fn add_pixel(&mut self, x: Coord, y: Coord) -> Result<(), QuadTreeError> {
        if !self.bounds.contains(x, y) {
            return Err(QuadTreeError::OutOfBounds { x, y });
        }

        let mut current = self.root;

        loop {
            let node = &mut self.nodes[current.index()];

            if node.is_leaf {
                if node.pixel_count != 1 {
                    node.pixel_count = 1;
                    self.invalidate(current);
                }

                return Ok(());
            }

            node.pixel_count = 1;

            if node.children.is_none() {
                self.add_children_for_node(current);
            }

            let Some(child) = self.get_child_from_point(x, y, current) else {
                unreachable!("({x}, {y}) is in bounds, so it is in one of the children");
            };

            current = child;
        }
    }

    /// Draw a dense board, row by row. The cell at `board[x + y * width]` goes to `(x, y)`.
    ///
    /// Nothing is drawn unless every live cell of the board is inside the universe.
    pub fn add_pixels(
        &mut self,
        board: &[bool],
        width: usize,
        height: usize,
    ) -> Result<(), QuadTreeError> {
        if width.checked_mul(height) != Some(board.len()) {
            return Err(QuadTreeError::BoardSize {
                len: board.len(),
                width,
                height,
            });
        }

        let cells: Vec<(Coord, Coord)> = board
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| ((i % width) as Coord, (i / width) as Coord))
            .collect();

        if let Some(&(x, y)) = cells.iter().find(|&&(x, y)| !self.bounds.contains(x, y)) {
            return Err(QuadTreeError::OutOfBounds { x, y });
        }

        for (x, y) in cells {
            self.add_pixel(x, y)?;
        }

        Ok(())
    }

    /// Whether the cell at `(x, y)` is alive. Anything outside of the universe is dead.
    pub fn get_pixel(&self, x: Coord, y: Coord) -> bool {
        let mut current = self.root;

        loop {
            let node = self.node(current);

            if node.is_leaf {
                return node.is_alive();
            }

            match self.get_child_from_point(x, y, current) {
                Some(child) => current = child,
                None => return false,
            }
        }
    }

    /// Whether the cell at `(x, y)` is alive one generation ahead.
    ///
    /// This reads what the last [`QuadTree::next_generation`] computed. If it was never called
    /// since the tree last changed, every cell reads as dead.
    pub fn get_next_gen_pixel(&self, store: &NodeStore, x: Coord, y: Coord) -> bool {
        let Some(next) = self.next else {
            return false;
        };

        store.cell_at(next, self.depth, self.bounds, x, y)
    }

    /// The child of `node` whose quadrant holds `(x, y)`.
    pub fn get_child_from_point(&self, x: Coord, y: Coord, node: NodeId) -> Option<NodeId> {
        let node = self.node(node);
        let q = node.range.quadrant_of(x, y)?;

        node.child(q)
    }

    /// Give `id` its four children, reusing a released group when there is one.
    fn add_children_for_node(&mut self, id: NodeId) {
        let parent = &self.nodes[id.index()];

        if parent.children.is_some() {
            return;
        }

        let ranges = parent.range.split();

        let first = match self.free.pop() {
            Some(first) => {
                for (q, range) in Quadrant::ALL.into_iter().zip(ranges) {
                    self.nodes[first.sibling(q).index()] =
                        StructuralNode::new(self.uid, range, Some(id));
                    self.uid += 1;
                }

                first
            }
            None => {
                let first = NodeId::new(self.nodes.len());

                for range in ranges {
                    self.nodes.push(StructuralNode::new(self.uid, range, Some(id)));
                    self.uid += 1;
                }

                first
            }
        };

        self.nodes[id.index()].children = Some(first);
    }

    /// Release everything below `id` and kill every cell in it. The node itself stays, without
    /// children. A leaf simply dies.
    pub fn remove_node(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];

        let Some(first) = node.children.take() else {
            if node.pixel_count != 0 {
                node.pixel_count = 0;
                self.invalidate(id);
            }

            return;
        };

        let mut stack = vec![first];
        let mut groups = vec![];

        while let Some(group) = stack.pop() {
            groups.push(group);

            for q in Quadrant::ALL {
                if let Some(grandchildren) = self.nodes[group.sibling(q).index()].children.take() {
                    stack.push(grandchildren);
                }
            }
        }

        trace!(?id, groups = groups.len(), "released subtree");

        // Deepest groups first
        self.free.extend(groups.into_iter().rev());

        self.nodes[id.index()].pixel_count = 0;
        self.invalidate(id);
    }

    /// Kill every cell of the universe.
    pub fn clear(&mut self) {
        self.remove_node(self.root);
    }

    /// Coordinates of every live cell, sorted.
    pub fn live_cells(&self) -> Vec<(Coord, Coord)> {
        let mut cells = vec![];
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            let node = self.node(id);

            if node.is_alive() {
                cells.push((node.range.start_x, node.range.start_y));
            }

            if let Some(children) = node.children() {
                stack.extend(children);
            }
        }

        cells.sort();
        cells
    }

    pub fn population(&self) -> usize {
        self.nodes_iter().filter(|node| node.is_alive()).count()
    }

    /// Nodes reachable from the root
    fn nodes_iter(&self) -> impl Iterator<Item = &StructuralNode> {
        let mut stack = vec![self.root];

        std::iter::from_fn(move || {
            let node = self.node(stack.pop()?);

            if let Some(children) = node.children() {
                stack.extend(children);
            }

            Some(node)
        })
    }

    pub(crate) fn set_cached_macrocell(&mut self, id: NodeId, handle: Handle) {
        self.nodes[id.index()].cached_macrocell = Some(handle);
    }

    /// Forget the canonical value of `id` and of everything above it.
    fn invalidate(&mut self, id: NodeId) {
        self.next = None;

        let mut current = Some(id);

        while let Some(id) = current {
            let node = &mut self.nodes[id.index()];
            node.cached_macrocell = None;
            current = node.parent;
        }
    }
}

impl Debug for QuadTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.bounds)
            .field("nodes", &self.len())
            .field("population", &self.population())
            .finish()
    }
}
