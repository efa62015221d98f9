use std::fmt::Debug;

use crate::Coord;
use crate::macrocell::Handle;
use crate::macrocell::Quadrant;
use crate::quadtree::range::Range;

/// Index of a [`StructuralNode`] in its tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "Out of memory!");

        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Children sit next to each other, in [`Quadrant::ALL`] order.
    pub(crate) fn sibling(self, q: Quadrant) -> Self {
        NodeId(self.0 + q.index() as u32)
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A node of the structural tree.
///
/// Internal nodes have either no children or all four of them. `pixel_count` on a leaf is `1`
/// when the cell is alive. On an internal node it is set once anything was drawn below it.
pub struct StructuralNode {
    /// Unique for the lifetime of the tree, even when the slot gets reused
    pub id: u64,
    pub range: Range,
    pub side_length: Coord,
    pub is_leaf: bool,
    pub pixel_count: u32,

    /// First of the four children
    pub(crate) children: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) cached_macrocell: Option<Handle>,
}

impl StructuralNode {
    pub(crate) fn new(id: u64, range: Range, parent: Option<NodeId>) -> Self {
        let side_length = range.side_length();

        StructuralNode {
            id,
            range,
            side_length,
            is_leaf: side_length == 1,
            pixel_count: 0,
            children: None,
            parent,
            cached_macrocell: None,
        }
    }

    pub fn children(&self) -> Option<[NodeId; 4]> {
        let first = self.children?;

        Some(Quadrant::ALL.map(|q| first.sibling(q)))
    }

    pub fn child(&self, q: Quadrant) -> Option<NodeId> {
        self.children.map(|first| first.sibling(q))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn cached_macrocell(&self) -> Option<Handle> {
        self.cached_macrocell
    }

    /// `log2` of the side length, which is also the level of its macrocell
    pub fn level(&self) -> u8 {
        self.side_length.trailing_zeros() as u8
    }

    pub fn is_alive(&self) -> bool {
        self.is_leaf && self.pixel_count == 1
    }
}

impl Debug for StructuralNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let g = |i: Option<NodeId>| -> String {
            match i {
                Some(i) => format!("{i:?}"),
                None => "-".to_string(),
            }
        };

        write!(
            f,
            "[#{} {:?} px: {}, children: {}, parent: {}]",
            self.id,
            self.range,
            self.pixel_count,
            g(self.children),
            g(self.parent)
        )
    }
}
