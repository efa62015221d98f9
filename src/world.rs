use std::ops::ControlFlow;

use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::Coord;
use crate::macrocell::Handle;
use crate::parse_rle;
use crate::parse_rle::RleEncodingError;
use crate::parse_rle::RleError;
use crate::parse_rle::RleFile;
use crate::quadtree::QuadTree;
use crate::quadtree::QuadTreeError;
use crate::store::NodeStore;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error(transparent)]
    QuadTree(#[from] QuadTreeError),

    #[error("Failed to read pattern: {0}")]
    Rle(#[from] RleError),
}

/// A Game of Life session.
///
/// Owns the canonical node cache and the structural tree of the current generation. Stepping
/// builds a fresh tree out of the next generation, while the cache lives on, so whatever was
/// computed for one generation is reused by all the following ones.
pub struct World {
    store: NodeStore,
    tree: QuadTree,

    /// Number of generations stepped since the world was created
    generation: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world spanning `[-65536, 65536)` on both axes.
    pub fn new() -> Self {
        Self::from_tree(QuadTree::new())
    }

    /// Create an empty world of side `2^depth`, centred on the origin.
    pub fn with_depth(depth: u8) -> Result<Self, WorldError> {
        Ok(Self::from_tree(QuadTree::with_depth(depth)?))
    }

    fn from_tree(tree: QuadTree) -> Self {
        Self {
            store: NodeStore::new(),
            tree,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn depth(&self) -> u8 {
        self.tree.depth()
    }

    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Bring the cell at `(x, y)` to life.
    pub fn set(&mut self, x: Coord, y: Coord) -> Result<(), WorldError> {
        Ok(self.tree.add_pixel(x, y)?)
    }

    pub fn get(&self, x: Coord, y: Coord) -> bool {
        self.tree.get_pixel(x, y)
    }

    /// Whether the cell at `(x, y)` is alive one generation from now, without stepping.
    pub fn peek_next(&mut self, x: Coord, y: Coord) -> bool {
        self.tree.next_generation(&mut self.store);
        self.tree.get_next_gen_pixel(&self.store, x, y)
    }

    /// The canonical macrocell of the current generation.
    pub fn root(&mut self) -> Handle {
        let root = self.tree.root();
        self.tree.canonicalize(root, &mut self.store)
    }

    /// Advance the world one generation.
    pub fn step(&mut self) -> Result<(), WorldError> {
        let next = self.tree.next_generation(&mut self.store);

        let mut cells = vec![];
        self.store.for_each_alive(next, self.tree.depth(), self.tree.bounds(), |x, y| {
            cells.push((x, y))
        });

        let mut tree = QuadTree::with_depth(self.tree.depth())?;
        for (x, y) in cells {
            tree.add_pixel(x, y)?;
        }

        self.tree = tree;
        self.generation += 1;

        let stats = self.store.stats();
        debug!(
            generation = self.generation,
            nodes = self.store.len(),
            hits = stats.hits,
            misses = stats.misses,
            "stepped"
        );

        Ok(())
    }

    /// Advance the world `n` generations.
    pub fn step_n(&mut self, n: u64) -> Result<(), WorldError> {
        for _ in 0..n {
            self.step()?;
        }

        Ok(())
    }

    /// Coordinates of every live cell, sorted.
    pub fn live_cells(&self) -> Vec<(Coord, Coord)> {
        self.tree.live_cells()
    }

    pub fn population(&self) -> usize {
        self.tree.population()
    }

    /// Kill every cell. The generation counter and the cache are kept.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Draw the pattern of an RLE file into the world.
    ///
    /// The world is left untouched if the file fails to parse or does not fit in the universe.
    pub fn load_rle<'a>(&mut self, bytes: &'a [u8]) -> Result<RleFile<'a>, WorldError> {
        let bounds = self.tree.bounds();
        let mut cells = vec![];

        let res = parse_rle::read_rle_until(bytes, |x, y| {
            if !bounds.contains(x, y) {
                return ControlFlow::Break(());
            }

            cells.push((x, y));
            ControlFlow::Continue(())
        });

        let file = match res {
            Err(RleError::Encoding(RleEncodingError::Stopped { x, y })) => {
                return Err(QuadTreeError::OutOfBounds { x, y }.into());
            }
            res => res?,
        };

        for (x, y) in cells {
            self.set(x, y)?;
        }

        info!(
            name = ?file.name.map(String::from_utf8_lossy),
            population = self.population(),
            "loaded pattern"
        );

        Ok(file)
    }
}
