pub mod camera;
pub mod engine;
pub mod macrocell;
pub mod parse_rle;
pub mod quadtree;
pub mod rules;
pub mod store;
pub mod world;

mod parse_util;

pub use crate::macrocell::Handle;
pub use crate::macrocell::Macrocell;
pub use crate::quadtree::QuadTree;
pub use crate::store::NodeStore;
pub use crate::world::World;

/// A cell coordinate. `x` grows eastward, `y` southward.
pub type Coord = i64;
