use std::collections::BTreeSet;

use proptest::prelude::*;

use quadlife::Coord;
use quadlife::NodeStore;
use quadlife::QuadTree;
use quadlife::World;

const DEPTH: u8 = 4;
const HALF: Coord = 1 << (DEPTH - 1);

/// Plain Game of Life on the universe `[-HALF, HALF)`, with dead cells all around it.
fn naive_step(cells: &BTreeSet<(Coord, Coord)>) -> BTreeSet<(Coord, Coord)> {
    let mut next = BTreeSet::new();

    for x in -HALF..HALF {
        for y in -HALF..HALF {
            let mut count = 0;

            for dx in -1..=1 {
                for dy in -1..=1 {
                    if (dx, dy) != (0, 0) && cells.contains(&(x + dx, y + dy)) {
                        count += 1;
                    }
                }
            }

            let alive = cells.contains(&(x, y));

            if count == 3 || (count == 2 && alive) {
                next.insert((x, y));
            }
        }
    }

    next
}

fn cells() -> impl Strategy<Value = Vec<(Coord, Coord)>> {
    prop::collection::vec((-HALF..HALF, -HALF..HALF), 0..80)
}

proptest! {
    #[test]
    fn matches_naive_simulation(cells in cells(), steps in 1u64..8) {
        let mut world = World::with_depth(DEPTH).unwrap();
        let mut naive: BTreeSet<_> = cells.iter().copied().collect();

        for &(x, y) in &cells {
            world.set(x, y).unwrap();
        }

        for _ in 0..steps {
            world.step().unwrap();
            naive = naive_step(&naive);

            prop_assert_eq!(world.live_cells(), naive.iter().copied().collect::<Vec<_>>());
        }
    }

    #[test]
    fn next_gen_pixels_match_naive_simulation(cells in cells()) {
        let mut store = NodeStore::new();
        let mut tree = QuadTree::with_depth(DEPTH).unwrap();

        for &(x, y) in &cells {
            tree.add_pixel(x, y).unwrap();
        }

        tree.next_generation(&mut store);
        let naive = naive_step(&cells.iter().copied().collect());

        for x in -HALF - 1..=HALF {
            for y in -HALF - 1..=HALF {
                prop_assert_eq!(
                    tree.get_next_gen_pixel(&store, x, y),
                    naive.contains(&(x, y)),
                    "({}, {})", x, y
                );
            }
        }
    }

    #[test]
    fn add_pixel_is_idempotent(cells in cells()) {
        let mut tree = QuadTree::with_depth(DEPTH).unwrap();

        for &(x, y) in &cells {
            tree.add_pixel(x, y).unwrap();
        }

        let live = tree.live_cells();
        let nodes = tree.len();

        for &(x, y) in &cells {
            tree.add_pixel(x, y).unwrap();
        }

        prop_assert_eq!(tree.live_cells(), live);
        prop_assert_eq!(tree.len(), nodes);
    }

    #[test]
    fn insertion_order_gives_the_same_handle(
        (cells, shuffled) in cells().prop_flat_map(|cells| (Just(cells.clone()), Just(cells).prop_shuffle()))
    ) {
        let mut store = NodeStore::new();
        let mut a = QuadTree::with_depth(DEPTH).unwrap();
        let mut b = QuadTree::with_depth(DEPTH).unwrap();

        for &(x, y) in &cells {
            a.add_pixel(x, y).unwrap();
        }

        for &(x, y) in &shuffled {
            b.add_pixel(x, y).unwrap();
        }

        let (ra, rb) = (a.root(), b.root());
        prop_assert_eq!(a.canonicalize(ra, &mut store), b.canonicalize(rb, &mut store));
        prop_assert_eq!(a.next_generation(&mut store), b.next_generation(&mut store));
    }

    #[test]
    fn repeated_steps_are_free(cells in cells()) {
        let mut store = NodeStore::new();
        let mut tree = QuadTree::with_depth(DEPTH).unwrap();

        for &(x, y) in &cells {
            tree.add_pixel(x, y).unwrap();
        }

        let root = Some(tree.root());
        let first = tree.next_generation_of(root, &mut store);
        let stats = store.stats();

        prop_assert_eq!(tree.next_generation_of(root, &mut store), first);
        prop_assert_eq!(store.stats().rule_evaluations, stats.rule_evaluations);
    }
}
