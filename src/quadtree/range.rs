use core::fmt::Debug;

use crate::Coord;
use crate::macrocell::Quadrant;

/// A half-open square of cells, `[start_x, end_x) x [start_y, end_y)`.
///
/// `y` grows downward, so the north half of a range is the one with the smaller `y`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_x: Coord,
    pub start_y: Coord,
    pub end_x: Coord,
    pub end_y: Coord,
}

impl Range {
    pub const fn square(start_x: Coord, start_y: Coord, side: Coord) -> Self {
        Range {
            start_x,
            start_y,
            end_x: start_x + side,
            end_y: start_y + side,
        }
    }

    /// The square of side `2^depth` centred on the origin.
    pub const fn centred(depth: u8) -> Self {
        let half = 1 << (depth - 1);

        Self::square(-half, -half, 2 * half)
    }

    pub const fn side_length(&self) -> Coord {
        self.end_x - self.start_x
    }

    pub const fn contains(&self, x: Coord, y: Coord) -> bool {
        self.start_x <= x && x < self.end_x && self.start_y <= y && y < self.end_y
    }

    /// The midlines of the range. They belong to the east and south halves.
    pub const fn centre(&self) -> (Coord, Coord) {
        let half = self.side_length() / 2;

        (self.start_x + half, self.start_y + half)
    }

    /// The quadrant holding `(x, y)`, if the point is in the range at all.
    pub fn quadrant_of(&self, x: Coord, y: Coord) -> Option<Quadrant> {
        if !self.contains(x, y) {
            return None;
        }

        let (mid_x, mid_y) = self.centre();

        Some(Quadrant::from_halves(x >= mid_x, y >= mid_y))
    }

    pub fn child(&self, q: Quadrant) -> Range {
        let half = self.side_length() / 2;
        let (mid_x, mid_y) = self.centre();

        match q {
            Quadrant::Nw => Range::square(self.start_x, self.start_y, half),
            Quadrant::Ne => Range::square(mid_x, self.start_y, half),
            Quadrant::Sw => Range::square(self.start_x, mid_y, half),
            Quadrant::Se => Range::square(mid_x, mid_y, half),
        }
    }

    /// Splits the range into four equal quadrants
    pub fn split(&self) -> [Range; 4] {
        Quadrant::ALL.map(|q| self.child(q))
    }
}

impl Debug for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}) x [{}, {})",
            self.start_x, self.end_x, self.start_y, self.end_y
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn centred_bounds() {
        assert_eq!(Range::centred(17), Range::square(-65536, -65536, 131072));
        assert_eq!(Range::centred(1), Range::square(-1, -1, 2));
        assert_eq!(format!("{:?}", Range::centred(2)), "[-2, 2) x [-2, 2)");
    }

    #[test]
    fn half_open() {
        let r = Range::square(0, 0, 4);

        assert!(r.contains(0, 0));
        assert!(r.contains(3, 3));
        assert!(!r.contains(4, 0));
        assert!(!r.contains(0, -1));
    }

    #[test]
    fn midline_goes_east_and_south() {
        let r = Range::square(-4, -4, 8);

        assert_eq!(r.quadrant_of(-1, -1), Some(Quadrant::Nw));
        assert_eq!(r.quadrant_of(0, -1), Some(Quadrant::Ne));
        assert_eq!(r.quadrant_of(-1, 0), Some(Quadrant::Sw));
        assert_eq!(r.quadrant_of(0, 0), Some(Quadrant::Se));
        assert_eq!(r.quadrant_of(4, 0), None);
    }

    #[test]
    fn split_tiles_the_range() {
        let r = Range::square(-4, 2, 8);
        let [nw, ne, sw, se] = r.split();

        assert_eq!(nw, Range::square(-4, 2, 4));
        assert_eq!(ne, Range::square(0, 2, 4));
        assert_eq!(sw, Range::square(-4, 6, 4));
        assert_eq!(se, Range::square(0, 6, 4));

        for x in r.start_x..r.end_x {
            for y in r.start_y..r.end_y {
                let q = r.quadrant_of(x, y).unwrap();
                assert!(r.child(q).contains(x, y));
                assert_eq!(r.split().iter().filter(|c| c.contains(x, y)).count(), 1);
            }
        }
    }
}
