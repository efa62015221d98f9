use core::fmt::Debug;

/// Index of a canonical [`Macrocell`] in a [`NodeStore`](crate::store::NodeStore).
///
/// Handle `0` is always the null sentinel, the all-dead macrocell of every size.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Handle(u32);

impl Handle {
    /// The null sentinel
    pub const NULL: Handle = Handle(0);

    pub(crate) fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "Out of memory!");

        Handle(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "#null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Bit of `bits` holding the south-east cell
pub const SE_BIT: u8 = 0b0001;
/// Bit of `bits` holding the south-west cell
pub const SW_BIT: u8 = 0b0010;
/// Bit of `bits` holding the north-east cell
pub const NE_BIT: u8 = 0b0100;
/// Bit of `bits` holding the north-west cell
pub const NW_BIT: u8 = 0b1000;

/// One of the four quarters of a square.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Quadrant {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Quadrant {
    /// All quadrants, in the order children are laid out in memory.
    pub const ALL: [Quadrant; 4] = [Quadrant::Nw, Quadrant::Ne, Quadrant::Sw, Quadrant::Se];

    /// Position of this quadrant in [`Quadrant::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Quadrant::Nw => 0,
            Quadrant::Ne => 1,
            Quadrant::Sw => 2,
            Quadrant::Se => 3,
        }
    }

    /// Pick the quadrant from which half of each axis a point lies in.
    pub const fn from_halves(east: bool, south: bool) -> Self {
        match (east, south) {
            (false, false) => Quadrant::Nw,
            (true, false) => Quadrant::Ne,
            (false, true) => Quadrant::Sw,
            (true, true) => Quadrant::Se,
        }
    }

    /// The bit of a 4-bit pattern that holds this quadrant
    pub const fn bit(self) -> u8 {
        match self {
            Quadrant::Nw => NW_BIT,
            Quadrant::Ne => NE_BIT,
            Quadrant::Sw => SW_BIT,
            Quadrant::Se => SE_BIT,
        }
    }
}

/// The hash-consed value of a square of `2^level` cells on a side.
///
/// A macrocell is identified by its content. The store hands out exactly one [`Handle`] per
/// distinct value, so comparing handles compares whole subtrees.
///
/// # Representation
/// `bits` is a 4-bit pattern, read through [`Macrocell::bit_nw`] and friends:
/// ```notrust
/// 0000_1000  nw
/// 0000_0100  ne
/// 0000_0010  sw
/// 0000_0001  se
/// ```
///
/// What the pattern means depends on the level:
/// * level 0: a single cell, alive iff bit 0 is set. Quadrants are all null.
/// * level 1: the four cells of the 2x2 square. Quadrants are level 0 handles.
/// * level 2: the 2x2 centre of the 4x4 square, one generation ahead.
/// * level 3 and up: unused, always `0`.
///
/// The quadrants always describe the current generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Macrocell {
    pub bits: u8,

    pub nw: Handle,
    pub ne: Handle,
    pub sw: Handle,
    pub se: Handle,
}

impl Macrocell {
    /// Value of the null sentinel. Every field points back at the sentinel itself.
    pub const fn null() -> Self {
        Self {
            bits: 0,
            nw: Handle::NULL,
            ne: Handle::NULL,
            sw: Handle::NULL,
            se: Handle::NULL,
        }
    }

    /// Value of a single cell
    pub const fn basis(alive: bool) -> Self {
        Self {
            bits: alive as u8,
            ..Self::null()
        }
    }

    pub const fn is_null(&self) -> bool {
        self.bits == 0
            && self.nw.0 == 0
            && self.ne.0 == 0
            && self.sw.0 == 0
            && self.se.0 == 0
    }

    /// Reads bit 3 (`0b1000`)
    pub const fn bit_nw(&self) -> bool {
        self.bits & NW_BIT != 0
    }

    /// Reads bit 2 (`0b0100`)
    pub const fn bit_ne(&self) -> bool {
        self.bits & NE_BIT != 0
    }

    /// Reads bit 1 (`0b0010`)
    pub const fn bit_sw(&self) -> bool {
        self.bits & SW_BIT != 0
    }

    /// Reads bit 0 (`0b0001`)
    pub const fn bit_se(&self) -> bool {
        self.bits & SE_BIT != 0
    }

    pub const fn bit(&self, q: Quadrant) -> bool {
        self.bits & q.bit() != 0
    }

    pub const fn quadrant(&self, q: Quadrant) -> Handle {
        match q {
            Quadrant::Nw => self.nw,
            Quadrant::Ne => self.ne,
            Quadrant::Sw => self.sw,
            Quadrant::Se => self.se,
        }
    }

    pub const fn quadrants(&self) -> [Handle; 4] {
        [self.nw, self.ne, self.sw, self.se]
    }
}

impl Debug for Macrocell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:04b} nw: {:?}, ne: {:?}, sw: {:?}, se: {:?}]",
            self.bits, self.nw, self.ne, self.sw, self.se
        )
    }
}

/// The nine-field record of a merge step.
///
/// A macrocell of level `k >= 3` overlaps nine squares of level `k - 1`: its four quadrants and
/// five auxiliary squares straddling the seams between them.
///
/// ```notrust
///   nw nn ne
///   ww cc ee
///   sw ss se
/// ```
///
/// Each field is the successor of one of those squares, a level `k - 2` macrocell one
/// generation ahead. Together they tile the central three quarters of the macrocell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Generation {
    pub nw: Handle,
    pub ne: Handle,
    pub sw: Handle,
    pub se: Handle,

    /// North edge, centred on the seam between `nw` and `ne`
    pub nn: Handle,
    /// South edge, centred on the seam between `sw` and `se`
    pub ss: Handle,
    /// East edge, centred on the seam between `ne` and `se`
    pub ee: Handle,
    /// West edge, centred on the seam between `nw` and `sw`
    pub ww: Handle,
    /// Centre, straddling all four quadrants
    pub cc: Handle,
}

impl Generation {
    /// The record of the null sentinel, every field pointing at the sentinel.
    pub const fn null() -> Self {
        Self {
            nw: Handle::NULL,
            ne: Handle::NULL,
            sw: Handle::NULL,
            se: Handle::NULL,
            nn: Handle::NULL,
            ss: Handle::NULL,
            ee: Handle::NULL,
            ww: Handle::NULL,
            cc: Handle::NULL,
        }
    }

    /// The nine fields in reading order, top row first.
    pub const fn rows(&self) -> [[Handle; 3]; 3] {
        [
            [self.nw, self.nn, self.ne],
            [self.ww, self.cc, self.ee],
            [self.sw, self.ss, self.se],
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_points_at_itself() {
        let null = Macrocell::null();

        assert!(null.is_null());
        assert_eq!(null.quadrants(), [Handle::NULL; 4]);
        assert_eq!(Macrocell::basis(false), null);
        assert!(!Macrocell::basis(true).is_null());
    }

    #[test]
    fn accessors_read_their_bit() {
        let cell = Macrocell {
            bits: NW_BIT | SE_BIT,
            ..Macrocell::null()
        };

        assert!(cell.bit_nw());
        assert!(!cell.bit_ne());
        assert!(!cell.bit_sw());
        assert!(cell.bit_se());

        for q in Quadrant::ALL {
            assert_eq!(cell.bit(q), matches!(q, Quadrant::Nw | Quadrant::Se));
        }
    }

    #[test]
    fn quadrant_order() {
        for (i, q) in Quadrant::ALL.into_iter().enumerate() {
            assert_eq!(q.index(), i);
        }

        assert_eq!(Quadrant::from_halves(true, false), Quadrant::Ne);
        assert_eq!(Quadrant::from_halves(false, true), Quadrant::Sw);
    }
}
