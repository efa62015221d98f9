use core::fmt::Display;

use thiserror::Error;

use crate::macrocell::Macrocell;
use crate::macrocell::NE_BIT;
use crate::macrocell::NW_BIT;
use crate::macrocell::SE_BIT;
use crate::macrocell::SW_BIT;
use crate::parse_util;
use crate::parse_util::ParseError;

/// Conway's transition for one cell, given its 3x3 neighbourhood.
///
/// A cell with exactly three live neighbours is alive in the next generation, a cell with exactly
/// two keeps its state, and every other cell dies.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn life(
    nw: bool,
    nn: bool,
    ne: bool,
    ww: bool,
    cc: bool,
    ee: bool,
    sw: bool,
    ss: bool,
    se: bool,
) -> bool {
    let count = [nw, nn, ne, ww, ee, sw, ss, se]
        .into_iter()
        .filter(|&b| b)
        .count();

    match count {
        2 => cc,
        3 => true,
        _ => false,
    }
}

/// Step the centre of a 4x4 block one generation.
///
/// The block is given as its four level 1 quadrants. Laid out by cell, it reads
/// ```notrust
///   nw.nw nw.ne | ne.nw ne.ne
///   nw.sw nw.se | ne.sw ne.se
///   ------------+------------
///   sw.nw sw.ne | se.nw se.ne
///   sw.sw sw.se | se.sw se.se
/// ```
/// and the four centre cells `nw.se`, `ne.sw`, `sw.ne`, `se.nw` each see a full 3x3 neighbourhood.
/// The result is their next state as a 4-bit pattern (see [`Macrocell`]).
#[rustfmt::skip]
pub fn life_4(nw: &Macrocell, ne: &Macrocell, sw: &Macrocell, se: &Macrocell) -> u8 {
    let mut bits = 0;

    if life(
        nw.bit_nw(), nw.bit_ne(), ne.bit_nw(),
        nw.bit_sw(), nw.bit_se(), ne.bit_sw(),
        sw.bit_nw(), sw.bit_ne(), se.bit_nw(),
    ) {
        bits |= NW_BIT;
    }

    if life(
        nw.bit_ne(), ne.bit_nw(), ne.bit_ne(),
        nw.bit_se(), ne.bit_sw(), ne.bit_se(),
        sw.bit_ne(), se.bit_nw(), se.bit_ne(),
    ) {
        bits |= NE_BIT;
    }

    if life(
        nw.bit_sw(), nw.bit_se(), ne.bit_sw(),
        sw.bit_nw(), sw.bit_ne(), se.bit_nw(),
        sw.bit_sw(), sw.bit_se(), se.bit_sw(),
    ) {
        bits |= SW_BIT;
    }

    if life(
        nw.bit_se(), ne.bit_sw(), ne.bit_se(),
        sw.bit_ne(), se.bit_nw(), se.bit_ne(),
        sw.bit_se(), se.bit_sw(), se.bit_se(),
    ) {
        bits |= SE_BIT;
    }

    bits
}

/// Rules of Conway's Game of Life.
pub const B3S23: RuleSet = RuleSet::new(0b1000, 0b1100);

/// A life-like rule, as found in pattern files.
///
/// The engine only ever runs [`B3S23`]; this type exists so that loaded patterns can say which
/// rule they were drawn for, and be refused when it is a different one.
///
/// # Representation
/// ```notrust
/// |------birth------|
/// 0000_0000_0000_0000_0000_0000_0000_0000
///                     |----survival-----|
/// ```
///
/// # Examples
/// ```notrust
/// b3s23:                0000_0000_0000_1000_0000_0000_0000_1100
///
/// b0s0:                 0000_0000_0000_0000_0000_0000_0000_0000
/// b012345678s012345678: 0000_0001_1111_1111_0000_0001_1111_1111
/// ```
///
/// See: https://conwaylife.com/wiki/Rulestring
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RuleSet {
    rule: u32,
}

impl Default for RuleSet {
    fn default() -> Self {
        B3S23
    }
}

impl RuleSet {
    /// Create a new `RuleSet` for the given births and survivals. Bit `i` of `b` (resp. `s`) means
    /// `i` neighbours cause a birth (resp. survival). Any bit past the 8th is ignored.
    pub const fn new(b: u16, s: u16) -> Self {
        let b = b & 0x1FF;
        let s = s & 0x1FF;

        Self {
            rule: (b as u32) << 16 | s as u32,
        }
    }

    pub fn births(&self) -> u16 {
        ((self.rule & 0x1FF0000) >> 0x10) as u16
    }

    pub fn survivals(&self) -> u16 {
        (self.rule & 0x1FF) as u16
    }

    pub fn is_life(&self) -> bool {
        *self == B3S23
    }
}

impl Display for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = |mask: u16| -> String {
            (0..=8)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| char::from(b'0' + i as u8))
                .collect()
        };

        write!(f, "B{}/S{}", digits(self.births()), digits(self.survivals()))
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Expected b or B to start the births")]
    NoBirths,

    #[error("Expected s or S to start the survivals")]
    NoSurvivals,

    #[error("Expected a neighbour count from 0 to 8, found '{got}'")]
    InvalidCount { got: char },
}

/// Parse rules that look like `B3/S23`
pub(crate) fn parse_rule(bytes: &[u8]) -> Result<(RuleSet, &[u8]), RuleError> {
    let (Some(b'b' | b'B'), bytes) = parse_util::take_1(bytes) else {
        return Err(RuleError::NoBirths);
    };

    let (b, bytes) = parse_util::take_until(b'/', bytes);
    let bytes = parse_util::expect(b'/', bytes)?;

    let (Some(b's' | b'S'), bytes) = parse_util::take_1(bytes) else {
        return Err(RuleError::NoSurvivals);
    };

    let (s, bytes) =
        parse_util::take_until_fn(|b| b.is_ascii_whitespace() || b == b',' || b == b':', bytes);

    Ok((RuleSet::new(bytes_to_num(b)?, bytes_to_num(s)?), bytes))
}

/// Parse rules that look like `23/3`, survivals first. These show up in RLE `#r` comment lines.
pub(crate) fn parse_nameless_rule(bytes: &[u8]) -> Result<(RuleSet, &[u8]), RuleError> {
    let (s, bytes) = parse_util::take_until(b'/', bytes);
    let bytes = parse_util::expect(b'/', bytes)?;
    let (b, bytes) = parse_util::take_until_ws(bytes);

    Ok((RuleSet::new(bytes_to_num(b)?, bytes_to_num(s)?), bytes))
}

/// Convert the human readable birth/survival digits to a packed bit representation
fn bytes_to_num(bytes: &[u8]) -> Result<u16, RuleError> {
    let mut n = 0;

    for &b in bytes {
        if !(b'0'..=b'8').contains(&b) {
            return Err(RuleError::InvalidCount { got: b as char });
        }

        n |= 1 << (b - b'0');
    }

    Ok(n)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::macrocell::Handle;

    fn block(bits: u8) -> Macrocell {
        Macrocell {
            bits,
            ..Macrocell::null()
        }
    }

    #[test]
    fn life_all_neighbourhoods() {
        for n in 0u16..512 {
            let b = |i: u16| n & (1 << i) != 0;
            let (cc, neighbours) = (b(4), [b(0), b(1), b(2), b(3), b(5), b(6), b(7), b(8)]);
            let count = neighbours.iter().filter(|&&x| x).count();

            let want = count == 3 || (count == 2 && cc);
            let got = life(b(0), b(1), b(2), b(3), cc, b(5), b(6), b(7), b(8));

            assert_eq!(got, want, "neighbourhood {n:09b}");
        }
    }

    #[test]
    fn life_4_empty_is_empty() {
        let e = block(0);

        assert_eq!(life_4(&e, &e, &e, &e), 0);
    }

    #[test]
    fn life_4_block_is_still() {
        // A 2x2 block sitting exactly in the centre of the 4x4 square
        let nw = block(SE_BIT);
        let ne = block(SW_BIT);
        let sw = block(NE_BIT);
        let se = block(NW_BIT);

        assert_eq!(life_4(&nw, &ne, &sw, &se), 0b1111);
    }

    #[test]
    fn life_4_blinker() {
        // Vertical blinker in the second column: (1, 0), (1, 1), (1, 2)
        let nw = block(NE_BIT | SE_BIT);
        let sw = block(NE_BIT);
        let e = block(0);

        // It turns horizontal on row 1: (0, 1), (1, 1), (2, 1)
        let bits = life_4(&nw, &e, &sw, &e);

        assert_eq!(bits, NW_BIT | NE_BIT);
    }

    #[test]
    fn life_4_ignores_handles() {
        let mut odd = block(0b1111);
        odd.nw = Handle::new(7);

        assert_eq!(
            life_4(&odd, &odd, &odd, &odd),
            life_4(&block(0b1111), &block(0b1111), &block(0b1111), &block(0b1111))
        );
    }

    #[test]
    fn parse_rules() {
        let (rule, rest) = parse_rule(b"B3/S23\n").unwrap();
        assert!(rule.is_life());
        assert_eq!(rest, b"\n");

        let (rule, _) = parse_rule(b"b36/s23").unwrap();
        assert_eq!(rule.births(), 0b100_1000);
        assert!(!rule.is_life());

        let (rule, _) = parse_nameless_rule(b"23/3").unwrap();
        assert!(rule.is_life());

        let (rule, rest) = parse_rule(b"B3/S23:T20,20").unwrap();
        assert!(rule.is_life());
        assert_eq!(rest, b":T20,20");

        assert!(parse_rule(b"B9/S23").is_err());
        assert!(parse_rule(b"3/23").is_err());
    }

    #[test]
    fn display_rules() {
        assert_eq!(B3S23.to_string(), "B3/S23");
        assert_eq!(RuleSet::new(0b100_1000, 0b1100).to_string(), "B36/S23");
        assert_eq!(RuleSet::new(0, 0).to_string(), "B/S");
    }
}
