use std::ops::ControlFlow;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::Coord;
use crate::parse_util;
use crate::parse_util::ConvertError;
use crate::parse_util::ParseError;
use crate::rules;
use crate::rules::RuleError;
use crate::rules::RuleSet;

/// Everything an RLE file says besides its cells.
#[derive(Default, Debug)]
pub struct RleFile<'a> {
    pub name: Option<&'a [u8]>,
    pub author: Option<&'a [u8]>,

    /// Where the top left corner of the pattern goes, from a `#P` or `#R` line
    pub offset: Option<(Coord, Coord)>,

    /// Width and height of the pattern, from the header line
    pub size: Option<(Coord, Coord)>,

    pub set: RuleSet,
}

#[derive(Debug, Error)]
pub enum RleError {
    #[error("Comment line error: {0}")]
    CommentLine(#[from] RleCommentLineError),

    #[error("Header line error: {0}")]
    HeaderLine(#[from] RleHeaderLineError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] RleEncodingError),

    #[error("Only B3/S23 is supported, found {0}")]
    UnsupportedRule(RuleSet),
}

/// Parse the RLE file format, calling `f` with the coordinates of every live cell. Assumes the
/// bytes are valid Ascii.
///
/// Cells are placed relative to the offset of the file, if it has one, and `y` grows downward.
/// Patterns drawn for any rule other than Conway's are refused before a single cell is read.
///
/// See: https://conwaylife.com/wiki/Run_Length_Encoded
pub fn read_rle<F>(bytes: &'_ [u8], mut f: F) -> Result<RleFile<'_>, RleError>
where
    F: FnMut(Coord, Coord),
{
    read_rle_until(bytes, |x, y| {
        f(x, y);
        ControlFlow::Continue(())
    })
}

/// Like [`read_rle`], but `f` can stop the parse. Breaking on a cell returns
/// [`RleEncodingError::Stopped`] with its coordinates, and no further cell is read.
pub fn read_rle_until<F>(mut bytes: &'_ [u8], f: F) -> Result<RleFile<'_>, RleError>
where
    F: FnMut(Coord, Coord) -> ControlFlow<()>,
{
    let mut file = RleFile::default();

    // Parse as many comment lines as possible
    loop {
        let res = read_line_comment(parse_util::take_ws(bytes))?;
        let (Some(line), rest) = res else { break };

        match line {
            RleCommentLine::Comment => {}
            RleCommentLine::Name { name } => {
                if file.name.is_some() {
                    warn!("RLE file name already defined. Using latest");
                }

                file.name = Some(name);
            }
            RleCommentLine::Author { author } => {
                if file.author.is_some() {
                    warn!("RLE author already defined. Using latest");
                }

                file.author = Some(author);
            }
            RleCommentLine::Offset { x, y } => {
                if file.offset.is_some() {
                    warn!("RLE offset already defined. Using latest");
                }

                file.offset = Some((x, y))
            }
            RleCommentLine::RuleSet { set } => {
                file.set = set;
            }
        }

        bytes = rest;
    }

    // Parse header line, if it's present
    let res = read_line_header(parse_util::take_ws(bytes))?;
    if let (Some(header), rest) = res {
        let RleHeaderLine { x, y, set } = header;

        file.size = Some((x, y));

        if let Some(set) = set {
            file.set = set;
        }

        bytes = rest;
    }

    if !file.set.is_life() {
        return Err(RleError::UnsupportedRule(file.set));
    }

    let (dx, dy) = file.offset.unwrap_or_default();

    // Parse encoding
    let count = read_encoding(bytes, dx, dy, f)?;

    debug!(
        name = ?file.name.map(String::from_utf8_lossy),
        size = ?file.size,
        count,
        "read RLE pattern"
    );

    Ok(file)
}

enum RleCommentLine<'a> {
    Comment,
    Name { name: &'a [u8] },
    Author { author: &'a [u8] },
    Offset { x: Coord, y: Coord },
    RuleSet { set: RuleSet },
}

#[derive(Debug, Error)]
pub enum RleCommentLineError {
    #[error("No comment type")]
    NoType,

    #[error("Empty name line")]
    EmptyName,

    #[error("Empty author line")]
    EmptyAuthor,

    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleError),

    #[error("Invalid coordinates: {0}")]
    InvalidCoord(#[from] RleCoordError),

    #[error("Invalid comment type, found '{got}'")]
    InvalidType { got: char },
}

/// Attempt to parse a comment line, otherwise leaves `bytes` as-is.
fn read_line_comment(
    bytes: &'_ [u8],
) -> Result<(Option<RleCommentLine<'_>>, &'_ [u8]), RleCommentLineError> {
    let Ok(bytes) = parse_util::expect(b'#', bytes) else {
        return Ok((None, bytes));
    };

    let (Some(b), bytes) = parse_util::take_1(bytes) else {
        return Err(RleCommentLineError::NoType);
    };

    match b {
        // Comment line
        b'C' | b'c' => {
            let (_, bytes) = parse_util::take_line(bytes);

            Ok((Some(RleCommentLine::Comment), bytes))
        }

        // Pattern name
        b'N' => {
            let (name, bytes) = parse_util::take_line(parse_util::take_blank(bytes));

            if name.trim_ascii().is_empty() {
                return Err(RleCommentLineError::EmptyName);
            }

            let line = RleCommentLine::Name {
                name: name.trim_ascii_end(),
            };

            Ok((Some(line), bytes))
        }

        // Pattern author
        b'O' => {
            let (author, bytes) = parse_util::take_line(parse_util::take_blank(bytes));

            if author.trim_ascii().is_empty() {
                return Err(RleCommentLineError::EmptyAuthor);
            }

            let line = RleCommentLine::Author {
                author: author.trim_ascii_end(),
            };

            Ok((Some(line), bytes))
        }

        // Pattern offset
        b'R' | b'P' => {
            let (line, bytes) = parse_util::take_line(bytes);
            let (x, y) = read_offset(line)?;

            let line = RleCommentLine::Offset { x, y };

            Ok((Some(line), bytes))
        }

        // Pattern rules
        b'r' => {
            let (line, bytes) = parse_util::take_line(bytes);
            let (rule, _) = rules::parse_nameless_rule(line.trim_ascii())?;

            let line = RleCommentLine::RuleSet { set: rule };

            Ok((Some(line), bytes))
        }

        b => Err(RleCommentLineError::InvalidType { got: b as char }),
    }
}

struct RleHeaderLine {
    x: Coord,
    y: Coord,
    set: Option<RuleSet>,
}

#[derive(Debug, Error)]
pub enum RleHeaderLineError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Invalid coordinates: {0}")]
    InvalidCoord(#[from] RleCoordError),

    #[error("Invalid token: expected ',' or '\\n', found '{got}'")]
    InvalidToken { got: char },

    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleError),
}

/// Attempt to parse a header line, otherwise leaves `bytes` as-is.
fn read_line_header(bytes: &[u8]) -> Result<(Option<RleHeaderLine>, &[u8]), RleHeaderLineError> {
    if parse_util::peek_1(bytes) != Some(b'x') {
        return Ok((None, bytes));
    }

    let (line, rest) = parse_util::take_line(bytes);
    let ((x, y), line) = read_coordinates(line)?;

    let line = parse_util::take_blank(line);

    let set = match parse_util::take_1(line) {
        (Some(b','), line) => {
            let line = parse_util::take_blank(line);
            let line = parse_util::expect_slice(b"rule", line)?;
            let line = parse_util::take_blank(line);
            let line = parse_util::expect(b'=', line)?;
            let line = parse_util::take_blank(line);

            // Anything after the rule, like a bounded grid, is ignored
            let (rule, _) = rules::parse_rule(line)?;

            Some(rule)
        }
        (None, _) => None,
        (Some(b), _) => return Err(RleHeaderLineError::InvalidToken { got: b as char }),
    };

    Ok((Some(RleHeaderLine { x, y, set }), rest))
}

#[derive(Debug, Error)]
pub enum RleEncodingError {
    #[error("Unexpected EOF")]
    UnexpectedEof,

    #[error("Failed to convert run length: {0}")]
    RunLength(#[from] ConvertError),

    #[error("Unrecognized byte: 0x{got:0X}")]
    UnrecognizedByte { got: u8 },

    #[error("Coordinates overflow")]
    Overflow,

    #[error("Stopped at ({x}, {y})")]
    Stopped { x: Coord, y: Coord },
}

/// Read the run-length encoded cells, up to and including the final `!`. Returns how many live
/// cells were found.
fn read_encoding<F>(
    mut bytes: &[u8],
    dx: Coord,
    dy: Coord,
    mut f: F,
) -> Result<u64, RleEncodingError>
where
    F: FnMut(Coord, Coord) -> ControlFlow<()>,
{
    let mut rep: Coord = 1;
    let mut count = 0;

    let (mut x, mut y): (Coord, Coord) = (0, 0);

    let advance = |at: Coord, by: Coord| at.checked_add(by).ok_or(RleEncodingError::Overflow);

    loop {
        let (Some(b), rest) = parse_util::take_1(bytes) else {
            return Err(RleEncodingError::UnexpectedEof);
        };
        bytes = rest;

        match b {
            b if b.is_ascii_whitespace() => {}

            // End of input
            b'!' => break,

            // Dead cell
            b'b' => {
                x = advance(x, rep)?;
                rep = 1;
            }

            // Live cell
            b'o' => {
                let end = advance(x, rep)?;
                let cy = advance(dy, y)?;

                for x in x..end {
                    let cx = advance(dx, x)?;

                    if f(cx, cy).is_break() {
                        return Err(RleEncodingError::Stopped { x: cx, y: cy });
                    }

                    count += 1;
                }

                x = end;
                rep = 1;
            }

            // End of line
            b'$' => {
                y = advance(y, rep)?;
                x = 0;
                rep = 1;
            }

            n if n.is_ascii_digit() => {
                let (digits, rest) = parse_util::take_until_fn(|b| !b.is_ascii_digit(), bytes);
                bytes = rest;

                // `n` was already taken off the input
                let mut run = vec![n];
                run.extend_from_slice(digits);

                rep = parse_util::convert(&run)?;
            }

            b => return Err(RleEncodingError::UnrecognizedByte { got: b }),
        }
    }

    Ok(count)
}

#[derive(Debug, Error)]
pub enum RleCoordError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Failed to parse x coordinate: {0}")]
    ParseX(#[source] ConvertError),

    #[error("Failed to parse y coordinate: {0}")]
    ParseY(#[source] ConvertError),
}

/// Reads `x = m, y = n` and leaves whatever follows `n`.
fn read_coordinates(bytes: &[u8]) -> Result<((Coord, Coord), &[u8]), RleCoordError> {
    let bytes = parse_util::expect(b'x', bytes)?;
    let bytes = parse_util::take_blank(bytes);
    let bytes = parse_util::expect(b'=', bytes)?;
    let bytes = parse_util::take_blank(bytes);

    let (x_bytes, bytes) = parse_util::take_with(b',', bytes);
    let x = parse_util::convert(x_bytes.trim_ascii()).map_err(RleCoordError::ParseX)?;

    let bytes = parse_util::take_blank(bytes);
    let bytes = parse_util::expect(b'y', bytes)?;
    let bytes = parse_util::take_blank(bytes);
    let bytes = parse_util::expect(b'=', bytes)?;
    let bytes = parse_util::take_blank(bytes);

    // Coordinates can be terminated with either `,` or the end of the line.
    let p = |b: u8| b == b',' || b.is_ascii_whitespace();
    let (y_bytes, bytes) = parse_util::take_until_fn(p, bytes);
    let y = parse_util::convert(y_bytes).map_err(RleCoordError::ParseY)?;

    Ok(((x, y), bytes))
}

/// Reads the `x y` pair of a `#P` or `#R` line.
fn read_offset(bytes: &[u8]) -> Result<(Coord, Coord), RleCoordError> {
    let bytes = parse_util::take_blank(bytes);
    let (x_bytes, bytes) = parse_util::take_until_ws(bytes);
    let x = parse_util::convert(x_bytes).map_err(RleCoordError::ParseX)?;

    let bytes = parse_util::take_blank(bytes);
    let (y_bytes, _) = parse_util::take_until_ws(bytes);
    let y = parse_util::convert(y_bytes).map_err(RleCoordError::ParseY)?;

    Ok((x, y))
}

#[cfg(test)]
mod test {
    use super::*;

    fn cells(bytes: &[u8]) -> Result<Vec<(Coord, Coord)>, RleError> {
        let mut cells = vec![];
        read_rle(bytes, |x, y| cells.push((x, y)))?;
        cells.sort();

        Ok(cells)
    }

    #[test]
    fn read_coordinates() {
        let ((x, y), rest) = super::read_coordinates(b"x = 1, y = 12, rule = B3/S23").unwrap();

        assert_eq!((x, y), (1, 12));
        assert_eq!(rest, b", rule = B3/S23");
    }

    #[test]
    fn read_offset() {
        assert_eq!(super::read_offset(b" -3 7").unwrap(), (-3, 7));
        assert!(super::read_offset(b" 3").is_err());
    }

    #[test]
    fn glider() {
        let bytes = b"#N Glider\n#O Richard K. Guy\nx = 3, y = 3, rule = B3/S23\nbob$2bo$3o!\n";

        let mut found = vec![];
        let file = read_rle(bytes, |x, y| found.push((x, y))).unwrap();

        assert_eq!(file.name, Some(b"Glider".as_slice()));
        assert_eq!(file.author, Some(b"Richard K. Guy".as_slice()));
        assert_eq!(file.size, Some((3, 3)));
        assert_eq!(file.offset, None);
        assert_eq!(found, vec![(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn runs_and_blank_lines() {
        let cells = cells(b"x = 5, y = 3\n2o3b$\n3$\n5o!").unwrap();

        assert_eq!(
            cells,
            vec![(0, 0), (0, 4), (1, 0), (1, 4), (2, 4), (3, 4), (4, 4)]
        );
    }

    #[test]
    fn offset_moves_the_pattern() {
        let cells = cells(b"#C a comment\r\n#P -1 -2\r\nx = 2, y = 1\r\n2o!").unwrap();

        assert_eq!(cells, vec![(-1, -2), (0, -2)]);
    }

    #[test]
    fn missing_header() {
        assert_eq!(cells(b"o$bo!").unwrap(), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn other_rules_are_refused() {
        let err = cells(b"x = 1, y = 1, rule = B36/S23\no!").unwrap_err();
        assert!(matches!(err, RleError::UnsupportedRule(_)));

        let err = cells(b"#r 23/36\nx = 1, y = 1\no!").unwrap_err();
        assert!(matches!(err, RleError::UnsupportedRule(_)));

        // The header has the last word
        assert!(cells(b"#r 23/36\nx = 1, y = 1, rule = b3/s23\no!").is_ok());
    }

    #[test]
    fn bad_input() {
        assert!(matches!(
            cells(b"x = 1, y = 1\n3o"),
            Err(RleError::Encoding(RleEncodingError::UnexpectedEof))
        ));
        assert!(matches!(
            cells(b"x = 1, y = 1\n3A!"),
            Err(RleError::Encoding(RleEncodingError::UnrecognizedByte { got: b'A' }))
        ));
        assert!(matches!(
            cells(b"#N\nx = 1, y = 1\no!"),
            Err(RleError::CommentLine(RleCommentLineError::EmptyName))
        ));
        assert!(matches!(
            cells(b"#Z\no!"),
            Err(RleError::CommentLine(RleCommentLineError::InvalidType { got: 'Z' }))
        ));
        assert!(cells(b"x = a, y = 1\no!").is_err());
    }

    #[test]
    fn huge_runs_overflow() {
        assert!(matches!(
            cells(b"9223372036854775807b2o!"),
            Err(RleError::Encoding(RleEncodingError::Overflow))
        ));
        assert!(matches!(
            cells(b"9223372036854775807$$o!"),
            Err(RleError::Encoding(RleEncodingError::Overflow))
        ));
        assert!(matches!(
            cells(b"#P 9223372036854775807 0\nbo!"),
            Err(RleError::Encoding(RleEncodingError::Overflow))
        ));
    }

    #[test]
    fn stopping_early() {
        let mut found = vec![];

        let err = read_rle_until(b"x = 3, y = 1\n99999999999o!", |x, y| {
            if x > 2 {
                return ControlFlow::Break(());
            }

            found.push((x, y));
            ControlFlow::Continue(())
        })
        .unwrap_err();

        assert!(matches!(
            err,
            RleError::Encoding(RleEncodingError::Stopped { x: 3, y: 0 })
        ));
        assert_eq!(found, vec![(0, 0), (1, 0), (2, 0)]);
    }
}
