use std::str::FromStr;

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unexpected end of file, expected '{exp}'")]
    UnexpectedEof { exp: char },

    #[error("Expected '{exp}', but got '{got}'")]
    UnexpectedToken { exp: char, got: char },

    #[error("Expected \"{exp}\", but got \"{got}\"")]
    UnexpectedSlice { exp: String, got: String },
}

/// Consumes the slice until a non-ascii whitespace character is reached.
pub fn take_ws(bytes: &[u8]) -> &[u8] {
    let i = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());

    &bytes[i..]
}

/// Like `take_ws` but never crosses a line break.
pub fn take_blank(bytes: &[u8]) -> &[u8] {
    let i = bytes
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(bytes.len());

    &bytes[i..]
}

/// Takes the rest of the current line, and consumes the line break. A trailing `\r` is not part
/// of the line.
pub fn take_line(bytes: &[u8]) -> (&[u8], &[u8]) {
    let (line, bytes) = take_until(b'\n', bytes);
    let (_, bytes) = take_1(bytes);

    let line = line.strip_suffix(b"\r").unwrap_or(line);

    (line, bytes)
}

/// Takes the next character from the slice. If none is found, the slice is left as-is.
pub const fn take_1(bytes: &[u8]) -> (Option<u8>, &[u8]) {
    let [b, bytes @ ..] = bytes else {
        return (None, bytes);
    };

    (Some(*b), bytes)
}

/// Like `take_1`, but doesn't consume the token
pub fn peek_1(bytes: &[u8]) -> Option<u8> {
    bytes.first().copied()
}

/// Expects the next character in `bytes` to be `b`.
pub fn expect(b: u8, bytes: &[u8]) -> ParseResult<&[u8]> {
    let (Some(a), bytes) = take_1(bytes) else {
        return Err(ParseError::UnexpectedEof { exp: b as char });
    };

    if a != b {
        return Err(ParseError::UnexpectedToken {
            exp: b as char,
            got: a as char,
        });
    }

    Ok(bytes)
}

/// Expects `bytes` to start with `bs`.
pub fn expect_slice<'a>(bs: &[u8], bytes: &'a [u8]) -> ParseResult<&'a [u8]> {
    if let Some(bytes) = bytes.strip_prefix(bs) {
        return Ok(bytes);
    }

    let n = bs.len().min(bytes.len());

    Err(ParseError::UnexpectedSlice {
        exp: String::from_utf8_lossy(bs).to_string(),
        got: String::from_utf8_lossy(&bytes[..n]).to_string(),
    })
}

/// Split the slice in front of the first byte satisfying `P`. If no byte does, everything is
/// taken.
#[inline]
pub fn take_until_fn<P>(p: P, bytes: &[u8]) -> (&[u8], &[u8])
where
    P: Fn(u8) -> bool,
{
    let i = bytes.iter().position(|&b| p(b)).unwrap_or(bytes.len());

    bytes.split_at(i)
}

/// Advance the slice until byte `b` is found, without consuming it.
pub fn take_until(b: u8, bytes: &[u8]) -> (&[u8], &[u8]) {
    take_until_fn(|a| a == b, bytes)
}

/// Like `take_until`, but stops at the first ascii whitespace character found, without consuming
/// it.
pub fn take_until_ws(bytes: &[u8]) -> (&[u8], &[u8]) {
    take_until_fn(|a| a.is_ascii_whitespace(), bytes)
}

/// Like `take_until`, but also consumes `b` without adding it to the output.
pub fn take_with(b: u8, bytes: &[u8]) -> (&[u8], &[u8]) {
    let (res, bytes) = take_until(b, bytes);
    let (_, bytes) = take_1(bytes);

    (res, bytes)
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Expected a number, found nothing")]
    Empty,

    #[error("Failed to convert \"{str}\"")]
    ParseError { str: String },
}

/// Converts `&[u8]` to `T` if `T: FromStr`.
pub fn convert<T: FromStr>(bytes: &[u8]) -> Result<T, ConvertError> {
    if bytes.is_empty() {
        return Err(ConvertError::Empty);
    }

    let str = String::from_utf8_lossy(bytes);

    str.parse::<T>().map_err(|_| ConvertError::ParseError {
        str: str.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_take_ws_full_ws() {
        let bytes = b"  ";

        let res = super::take_ws(bytes);

        assert_eq!(res, b"")
    }

    #[test]
    fn test_take_blank_stops_at_newline() {
        assert_eq!(super::take_blank(b" \t\nx"), b"\nx");
    }

    #[test]
    fn test_take_line() {
        let (line, rest) = super::take_line(b"#N Glider\r\nx = 3");

        assert_eq!(line, b"#N Glider");
        assert_eq!(rest, b"x = 3");

        let (line, rest) = super::take_line(b"no newline");

        assert_eq!(line, b"no newline");
        assert_eq!(rest, b"");
    }

    #[test]
    fn test_take_until_missing() {
        let (taken, rest) = super::take_until(b'/', b"23");

        assert_eq!(taken, b"23");
        assert_eq!(rest, b"");
    }

    #[test]
    fn test_expect() {
        assert_eq!(super::expect(b'x', b"x = 1").unwrap(), b" = 1");
        assert!(super::expect(b'y', b"x = 1").is_err());
        assert!(super::expect(b'y', b"").is_err());
        assert!(super::expect_slice(b"rule", b"rul").is_err());
    }

    #[test]
    fn test_convert() {
        assert_eq!(super::convert::<i64>(b"-12").unwrap(), -12);
        assert!(super::convert::<i64>(b"").is_err());
        assert!(super::convert::<u64>(b"1a").is_err());
    }
}
