use std::io::Write;

use crate::constants::{COMMENT_PREFIX, EDGE_RECORD_FIELDS};
use crate::error::{EdgeError, Result};
use crate::graph::edge::Edge;

/// Parses one raw `<idA> <idB>` line into a canonical edge.
///
/// Any whitespace separates the two tokens. Fails with `Format` when the
/// line is not UTF-8 or does not hold exactly two tokens, and with
/// `SelfLoop` when both tokens name the same entity.
pub fn parse_edge_line(raw: &[u8], line_number: usize) -> Result<Edge> {
    let line = std::str::from_utf8(raw)
        .map_err(|_| EdgeError::format(line_number, "line is not valid UTF-8"))?;

    let mut tokens = line.split_whitespace();
    let (a, b) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(a), Some(b), None) => (a, b),
        _ => {
            let count = line.split_whitespace().count();
            return Err(EdgeError::format(
                line_number,
                format!("expected {} fields, found {}", EDGE_RECORD_FIELDS, count),
            ));
        }
    };

    Edge::from_tokens(a, b)
}

pub fn write_header<W: Write>(writer: &mut W, header: &str) -> std::io::Result<()> {
    writeln!(writer, "{}{}", COMMENT_PREFIX, header)
}

pub fn write_edge<W: Write>(writer: &mut W, edge: &Edge) -> std::io::Result<()> {
    writeln!(writer, "{}", edge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalizes() {
        let edge = parse_edge_line(b"20 3\n", 2).unwrap();
        assert_eq!(edge.to_string(), "3\t20");
    }

    #[test]
    fn test_parse_accepts_tabs_and_crlf() {
        let edge = parse_edge_line(b"5\t9\r\n", 2).unwrap();
        assert_eq!(edge.to_string(), "5\t9");
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        for raw in [&b"1\n"[..], b"1 2 3\n", b"\n", b"   \n"] {
            let err = parse_edge_line(raw, 7).unwrap_err();
            assert!(matches!(err, EdgeError::Format { line: 7, .. }), "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let err = parse_edge_line(&[0xff, b' ', b'1', b'\n'], 4).unwrap_err();
        assert!(matches!(err, EdgeError::Format { line: 4, .. }));
    }

    #[test]
    fn test_parse_rejects_self_loop() {
        assert!(matches!(parse_edge_line(b"8 8\n", 2), Err(EdgeError::SelfLoop { .. })));
    }

    #[test]
    fn test_write_format() {
        let mut out = Vec::new();
        write_header(&mut out, "doctorId\tdoctorId").unwrap();
        write_edge(&mut out, &Edge::from_tokens("2", "1").unwrap()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "# doctorId\tdoctorId\n1\t2\n");
    }
}
