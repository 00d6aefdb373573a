//! Text form of set expressions.
//!
//! ```text
//! expr   := leaf | "(" op [":" merge] (ws expr)+ ")"
//! op     := "U" | "I" | "D" | "X"
//! merge  := "First" | "Last" | "Append" | "ConCat" | "IntegerSum" | "FloatSum"
//! leaf   := part ("/" part)*
//! part   := (char | "\\x" hex hex)*
//! ```
//!
//! `(I:ConCat a/b (U c d))` intersects the children of `["a", "b"]` with the
//! union of the children of `["c"]` and `["d"]`. Any byte can be written as
//! `\xHH`; whitespace, parentheses, `/` and `\` inside a part must be.
//! `Display` escapes every byte outside printable ASCII, so its output parses
//! back to the same expression.

use std::fmt;
use std::str::FromStr;

use snafu::OptionExt;
use snafu::Snafu;

use super::MergePolicy;
use super::SetExpr;
use super::SetOp;
use super::SetOpKind;

/// Errors from parsing a set expression.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum ParseError {
    #[snafu(display("empty set expression"))]
    Empty,

    #[snafu(display("unexpected end of set expression"))]
    UnexpectedEnd,

    #[snafu(display("unexpected {ch:?} at offset {offset}"))]
    UnexpectedChar { ch: char, offset: usize },

    #[snafu(display("unknown set operator {name:?} at offset {offset}"))]
    UnknownOperator { name: String, offset: usize },

    #[snafu(display("unknown merge policy {name:?}"))]
    UnknownMerge { name: String },

    #[snafu(display("set operation at offset {offset} has no sources"))]
    MissingSources { offset: usize },

    #[snafu(display("trailing input at offset {offset}"))]
    TrailingInput { offset: usize },

    #[snafu(display("invalid escape at offset {offset}, expected \\xHH"))]
    InvalidEscape { offset: usize },
}

/// Whether `byte` is written as `\xHH` inside a leaf part.
fn needs_escape(byte: u8) -> bool {
    !byte.is_ascii_graphic() || matches!(byte, b'/' | b'(' | b')' | b'\\')
}

/// Decode the `\xHH` escapes of one leaf part starting at `offset`.
fn unescape(part: &str, offset: usize) -> Result<Vec<u8>, ParseError> {
    let bytes = part.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let byte = bytes
            .get(i + 1..i + 4)
            .and_then(|escape| escape.strip_prefix(b"x"))
            .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .context(InvalidEscapeSnafu { offset: offset + i })?;
        out.push(byte);
        i += 4;
    }
    Ok(out)
}

impl SetOpKind {
    fn symbol(self) -> char {
        match self {
            Self::Union => 'U',
            Self::Intersection => 'I',
            Self::Difference => 'D',
            Self::Xor => 'X',
        }
    }

    fn from_symbol(name: &str) -> Option<Self> {
        match name {
            "U" => Some(Self::Union),
            "I" => Some(Self::Intersection),
            "D" => Some(Self::Difference),
            "X" => Some(Self::Xor),
            _ => None,
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume a run of characters that are not whitespace, parentheses or
    /// any of `stops`.
    fn token(&mut self, stops: &[char]) -> &'a str {
        let input = self.input;
        let rest = &input[self.pos..];
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '(' || c == ')' || stops.contains(&c))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn expect(&mut self, want: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(ch) if ch == want => {
                self.pos += ch.len_utf8();
                Ok(())
            }
            Some(ch) => UnexpectedCharSnafu { ch, offset: self.pos }.fail(),
            None => UnexpectedEndSnafu.fail(),
        }
    }

    fn expr(&mut self) -> Result<SetExpr, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => UnexpectedEndSnafu.fail(),
            Some('(') => self.op(),
            Some(')') => UnexpectedCharSnafu { ch: ')', offset: self.pos }.fail(),
            Some(_) => {
                let mut offset = self.pos;
                let mut parts = Vec::new();
                for part in self.token(&[]).split('/') {
                    parts.push(unescape(part, offset)?);
                    offset += part.len() + 1;
                }
                Ok(SetExpr::Key(parts))
            }
        }
    }

    fn op(&mut self) -> Result<SetExpr, ParseError> {
        let start = self.pos;
        self.expect('(')?;

        let offset = self.pos;
        let name = self.token(&[':']);
        let kind = SetOpKind::from_symbol(name).ok_or_else(|| ParseError::UnknownOperator {
            name: name.to_string(),
            offset,
        })?;

        let merge = if self.peek() == Some(':') {
            self.pos += 1;
            self.token(&[]).parse()?
        } else {
            MergePolicy::default()
        };

        let mut sources = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                None => return UnexpectedEndSnafu.fail(),
                Some(_) => sources.push(self.expr()?),
            }
        }
        if sources.is_empty() {
            return MissingSourcesSnafu { offset: start }.fail();
        }

        Ok(SetExpr::Op(SetOp { kind, merge, sources }))
    }
}

impl FromStr for SetExpr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return EmptySnafu.fail();
        }
        let mut parser = Parser { input: s, pos: 0 };
        let expr = parser.expr()?;
        parser.skip_whitespace();
        if parser.pos < s.len() {
            return TrailingInputSnafu { offset: parser.pos }.fail();
        }
        Ok(expr)
    }
}

impl fmt::Display for SetExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("/")?;
                    }
                    for &byte in part {
                        if needs_escape(byte) {
                            write!(f, "\\x{byte:02x}")?;
                        } else {
                            write!(f, "{}", byte as char)?;
                        }
                    }
                }
                Ok(())
            }
            Self::Op(op) => {
                write!(f, "({}", op.kind.symbol())?;
                if op.merge != MergePolicy::default() {
                    write!(f, ":{}", op.merge)?;
                }
                for source in &op.sources {
                    write!(f, " {source}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(parts: &[&str]) -> SetExpr {
        SetExpr::Key(parts.iter().map(|part| part.as_bytes().to_vec()).collect())
    }

    #[test]
    fn test_parse_flat() {
        let expr: SetExpr = "(I:ConCat a b)".parse().unwrap();
        assert_eq!(
            expr,
            SetExpr::Op(SetOp {
                kind: SetOpKind::Intersection,
                merge: MergePolicy::ConCat,
                sources: vec![key(&["a"]), key(&["b"])],
            })
        );
    }

    #[test]
    fn test_parse_nested_with_paths() {
        let expr: SetExpr = " (U a/b  (D:First c d/e/f) )".parse().unwrap();
        assert_eq!(
            expr,
            SetExpr::Op(SetOp {
                kind: SetOpKind::Union,
                merge: MergePolicy::Append,
                sources: vec![
                    key(&["a", "b"]),
                    SetExpr::Op(SetOp {
                        kind: SetOpKind::Difference,
                        merge: MergePolicy::First,
                        sources: vec![key(&["c"]), key(&["d", "e", "f"])],
                    }),
                ],
            })
        );
    }

    #[test]
    fn test_bare_leaf() {
        assert_eq!("users/active".parse::<SetExpr>().unwrap(), key(&["users", "active"]));
    }

    #[test]
    fn test_display_round_trip() {
        for code in ["(I:ConCat a/b b/c b/d)", "(X a (U b c))", "(D:IntegerSum x y)", "a/b"] {
            let expr: SetExpr = code.parse().unwrap();
            assert_eq!(expr.to_string(), code);
        }
    }

    #[test]
    fn test_escaped_parts_round_trip() {
        let parts: Vec<Vec<u8>> = vec![
            b"a/b".to_vec(),
            b"two words".to_vec(),
            b"(x)".to_vec(),
            b"\x00\xff".to_vec(),
            b"back\\slash".to_vec(),
            "caf\u{e9}".as_bytes().to_vec(),
        ];
        let expr = SetExpr::Op(SetOp {
            kind: SetOpKind::Union,
            merge: MergePolicy::Append,
            sources: vec![SetExpr::Key(parts.clone()), key(&["plain"])],
        });

        let text = expr.to_string();
        assert_eq!(
            text,
            r"(U a\x2fb/two\x20words/\x28x\x29/\x00\xff/back\x5cslash/caf\xc3\xa9 plain)"
        );
        assert_eq!(text.parse::<SetExpr>().unwrap(), expr);
    }

    #[test]
    fn test_escapes_in_typed_input() {
        assert_eq!(r"x\x2Fy/z".parse::<SetExpr>().unwrap(), key(&["x/y", "z"]));
        assert_eq!("caf\u{e9}".parse::<SetExpr>().unwrap(), key(&["caf\u{e9}"]));
    }

    #[test]
    fn test_invalid_escapes() {
        assert_eq!(r"a\x4".parse::<SetExpr>(), Err(ParseError::InvalidEscape { offset: 1 }));
        assert_eq!(r"(U a/b\q c)".parse::<SetExpr>(), Err(ParseError::InvalidEscape { offset: 6 }));
        assert_eq!(r"ab\x+f".parse::<SetExpr>(), Err(ParseError::InvalidEscape { offset: 2 }));
        assert_eq!(r"\".parse::<SetExpr>(), Err(ParseError::InvalidEscape { offset: 0 }));
    }

    #[test]
    fn test_errors() {
        assert_eq!("".parse::<SetExpr>(), Err(ParseError::Empty));
        assert_eq!("(U a b".parse::<SetExpr>(), Err(ParseError::UnexpectedEnd));
        assert_eq!("(U)".parse::<SetExpr>(), Err(ParseError::MissingSources { offset: 0 }));
        assert_eq!("(U a) b".parse::<SetExpr>(), Err(ParseError::TrailingInput { offset: 6 }));
        assert_eq!(
            "(Q a)".parse::<SetExpr>(),
            Err(ParseError::UnknownOperator {
                name: "Q".to_string(),
                offset: 1
            })
        );
        assert_eq!(
            "(U:Sum a)".parse::<SetExpr>(),
            Err(ParseError::UnknownMerge { name: "Sum".to_string() })
        );
        assert_eq!(")".parse::<SetExpr>(), Err(ParseError::UnexpectedChar { ch: ')', offset: 0 }));
    }
}
