//! Line-oriented lexer shared by template loading and form ingestion
//!
//! The format carries one `"key":value` attribute per physical line. The
//! lexer only understands what both directions need: keyword detection at
//! the start of a line, scalar values after the colon, brace nesting outside
//! quoted strings and the separator left after a closing brace.

use crate::error::ParseError;
use crate::intern::intern;
use std::ops::Range;
use std::sync::Arc;

/// Attribute values the lexer can read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Literal `null`
    Null,
    /// Quoted string, unescaped
    Text(String),
    /// Number, verbatim
    Number(String),
}

impl RawValue {
    /// Textual content, or `None` for `null`
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Text(s) | Self::Number(s) => Some(s),
        }
    }
}

/// Separator following a block that has a sibling after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `,` : the next block opens its own brace
    Comma,
    /// `,{` : the next block starts inside a brace opened here
    CommaBrace,
}

impl Separator {
    /// Text appended after a closing brace
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::CommaBrace => ",{",
        }
    }
}

/// Scalar read after a keyword, with its byte span in the line
#[derive(Debug, Clone)]
pub(crate) struct ScalarToken {
    pub(crate) value: RawValue,
    pub(crate) span: Range<usize>,
}

/// Result of scanning braces on one line
#[derive(Debug, Clone, Copy)]
pub(crate) struct Nesting {
    /// Level at end of line
    pub(crate) level: i32,
    /// Byte offset just after the brace that brought the level back to the
    /// block's base, if any
    pub(crate) closed_at: Option<usize>,
}

/// Text following a block's closing brace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockEnd {
    /// Separator announcing a sibling block
    pub(crate) separator: Option<Separator>,
    /// The enclosing `content` list ends on the same line
    pub(crate) closes_list: bool,
}

pub(crate) struct LineLexer<I> {
    lines: I,
    line: Arc<str>,
    number: usize,
    cursor: usize,
    max_length: usize,
    intern: bool,
}

impl<I, S> LineLexer<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    /// Lines are interned when `intern` is set (templates), kept private
    /// otherwise (submitted forms).
    pub(crate) fn new(lines: I, max_length: usize, intern: bool) -> Self {
        Self {
            lines,
            line: Arc::from(""),
            number: 0,
            cursor: 0,
            max_length,
            intern,
        }
    }

    pub(crate) fn next_line(&mut self) -> Result<(), ParseError> {
        if self.try_next_line()? {
            Ok(())
        } else {
            Err(ParseError::UnexpectedEnd { line: self.number })
        }
    }

    /// Advance, returning `false` at end of input
    pub(crate) fn try_next_line(&mut self) -> Result<bool, ParseError> {
        let Some(next) = self.lines.next() else {
            return Ok(false);
        };
        let text = next.as_ref();
        self.number += 1;
        if text.len() > self.max_length {
            return Err(ParseError::LineTooLong {
                line: self.number,
                length: text.len(),
                limit: self.max_length,
            });
        }
        self.line = if self.intern { intern(text) } else { Arc::from(text) };
        self.cursor = 0;
        Ok(true)
    }

    #[inline]
    pub(crate) fn line(&self) -> &Arc<str> {
        &self.line
    }

    #[inline]
    pub(crate) fn line_number(&self) -> usize {
        self.number
    }

    #[inline]
    pub(crate) fn is_blank(&self) -> bool {
        self.line.trim().is_empty()
    }

    /// True if the line starts by closing a list
    #[inline]
    pub(crate) fn at_list_end(&self) -> bool {
        self.line.trim_start().starts_with(']')
    }

    /// True if the first non-blank character is `{`
    #[inline]
    pub(crate) fn opens_block(&self) -> bool {
        self.line.trim_start().starts_with('{')
    }

    /// Text after the cursor
    #[inline]
    pub(crate) fn rest(&self) -> &str {
        &self.line[self.cursor..]
    }

    /// Consume `"keyword"` and its colon at the start of the line
    ///
    /// The cursor is left untouched when the line holds another attribute.
    pub(crate) fn match_keyword(&mut self, keyword: &str) -> bool {
        let line = &self.line[..];
        let start = line.len() - line.trim_start().len();
        let Some(after) = line[start..]
            .strip_prefix('"')
            .and_then(|s| s.strip_prefix(keyword))
            .and_then(|s| s.strip_prefix('"'))
        else {
            return false;
        };
        let Some(after_colon) = after.trim_start().strip_prefix(':') else {
            return false;
        };
        self.cursor = line.len() - after_colon.len();
        true
    }

    /// Read `null`, a quoted string or a number after the colon
    ///
    /// Only blanks and a single trailing comma may follow the value.
    pub(crate) fn read_scalar(&mut self) -> Result<ScalarToken, ParseError> {
        let line = Arc::clone(&self.line);
        let bytes = line.as_bytes();
        let mut pos = self.cursor;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let start = pos;
        let value = match bytes.get(pos) {
            Some(b'"') => {
                let (text, end) = self.read_string(&line, pos)?;
                pos = end;
                RawValue::Text(text)
            }
            Some(b'n') if line[pos..].starts_with("null") => {
                pos += 4;
                if bytes.get(pos).is_some_and(u8::is_ascii_alphanumeric) {
                    return Err(self.syntax_error("expected null, a string or a number"));
                }
                RawValue::Null
            }
            Some(b'-' | b'0'..=b'9') => {
                let end = number_end(bytes, pos).ok_or_else(|| self.syntax_error("malformed number"))?;
                let number = line[pos..end].to_string();
                pos = end;
                RawValue::Number(number)
            }
            _ => return Err(self.syntax_error("expected null, a string or a number")),
        };
        let end = pos;
        let tail = line[pos..].trim();
        if !(tail.is_empty() || tail == ",") {
            return Err(self.syntax_error("unexpected content after value"));
        }
        self.cursor = end;
        Ok(ScalarToken { value, span: start..end })
    }

    fn read_string(&self, line: &str, open: usize) -> Result<(String, usize), ParseError> {
        let mut out = String::new();
        let mut chars = line[open + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Ok((out, open + 1 + i + 1)),
                '\\' => {
                    let Some((_, escaped)) = chars.next() else { break };
                    match escaped {
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '/' => out.push('/'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'u' => {
                            let high = self.read_hex4(&mut chars)?;
                            let code = if (0xD800..0xDC00).contains(&high) {
                                let low = match (chars.next(), chars.next()) {
                                    (Some((_, '\\')), Some((_, 'u'))) => self.read_hex4(&mut chars)?,
                                    _ => return Err(self.syntax_error("unpaired surrogate in string")),
                                };
                                0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF)
                            } else {
                                high
                            };
                            let c = char::from_u32(code).ok_or_else(|| self.syntax_error("invalid unicode escape"))?;
                            out.push(c);
                        }
                        _ => return Err(self.syntax_error("invalid escape sequence")),
                    }
                }
                c => out.push(c),
            }
        }
        Err(self.syntax_error("unterminated string"))
    }

    fn read_hex4(&self, chars: &mut std::str::CharIndices<'_>) -> Result<u32, ParseError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| self.syntax_error("invalid unicode escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// Track `{`/`}` outside quoted strings across the whole line
    ///
    /// `base` is the level at which the enclosing block closes. Closing below
    /// it means the braces do not balance.
    pub(crate) fn scan_nesting(&self, mut level: i32, base: i32) -> Result<Nesting, ParseError> {
        let mut closed_at = None;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in self.line.char_indices() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => level += 1,
                '}' => {
                    level -= 1;
                    if level < base || (level == base && closed_at.is_some()) {
                        return Err(self.syntax_error("unbalanced closing brace"));
                    }
                    if level == base {
                        closed_at = Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        Ok(Nesting { level, closed_at })
    }

    /// What follows a block's closing brace at byte offset `pos`
    ///
    /// Blanks aside, only `,` or `,{` (a sibling follows) or `]` and `],`
    /// (the enclosing list ends on this line) are accepted.
    pub(crate) fn block_end(&self, pos: usize) -> Result<BlockEnd, ParseError> {
        let (separator, closes_list) = match self.line[pos..].trim() {
            "" => (None, false),
            "," => (Some(Separator::Comma), false),
            ",{" => (Some(Separator::CommaBrace), false),
            "]" | "]," => (None, true),
            _ => return Err(self.syntax_error("unexpected content after block end")),
        };
        Ok(BlockEnd { separator, closes_list })
    }

    pub(crate) fn syntax_error(&self, message: &str) -> ParseError {
        ParseError::syntax(self.number, message, self.line.trim())
    }
}

/// End offset of a JSON number starting at `start`
fn number_end(bytes: &[u8], start: usize) -> Option<usize> {
    let digits = |mut pos: usize| {
        let begin = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        (pos > begin).then_some(pos)
    };
    let mut pos = start;
    if bytes.get(pos) == Some(&b'-') {
        pos += 1;
    }
    pos = digits(pos)?;
    if bytes.get(pos) == Some(&b'.') {
        pos = digits(pos + 1)?;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        pos = digits(pos)?;
    }
    Some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(lines: &[&'static str]) -> LineLexer<std::vec::IntoIter<&'static str>> {
        let mut lexer = LineLexer::new(lines.to_vec().into_iter(), 200, false);
        lexer.next_line().unwrap();
        lexer
    }

    fn scalar(line: &'static str) -> Result<RawValue, ParseError> {
        let mut lexer = lex(&[line]);
        assert!(lexer.match_keyword("value"));
        lexer.read_scalar().map(|t| t.value)
    }

    #[test]
    fn next_line_reports_end_of_input() {
        let mut lexer = lex(&["{"]);
        assert!(matches!(lexer.next_line(), Err(ParseError::UnexpectedEnd { line: 1 })));
    }

    #[test]
    fn line_too_long_is_rejected() {
        let long: &'static str = Box::leak("x".repeat(201).into_boxed_str());
        let mut lexer = LineLexer::new(vec![long].into_iter(), 200, false);
        assert!(matches!(lexer.next_line(), Err(ParseError::LineTooLong { length: 201, .. })));
    }

    #[test]
    fn match_keyword_requires_exact_key() {
        let mut lexer = lex(&["    \"pathology\": 3"]);
        assert!(!lexer.match_keyword("path"));
        let mut lexer = lex(&["    \"path\" : \"a.b\","]);
        assert!(lexer.match_keyword("path"));
        assert_eq!(lexer.rest(), " \"a.b\",");
    }

    #[test]
    fn read_scalar_forms() {
        assert_eq!(scalar("\"value\":null").unwrap(), RawValue::Null);
        assert_eq!(scalar("\"value\": \"a\\\"b\\tc\"").unwrap(), RawValue::Text("a\"b\tc".into()));
        assert_eq!(scalar("\"value\":-12.5e3,").unwrap(), RawValue::Number("-12.5e3".into()));
        assert_eq!(scalar("\"value\":\"\\u00e9\\ud83d\\ude00\"").unwrap(), RawValue::Text("é😀".into()));
    }

    #[test]
    fn read_scalar_rejects_other_forms() {
        for line in ["\"value\":true", "\"value\":nullx", "\"value\":\"open", "\"value\":1.", "\"value\":null}", "\"value\":\"a\" \"b\""] {
            assert!(matches!(scalar(line), Err(ParseError::Syntax { .. })), "{line}");
        }
    }

    #[test]
    fn read_scalar_span_covers_token() {
        let mut lexer = lex(&["  \"value\":null"]);
        assert!(lexer.match_keyword("value"));
        let token = lexer.read_scalar().unwrap();
        assert_eq!(&lexer.line()[..token.span.start], "  \"value\":");
    }

    #[test]
    fn scan_nesting_ignores_quoted_braces() {
        let lexer = lex(&["\"help\":\"use { and } freely\", \"x\":{"]);
        let nesting = lexer.scan_nesting(3, 2).unwrap();
        assert_eq!(nesting.level, 4);
        assert_eq!(nesting.closed_at, None);
    }

    #[test]
    fn scan_nesting_finds_close_before_reopen() {
        let lexer = lex(&["    },{"]);
        let nesting = lexer.scan_nesting(3, 2).unwrap();
        assert_eq!(nesting.level, 3);
        assert_eq!(nesting.closed_at, Some(5));
        assert_eq!(lexer.block_end(5).unwrap().separator, Some(Separator::CommaBrace));
    }

    #[test]
    fn scan_nesting_rejects_underflow() {
        let lexer = lex(&["}}"]);
        assert!(lexer.scan_nesting(1, 0).is_err());
    }

    #[test]
    fn text_after_block_end() {
        let lexer = lex(&["  },  "]);
        let end = lexer.block_end(3).unwrap();
        assert_eq!(end.separator, Some(Separator::Comma));
        assert!(!end.closes_list);

        for line in ["  }]", "  } ],"] {
            let end = lex(&[line]).block_end(3).unwrap();
            assert_eq!(end.separator, None, "{line}");
            assert!(end.closes_list, "{line}");
        }

        for line in ["  }],{", "  }]}", "  }x"] {
            assert!(lex(&[line]).block_end(3).is_err(), "{line}");
        }
    }

    #[test]
    fn interned_lines_are_shared() {
        let mut a = LineLexer::new(vec!["        \"render\":\"readonly\","].into_iter(), 200, true);
        let mut b = LineLexer::new(vec!["        \"render\":\"readonly\","].into_iter(), 200, true);
        a.next_line().unwrap();
        b.next_line().unwrap();
        assert!(Arc::ptr_eq(a.line(), b.line()));
    }
}
