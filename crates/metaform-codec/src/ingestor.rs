//! Submitted form ingestion
//!
//! Reads a filled-in form back into a sorted map from numeroted path to the
//! submitted value(s). The form has the same shape as a written one: blocks,
//! `path` attributes carrying occurrence indices, and `value` attributes.
//! Every other attribute is ignored.

use crate::config::CodecOptions;
use crate::error::ParseError;
use crate::lexer::{BlockEnd, LineLexer, RawValue};
use crate::template::{CONTENT, PATH, VALUE};
use metaform_model::NumerotedPath;
use std::collections::btree_map::{self, BTreeMap};

/// Value(s) submitted for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    /// Path submitted once, without a leaf index
    One(RawValue),
    /// Values of a repeatable leaf, in submission order
    Many(Vec<RawValue>),
}

impl Submitted {
    /// All submitted values
    #[must_use]
    pub fn values(&self) -> &[RawValue] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

/// Parsed form, sorted by path
///
/// Sorting keeps every entry below one occurrence of a block contiguous,
/// which lets the update walk the map in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    entries: BTreeMap<NumerotedPath, Submitted>,
}

impl Submission {
    /// Parse a submitted form
    ///
    /// # Errors
    /// Returns `ParseError` for malformed text, a value without a path, a
    /// path that does not extend its block's path, or a second value for a
    /// non-repeatable path
    pub fn parse<I, S>(lines: I, options: &CodecOptions) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexer = LineLexer::new(lines.into_iter(), options.max_line_length, false);
        loop {
            lexer.next_line()?;
            if !lexer.is_blank() {
                break;
            }
        }
        if !lexer.opens_block() {
            return Err(lexer.syntax_error("form must start with '{'"));
        }
        let mut ingestor = Ingestor {
            lexer,
            level: 0,
            entries: BTreeMap::new(),
        };
        let end = ingestor.node(None)?;
        if end.separator.is_some() || end.closes_list {
            return Err(ingestor.lexer.syntax_error("unexpected separator after the root block"));
        }
        while ingestor.lexer.try_next_line()? {
            if !ingestor.lexer.is_blank() {
                return Err(ingestor.lexer.syntax_error("content after the end of the form"));
            }
        }
        Ok(Self {
            entries: ingestor.entries,
        })
    }

    /// Value(s) submitted for `path`
    #[must_use]
    pub fn get(&self, path: &NumerotedPath) -> Option<&Submitted> {
        self.entries.get(path)
    }

    /// Number of distinct paths
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&NumerotedPath, &Submitted)> {
        self.entries.iter()
    }
}

struct Ingestor<I> {
    lexer: LineLexer<I>,
    level: i32,
    entries: BTreeMap<NumerotedPath, Submitted>,
}

impl<I, S> Ingestor<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    /// Read one block and return what follows its closing brace
    fn node(&mut self, parent: Option<&NumerotedPath>) -> Result<BlockEnd, ParseError> {
        let base = if self.lexer.opens_block() { self.level } else { self.level - 1 };
        let mut own: Option<NumerotedPath> = None;
        loop {
            let mut list = false;
            if self.lexer.match_keyword(PATH) {
                if let RawValue::Text(text) = self.lexer.read_scalar()?.value {
                    if own.is_some() {
                        return Err(self.lexer.syntax_error("duplicate path attribute"));
                    }
                    let path: NumerotedPath = text.parse().map_err(|source| ParseError::InvalidPath {
                        line: self.lexer.line_number(),
                        path: text.clone(),
                        source,
                    })?;
                    if let Some(parent) = parent {
                        if !parent.is_extended_by(&path) {
                            return Err(ParseError::PathNotNested {
                                line: self.lexer.line_number(),
                                path: path.to_string(),
                                parent: parent.to_string(),
                            });
                        }
                    }
                    own = Some(path);
                }
            } else if self.lexer.match_keyword(VALUE) {
                let value = self.lexer.read_scalar()?.value;
                let line = self.lexer.line_number();
                let path = own.as_ref().ok_or(ParseError::MissingPath { line })?;
                self.submit(path, value, line)?;
            } else if self.lexer.match_keyword(CONTENT) {
                list = match self.lexer.rest().trim() {
                    "[" | "[{" => true,
                    "[]" | "[]," => false,
                    _ => return Err(self.lexer.syntax_error("expected '[' after content")),
                };
            }

            let nesting = self.lexer.scan_nesting(self.level, base)?;
            self.level = nesting.level;
            if let Some(pos) = nesting.closed_at {
                if list {
                    return Err(self.lexer.syntax_error("block closes before its content list"));
                }
                return self.lexer.block_end(pos);
            }
            if list {
                let scope = own.as_ref().or(parent);
                loop {
                    self.lexer.next_line()?;
                    if self.lexer.is_blank() {
                        continue;
                    }
                    if self.lexer.at_list_end() {
                        break;
                    }
                    if self.node(scope)?.separator.is_none() {
                        break;
                    }
                }
                // An empty list leaves its `]` line current.
                if self.lexer.at_list_end() {
                    continue;
                }
            }
            self.lexer.next_line()?;
        }
    }

    fn submit(&mut self, path: &NumerotedPath, value: RawValue, line: usize) -> Result<(), ParseError> {
        let duplicate = || ParseError::DuplicatePath {
            line,
            path: path.to_string(),
        };
        if path.last_index() != 0 {
            // Folded keys end in index 1 and single keys in 0, so they never share an entry.
            let entry = self
                .entries
                .entry(path.normalized_leaf())
                .or_insert_with(|| Submitted::Many(Vec::new()));
            if let Submitted::Many(values) = entry {
                values.push(value);
            }
        } else {
            match self.entries.entry(path.clone()) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(Submitted::One(value));
                }
                btree_map::Entry::Occupied(_) => return Err(duplicate()),
            }
        }
        Ok(())
    }
}
