//! Numeroted paths for addressing property occurrences
//!
//! Provides [`NumerotedPath`], a dotted property path where every segment
//! carries an occurrence index.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter, Write};
use std::str::FromStr;
use std::sync::Arc;

/// Dotted property path with one occurrence index per segment
///
/// Index `0` marks a non-repeatable (singleton) occurrence; repeated
/// occurrences are numbered from `1`.
///
/// # Ordering
/// Segments are compared pairwise: identifier first, then index. The first
/// difference decides, and a shorter path sorts before its extensions. As a
/// consequence a sorted collection lists every parent before its children and
/// keeps the entries of one parent occurrence contiguous.
///
/// # Examples
/// - `["contact", "name"]`, `[2, 0]` → `contact[2].name`
/// - `["keyword"]`, `[0]` → `keyword`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumerotedPath {
    segments: Vec<Arc<str>>,
    indices: Vec<u32>,
}

impl NumerotedPath {
    /// Create path from parallel segments and indices
    ///
    /// # Errors
    /// Returns error if the two sequences differ in length
    pub fn new(segments: Vec<Arc<str>>, indices: Vec<u32>) -> Result<Self, PathError> {
        if segments.len() != indices.len() {
            return Err(PathError::LengthMismatch {
                segments: segments.len(),
                indices: indices.len(),
            });
        }
        Ok(Self { segments, indices })
    }

    /// Create path where every segment is a singleton occurrence
    #[must_use]
    pub fn singleton(segments: Vec<Arc<str>>) -> Self {
        let indices = vec![0; segments.len()];
        Self { segments, indices }
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Parse `a[1].b` notation, building segment strings through `intern`
    ///
    /// # Errors
    /// Returns error on empty segments, invalid characters or a malformed
    /// `[n]` suffix
    pub fn parse_with<F>(s: &str, mut intern: F) -> Result<Self, PathError>
    where
        F: FnMut(&str) -> Arc<str>,
    {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        let mut indices = Vec::new();
        for raw in s.split('.') {
            let (name, index) = split_index(raw)?;
            if name.is_empty() {
                return Err(PathError::EmptySegment);
            }
            if name.contains(|c: char| !c.is_alphanumeric() && c != '_') {
                return Err(PathError::InvalidSegment(name.to_string()));
            }
            segments.push(intern(name));
            indices.push(index);
        }
        Ok(Self { segments, indices })
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Arc<str>] {
        &self.segments
    }

    /// Get occurrence indices, parallel to [`Self::segments`]
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Segment at `depth`
    #[inline]
    #[must_use]
    pub fn segment(&self, depth: usize) -> &Arc<str> {
        &self.segments[depth]
    }

    /// Occurrence index at `depth`
    #[inline]
    #[must_use]
    pub fn index(&self, depth: usize) -> u32 {
        self.indices[depth]
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last occurrence index, or `0` for the root
    #[inline]
    #[must_use]
    pub fn last_index(&self) -> u32 {
        self.indices.last().copied().unwrap_or(0)
    }

    /// First `len` segments with their indices
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.len());
        Self {
            segments: self.segments[..len].to_vec(),
            indices: self.indices[..len].to_vec(),
        }
    }

    /// Append a segment, returning new path
    #[must_use]
    pub fn child(&self, segment: Arc<str>, index: u32) -> Self {
        let mut new = self.clone();
        new.segments.push(segment);
        new.indices.push(index);
        new
    }

    /// Copy of this path with a repeated leaf index folded to `1`
    ///
    /// Every value submitted for one repeatable leaf shares the same key this
    /// way, whatever index the client attached to it.
    #[must_use]
    pub fn normalized_leaf(&self) -> Self {
        let mut new = self.clone();
        if let Some(last) = new.indices.last_mut() {
            if *last != 0 {
                *last = 1;
            }
        }
        new
    }

    /// Check if this path is a prefix of another, indices included
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.len() <= other.len()
            && self.segments[..] == other.segments[..self.len()]
            && self.indices[..] == other.indices[..self.len()]
    }

    /// Check if `other`'s identifiers strictly extend this path's identifiers
    ///
    /// Indices are not compared.
    #[inline]
    #[must_use]
    pub fn is_extended_by(&self, other: &Self) -> bool {
        self.len() < other.len() && self.segments[..] == other.segments[..self.len()]
    }

    /// Dotted form of the first `len` segments, with their indices
    #[must_use]
    pub fn truncated(&self, len: usize) -> String {
        self.prefix(len).to_string()
    }

    /// Dotted form without any index suffix
    #[must_use]
    pub fn identifiers(&self) -> String {
        self.segments.join(".")
    }
}

/// Write `segments` with the matching `indices` as `a[1].b`
///
/// Index `0` is written as a bare segment.
///
/// # Errors
/// Propagates errors of the underlying writer
pub fn write_segments<W: Write>(out: &mut W, segments: &[Arc<str>], indices: &[u32]) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        if i != 0 {
            out.write_char('.')?;
        }
        out.write_str(segment)?;
        match indices.get(i) {
            Some(&index) if index != 0 => write!(out, "[{index}]")?,
            _ => {}
        }
    }
    Ok(())
}

fn split_index(raw: &str) -> Result<(&str, u32), PathError> {
    let Some(open) = raw.find('[') else {
        if raw.contains(']') {
            return Err(PathError::MalformedIndex(raw.to_string()));
        }
        return Ok((raw, 0));
    };
    let digits = raw[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| PathError::MalformedIndex(raw.to_string()))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::MalformedIndex(raw.to_string()));
    }
    let index = digits
        .parse()
        .map_err(|_| PathError::MalformedIndex(raw.to_string()))?;
    Ok((&raw[..open], index))
}

impl Ord for NumerotedPath {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in 0..self.len().min(other.len()) {
            let order = self.segments[i]
                .cmp(&other.segments[i])
                .then(self.indices[i].cmp(&other.indices[i]));
            if order != Ordering::Equal {
                return order;
            }
        }
        self.len().cmp(&other.len())
    }
}

impl PartialOrd for NumerotedPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for NumerotedPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_segments(f, &self.segments, &self.indices)
    }
}

impl FromStr for NumerotedPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with(s, |segment: &str| Arc::from(segment))
    }
}

impl Default for NumerotedPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to numeroted paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric or underscore)")]
    InvalidSegment(String),

    /// Occurrence suffix is not `[digits]`
    #[error("malformed occurrence index in segment: {0}")]
    MalformedIndex(String),

    /// Segments and indices differ in length
    #[error("{segments} segments but {indices} indices")]
    LengthMismatch { segments: usize, indices: usize },
}
