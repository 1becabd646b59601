//! Template tree
//!
//! A [`Template`] is loaded once from template text and is read-only
//! afterwards. Each [`TemplateNode`] is a brace-delimited block of lines: a
//! *field* carries exactly one value slot (`"value":null`), a *container*
//! holds child blocks under a `"content":[` list. Any attribute the codec does
//! not know is kept as a literal line and re-emitted unchanged.
//!
//! Two block layouts are accepted for children:
//!
//! ```text
//! "content":[          "content":[{
//!     {                    "field":{
//!         ...                  ...
//!     },                   }
//!     {                },{
//! ```
//!
//! On the left every block opens its own brace and repeated occurrences are
//! separated by `,`. On the right the brace is opened by the line before the
//! block, so occurrences are separated by `,{`. Either list may close on its
//! last block's line (`}]`).

use crate::config::CodecOptions;
use crate::error::ParseError;
use crate::format::default_scalar;
use crate::intern::intern;
use crate::lexer::{LineLexer, RawValue, Separator};
use metaform_model::{NumerotedPath, Scalar};
use std::str::FromStr;
use std::sync::Arc;

/// Attribute naming the property path of a block
pub const PATH: &str = "path";
/// Attribute holding the value used when no data is found
pub const DEFAULT_VALUE: &str = "defaultValue";
/// Attribute marking the value slot of a field
pub const VALUE: &str = "value";
/// Attribute bounding the number of occurrences of a block
pub const MULTIPLICITY: &str = "multiplicity";
/// Attribute introducing the list of child blocks
pub const CONTENT: &str = "content";
/// Presentation hint, also used to pick the date rendering
pub const RENDER: &str = "render";

/// One line (or child block) of a template node
#[derive(Debug)]
pub(crate) enum Element {
    /// Copied verbatim
    Line(Arc<str>),
    /// `path` attribute, rewritten with occurrence indices
    Path { prefix: Arc<str>, suffix: Arc<str> },
    /// Value slot: the line up to where `null` stood
    Value { prefix: Arc<str> },
    /// `"content":[{` line, whose brace belongs to the first child occurrence
    BraceListOpen(Arc<str>),
    /// Text after the last child's closing brace that ends the list (`]`),
    /// kept on that child's line
    Tail(Arc<str>),
    /// Child block
    Node(TemplateNode),
}

/// Immutable block of a template
#[derive(Debug)]
pub struct TemplateNode {
    content: Vec<Element>,
    path: Option<Vec<Arc<str>>>,
    default_value: Option<Scalar>,
    max_occurs: usize,
    is_field: bool,
    render: Option<Arc<str>>,
    separator: Separator,
    trailing: Option<Separator>,
    line: usize,
}

impl TemplateNode {
    /// Declared property path, if any
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&[Arc<str>]> {
        self.path.as_deref()
    }

    /// True if the block carries a value slot
    #[inline]
    #[must_use]
    pub fn is_field(&self) -> bool {
        self.is_field
    }

    /// Value emitted when no data is found and pruning is disabled
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> Option<&Scalar> {
        self.default_value.as_ref()
    }

    /// Maximum number of occurrences per parent occurrence
    ///
    /// `usize::MAX` when the template sets no multiplicity.
    #[inline]
    #[must_use]
    pub fn max_occurs(&self) -> usize {
        self.max_occurs
    }

    /// `render` attribute, if any
    #[inline]
    #[must_use]
    pub fn render(&self) -> Option<&str> {
        self.render.as_deref()
    }

    /// Separator inserted between repeated occurrences of this block
    #[inline]
    #[must_use]
    pub fn separator(&self) -> Separator {
        self.separator
    }

    /// True if the template had a sibling after this block
    #[inline]
    #[must_use]
    pub fn has_trailing_separator(&self) -> bool {
        self.trailing.is_some()
    }

    /// Line number where the block starts
    #[inline]
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Child blocks in template order
    pub fn children(&self) -> impl Iterator<Item = &TemplateNode> {
        self.content.iter().filter_map(|e| match e {
            Element::Node(child) => Some(child),
            _ => None,
        })
    }

    #[inline]
    pub(crate) fn content(&self) -> &[Element] {
        &self.content
    }

    fn new(line: usize, separator: Separator) -> Self {
        Self {
            content: Vec::new(),
            path: None,
            default_value: None,
            max_occurs: usize::MAX,
            is_field: false,
            render: None,
            separator,
            trailing: None,
            line,
        }
    }
}

/// Node counts of a loaded template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateStats {
    /// All blocks, root included
    pub nodes: usize,
    /// Blocks with a value slot
    pub fields: usize,
    /// Blocks with a path
    pub paths: usize,
}

/// Reusable form template
///
/// Safe to share between threads: no operation mutates it after loading.
#[derive(Debug)]
pub struct Template {
    root: TemplateNode,
    options: CodecOptions,
    stats: TemplateStats,
}

impl Template {
    /// Build a template from its lines
    ///
    /// # Errors
    /// Returns `ParseError` if the text does not follow the template format
    /// or a path does not extend its parent block's path
    pub fn parse<I, S>(lines: I, options: CodecOptions) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexer = LineLexer::new(lines.into_iter(), options.max_line_length, true);
        loop {
            lexer.next_line()?;
            if !lexer.is_blank() {
                break;
            }
        }
        if !lexer.opens_block() {
            return Err(lexer.syntax_error("template must start with '{'"));
        }
        let mut builder = Builder {
            lexer,
            level: 0,
            list_closed: None,
        };
        let root = builder.node()?;
        if root.trailing.is_some() || builder.list_closed.is_some() {
            return Err(builder.lexer.syntax_error("unexpected separator after the root block"));
        }
        while builder.lexer.try_next_line()? {
            if !builder.lexer.is_blank() {
                return Err(builder.lexer.syntax_error("content after the end of the template"));
            }
        }

        // Checked once the tree is complete rather than line by line.
        validate_paths(&root, None)?;

        let mut stats = TemplateStats::default();
        collect_stats(&root, &mut stats);
        tracing::debug!(
            nodes = stats.nodes,
            fields = stats.fields,
            paths = stats.paths,
            "template loaded"
        );
        Ok(Self { root, options, stats })
    }

    /// Root block
    #[inline]
    #[must_use]
    pub fn root(&self) -> &TemplateNode {
        &self.root
    }

    /// Options the template was loaded with
    #[inline]
    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Node counts
    #[inline]
    #[must_use]
    pub fn stats(&self) -> TemplateStats {
        self.stats
    }
}

impl FromStr for Template {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.lines(), CodecOptions::default())
    }
}

#[derive(PartialEq, Eq)]
enum List {
    None,
    Open,
    /// Opened by `[{`
    Braced,
}

struct Builder<I> {
    lexer: LineLexer<I>,
    level: i32,
    /// Set when the block just read also closed its parent's list
    list_closed: Option<Arc<str>>,
}

impl<I, S> Builder<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    /// Read one block; the lexer is on its first line
    fn node(&mut self) -> Result<TemplateNode, ParseError> {
        let opens = self.lexer.opens_block();
        let base = if opens { self.level } else { self.level - 1 };
        let separator = if opens { Separator::Comma } else { Separator::CommaBrace };
        let mut node = TemplateNode::new(self.lexer.line_number(), separator);
        let mut has_content = false;
        loop {
            let line = Arc::clone(self.lexer.line());
            let mut list = List::None;
            if self.lexer.match_keyword(PATH) {
                let token = self.lexer.read_scalar()?;
                match token.value {
                    RawValue::Null => node.content.push(Element::Line(line)),
                    RawValue::Text(text) => {
                        if node.path.is_some() {
                            return Err(self.lexer.syntax_error("duplicate path attribute"));
                        }
                        node.path = Some(self.template_path(&text)?);
                        node.content.push(Element::Path {
                            prefix: intern(&line[..token.span.start]),
                            suffix: intern(&line[token.span.end..]),
                        });
                    }
                    RawValue::Number(_) => return Err(self.lexer.syntax_error("path must be a string or null")),
                }
            } else if self.lexer.match_keyword(DEFAULT_VALUE) {
                node.default_value = default_scalar(self.lexer.read_scalar()?.value);
                node.content.push(Element::Line(line));
            } else if self.lexer.match_keyword(MULTIPLICITY) {
                let token = self.lexer.read_scalar()?;
                node.max_occurs = match &token.value {
                    RawValue::Number(n) => n.parse().ok().filter(|&n: &usize| n > 0),
                    _ => None,
                }
                .ok_or_else(|| ParseError::InvalidMultiplicity {
                    line: self.lexer.line_number(),
                    found: token.value.as_text().unwrap_or("null").to_string(),
                })?;
                node.content.push(Element::Line(line));
            } else if self.lexer.match_keyword(RENDER) {
                if let RawValue::Text(render) = self.lexer.read_scalar()?.value {
                    node.render = Some(intern(&render));
                }
                node.content.push(Element::Line(line));
            } else if self.lexer.match_keyword(VALUE) {
                let token = self.lexer.read_scalar()?;
                if token.value != RawValue::Null {
                    return Err(self.lexer.syntax_error("template value must be null"));
                }
                if !line[token.span.end..].trim().is_empty() {
                    return Err(self.lexer.syntax_error("value must be the last attribute of a field"));
                }
                if node.is_field {
                    return Err(self.lexer.syntax_error("duplicate value attribute"));
                }
                node.is_field = true;
                node.content.push(Element::Value {
                    prefix: intern(&line[..token.span.start]),
                });
            } else if self.lexer.match_keyword(CONTENT) {
                if has_content {
                    return Err(self.lexer.syntax_error("duplicate content attribute"));
                }
                list = match self.lexer.rest().trim() {
                    "[" => List::Open,
                    "[{" => List::Braced,
                    "[]" | "[]," => List::None,
                    _ => return Err(self.lexer.syntax_error("expected '[' after content")),
                };
                has_content = true;
                node.content.push(if list == List::Braced {
                    Element::BraceListOpen(line)
                } else {
                    Element::Line(line)
                });
            } else {
                node.content.push(Element::Line(line));
            }

            let nesting = self.lexer.scan_nesting(self.level, base)?;
            self.level = nesting.level;
            if let Some(pos) = nesting.closed_at {
                if list != List::None {
                    return Err(self.lexer.syntax_error("block closes before its content list"));
                }
                let end = self.lexer.block_end(pos)?;
                node.trailing = end.separator;
                match node.content.last_mut() {
                    Some(Element::Line(text)) => {
                        if end.closes_list {
                            self.list_closed = Some(intern(&text[pos..]));
                        }
                        *text = intern(&text[..pos]);
                    }
                    _ => return Err(self.lexer.syntax_error("block must close on its own line")),
                }
                break;
            }
            if list != List::None {
                self.children(&mut node)?;
                if self.lexer.at_list_end() {
                    continue;
                }
            }
            self.lexer.next_line()?;
        }
        if node.is_field && has_content {
            return Err(ParseError::FieldWithContent { line: node.line });
        }
        if node.is_field && node.path.is_none() {
            return Err(ParseError::FieldWithoutPath { line: node.line });
        }
        Ok(node)
    }

    /// Read child blocks until one has no trailing separator
    fn children(&mut self, node: &mut TemplateNode) -> Result<(), ParseError> {
        loop {
            self.lexer.next_line()?;
            if self.lexer.is_blank() {
                continue;
            }
            if self.lexer.at_list_end() {
                return Ok(());
            }
            let child = self.node()?;
            let more = child.trailing.is_some();
            node.content.push(Element::Node(child));
            if let Some(tail) = self.list_closed.take() {
                node.content.push(Element::Tail(tail));
                return Ok(());
            }
            if !more {
                return Ok(());
            }
        }
    }

    fn template_path(&self, text: &str) -> Result<Vec<Arc<str>>, ParseError> {
        let path = NumerotedPath::parse_with(text, intern).map_err(|source| ParseError::InvalidPath {
            line: self.lexer.line_number(),
            path: text.to_string(),
            source,
        })?;
        if path.is_empty() {
            return Err(self.lexer.syntax_error("empty path"));
        }
        if path.indices().iter().any(|&i| i != 0) {
            return Err(self.lexer.syntax_error("template paths take no occurrence index"));
        }
        Ok(path.segments().to_vec())
    }
}

fn validate_paths(node: &TemplateNode, ancestor: Option<&[Arc<str>]>) -> Result<(), ParseError> {
    if let (Some(path), Some(parent)) = (node.path(), ancestor) {
        if path.len() <= parent.len() || path[..parent.len()] != *parent {
            return Err(ParseError::PathNotNested {
                line: node.line,
                path: path.join("."),
                parent: parent.join("."),
            });
        }
    }
    let next = node.path().or(ancestor);
    node.children().try_for_each(|child| validate_paths(child, next))
}

fn collect_stats(node: &TemplateNode, stats: &mut TemplateStats) {
    stats.nodes += 1;
    stats.fields += usize::from(node.is_field);
    stats.paths += usize::from(node.path.is_some());
    for child in node.children() {
        collect_stats(child, stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"{
    "root":{
        "path":null,
        "content":[
            {
                "block":{
                    "path":"contact",
                    "multiplicity":3,
                    "content":[
                        {
                            "field":{
                                "path":"contact.name",
                                "render":"text",
                                "defaultValue":"unknown",
                                "value":null
                            }
                        }
                    ]
                }
            },
            {
                "field":{
                    "path":"title",
                    "value":null
                }
            }
        ]
    }
}"#;

    const BRACE_LIST: &str = r#"{
    "content":[{
        "field":{
            "path":"title",
            "value":null
        }
    },{
        "field":{
            "path":"abstract",
            "value":null
        }
    }]
}"#;

    #[test]
    fn parse_nested_template() {
        let template: Template = NESTED.parse().unwrap();
        let root = template.root();
        assert!(root.path().is_none());
        assert!(!root.is_field());

        let children: Vec<_> = root.children().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].path().unwrap().len(), 1);
        assert_eq!(children[0].max_occurs(), 3);
        assert!(children[0].has_trailing_separator());
        assert!(!children[1].has_trailing_separator());
        assert_eq!(children[0].separator(), Separator::Comma);

        let field = children[0].children().next().unwrap();
        assert!(field.is_field());
        assert_eq!(field.render(), Some("text"));
        assert_eq!(field.default_value(), Some(&Scalar::text("unknown")));
        assert_eq!(field.max_occurs(), usize::MAX);

        assert_eq!(
            template.stats(),
            TemplateStats {
                nodes: 4,
                fields: 2,
                paths: 3
            }
        );
    }

    #[test]
    fn value_line_is_split_before_null() {
        let template: Template = NESTED.parse().unwrap();
        let title = template.root().children().nth(1).unwrap();
        let prefix = title.content().iter().find_map(|e| match e {
            Element::Value { prefix } => Some(prefix.clone()),
            _ => None,
        });
        assert_eq!(prefix.as_deref(), Some("                    \"value\":"));
    }

    #[test]
    fn brace_list_layout() {
        let template: Template = BRACE_LIST.parse().unwrap();
        let children: Vec<_> = template.root().children().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].separator(), Separator::CommaBrace);
        assert!(children[0].has_trailing_separator());
        assert!(!children[1].has_trailing_separator());

        let root = template.root().content();
        assert!(matches!(&root[0], Element::Line(_)));
        assert!(matches!(&root[1], Element::BraceListOpen(text) if &**text == "    \"content\":[{"));
        assert!(matches!(root.last(), Some(Element::Line(text)) if &**text == "}"));
        assert!(matches!(&root[root.len() - 2], Element::Tail(text) if &**text == "]"));
    }

    #[test]
    fn list_closed_on_root_line_is_rejected() {
        let result: Result<Template, _> = r#"{
"content":[]
}]"#.parse();
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn empty_content_list() {
        let template: Template = "{\n  \"content\":[]\n}".parse().unwrap();
        assert_eq!(template.root().children().count(), 0);

        let template: Template = "{\n  \"content\":[\n\n  ],\n  \"label\":\"x\"\n}".parse().unwrap();
        assert_eq!(template.root().children().count(), 0);
        assert_eq!(template.root().content().len(), 5);
    }

    #[test]
    fn child_path_must_extend_parent() {
        let text = NESTED.replace("\"contact.name\"", "\"name\"");
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::PathNotNested { .. })));
    }

    #[test]
    fn child_path_equal_to_parent_is_rejected() {
        let text = NESTED.replace("\"contact.name\"", "\"contact\"");
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::PathNotNested { .. })));
    }

    #[test]
    fn template_value_must_be_null() {
        let text = NESTED.replacen("\"value\":null", "\"value\":\"x\"", 1);
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn multiplicity_must_be_positive() {
        let text = NESTED.replace("\"multiplicity\":3", "\"multiplicity\":0");
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::InvalidMultiplicity { .. })));
    }

    #[test]
    fn field_cannot_have_content() {
        let text = "{\n\"path\":\"a\",\n\"content\":[],\n\"value\":null\n}";
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::FieldWithContent { line: 1 })));
    }

    #[test]
    fn field_needs_path() {
        let result: Result<Template, _> = "{\n\"value\":null\n}".parse();
        assert!(matches!(result, Err(ParseError::FieldWithoutPath { .. })));
    }

    #[test]
    fn template_path_rejects_indices() {
        let text = NESTED.replace("\"title\"", "\"title[1]\"");
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn unterminated_template() {
        let text = &NESTED[..NESTED.len() - 2];
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::UnexpectedEnd { .. })));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let text = format!("{NESTED}\n{{");
        let result: Result<Template, _> = text.parse();
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn template_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
    }
}
