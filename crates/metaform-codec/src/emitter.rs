//! Form text emission
//!
//! Lines are joined with `\n`; a block's closing line is left open so the
//! separator for the next sibling occurrence can be appended to it.

use crate::config::CodecOptions;
use crate::format::write_scalar;
use crate::projector::{Kind, ValueNode};
use crate::template::Element;
use metaform_model::write_segments;
use std::fmt::{self, Write};

pub(crate) struct Emitter<'o, W> {
    out: &'o mut W,
    options: &'o CodecOptions,
    started: bool,
}

impl<'o, W: Write> Emitter<'o, W> {
    pub(crate) fn new(out: &'o mut W, options: &'o CodecOptions) -> Self {
        Self {
            out,
            options,
            started: false,
        }
    }

    /// Write the whole form, ending with a newline
    pub(crate) fn emit(mut self, root: &ValueNode<'_>) -> fmt::Result {
        self.node(root)?;
        self.out.write_char('\n')
    }

    fn begin_line(&mut self) -> fmt::Result {
        if self.started {
            self.out.write_char('\n')?;
        }
        self.started = true;
        Ok(())
    }

    fn node(&mut self, node: &ValueNode<'_>) -> fmt::Result {
        let template = node.template;
        let (value, mut children) = match &node.kind {
            Kind::Field(value) => (value.as_ref(), None),
            Kind::Block(children) => (None, Some(children.iter())),
        };
        let populated = matches!(&node.kind, Kind::Block(children) if children.iter().any(|c| !c.is_empty()));
        let mut sibling_written = false;
        for element in template.content() {
            match element {
                Element::Line(text) => {
                    self.begin_line()?;
                    self.out.write_str(text)?;
                }
                Element::BraceListOpen(text) => {
                    self.begin_line()?;
                    match text.rfind('{') {
                        // The brace opens the first occurrence; without one the list stays empty.
                        Some(brace) if !populated => {
                            self.out.write_str(&text[..brace])?;
                            self.out.write_str(&text[brace + 1..])?;
                        }
                        _ => self.out.write_str(text)?,
                    }
                }
                Element::Tail(text) => self.out.write_str(text)?,
                Element::Path { prefix, suffix } => {
                    self.begin_line()?;
                    self.out.write_str(prefix)?;
                    self.out.write_char('"')?;
                    if let Some(path) = template.path() {
                        write_segments(&mut *self.out, path, &node.indices)?;
                    }
                    self.out.write_char('"')?;
                    self.out.write_str(suffix)?;
                }
                Element::Value { prefix } => {
                    self.begin_line()?;
                    self.out.write_str(prefix)?;
                    write_scalar(&mut *self.out, value, template.render(), self.options)?;
                }
                Element::Node(_) => {
                    let Some(occurrences) = children.as_mut().and_then(Iterator::next) else {
                        continue;
                    };
                    for occurrence in occurrences {
                        if sibling_written {
                            self.out.write_str(occurrence.template.separator().as_str())?;
                        }
                        self.node(occurrence)?;
                        sibling_written = true;
                    }
                }
            }
        }
        Ok(())
    }
}
