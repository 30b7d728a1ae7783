use std::borrow::Cow;
use std::fmt::Write as _;

use crate::config::OutputFormat;
use crate::error::{Result, SanitizeError};

use super::{Doctype, Document, Element, NodeData, NodeId};

/// Character encoding of serialized output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Every non-ASCII character is written as a character reference (or a
    /// CSS escape inside `<style>`).
    Ascii,
}

impl Encoding {
    /// Resolve an encoding label such as `"utf-8"` or `"US-ASCII"`.
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            other => Err(SanitizeError::Config(format!(
                "unsupported output encoding: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    pub format: OutputFormat,
    pub encoding: Encoding,
}

/// HTML5 void elements that must not have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is written without entity escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl Document {
    /// Serialize `id` to markup.
    ///
    /// Document and fragment roots serialize as the concatenation of their
    /// children; any other node serializes as itself, including its subtree.
    pub fn serialize(&self, id: NodeId, options: &SerializeOptions) -> String {
        let mut out = String::new();
        let mut stack = vec![Step::Open(id)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(id) => {
                    let Some(data) = self.get(id) else {
                        continue;
                    };
                    match data {
                        NodeData::Document | NodeData::Fragment => {
                            push_children(&mut stack, self.children(id));
                        }
                        NodeData::Element(element) => {
                            write_start_tag(&mut out, element, options);
                            if !VOID_ELEMENTS.contains(&element.name()) {
                                stack.push(Step::Close(id));
                                push_children(&mut stack, self.children(id));
                            }
                        }
                        NodeData::Text(text) => self.write_text(&mut out, id, text, options),
                        NodeData::Comment(comment) => {
                            out.push_str("<!--");
                            push_encoded(&mut out, comment, options.encoding);
                            out.push_str("-->");
                        }
                        NodeData::CData(text) => {
                            out.push_str("<![CDATA[");
                            push_encoded(&mut out, text, options.encoding);
                            out.push_str("]]>");
                        }
                        NodeData::Doctype(doctype) => write_doctype(&mut out, doctype),
                    }
                }
                Step::Close(id) => {
                    if let Some(element) = self.element(id) {
                        out.push_str("</");
                        out.push_str(element.name());
                        out.push('>');
                    }
                }
            }
        }

        out
    }

    fn write_text(&self, out: &mut String, id: NodeId, text: &str, options: &SerializeOptions) {
        let raw_parent = self
            .parent(id)
            .and_then(|parent| self.element(parent))
            .map(Element::name)
            .filter(|name| RAW_TEXT_ELEMENTS.contains(name));

        match raw_parent {
            Some(parent) => write_raw_text(out, text, parent, options.encoding),
            None => {
                for ch in text.chars() {
                    match ch {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        ch => push_char(out, ch, options.encoding),
                    }
                }
            }
        }
    }
}

fn push_children(stack: &mut Vec<Step>, children: Vec<NodeId>) {
    stack.extend(children.into_iter().rev().map(Step::Open));
}

fn write_start_tag(out: &mut String, element: &Element, options: &SerializeOptions) {
    out.push('<');
    out.push_str(element.name());
    for (name, value) in element.attrs() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        for ch in value.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '"' => out.push_str("&quot;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                ch => push_char(out, ch, options.encoding),
            }
        }
        out.push('"');
    }
    if options.format == OutputFormat::Xhtml && VOID_ELEMENTS.contains(&element.name()) {
        out.push_str(" />");
    } else {
        out.push('>');
    }
}

/// Raw text is emitted verbatim, except that anything which would close the
/// enclosing element early has its `</` broken up.
fn write_raw_text(out: &mut String, text: &str, parent: &str, encoding: Encoding) {
    let closer = format!("</{parent}");
    let text = if text.to_ascii_lowercase().contains(&closer) {
        Cow::Owned(text.replace("</", "<\\/"))
    } else {
        Cow::Borrowed(text)
    };

    if encoding == Encoding::Ascii && parent == "style" {
        for ch in text.chars() {
            if ch.is_ascii() {
                out.push(ch);
            } else {
                let _ = write!(out, "\\{:x} ", ch as u32);
            }
        }
    } else {
        push_encoded(out, &text, encoding);
    }
}

fn write_doctype(out: &mut String, doctype: &Doctype) {
    out.push_str("<!DOCTYPE ");
    out.push_str(&doctype.name);
    if !doctype.public_id.is_empty() {
        let _ = write!(out, " PUBLIC \"{}\"", doctype.public_id);
        if !doctype.system_id.is_empty() {
            let _ = write!(out, " \"{}\"", doctype.system_id);
        }
    } else if !doctype.system_id.is_empty() {
        let _ = write!(out, " SYSTEM \"{}\"", doctype.system_id);
    }
    out.push('>');
}

fn push_encoded(out: &mut String, text: &str, encoding: Encoding) {
    match encoding {
        Encoding::Utf8 => out.push_str(text),
        Encoding::Ascii => text.chars().for_each(|ch| push_char(out, ch, encoding)),
    }
}

fn push_char(out: &mut String, ch: char, encoding: Encoding) {
    if encoding == Encoding::Ascii && !ch.is_ascii() {
        let _ = write!(out, "&#{};", ch as u32);
    } else {
        out.push(ch);
    }
}
