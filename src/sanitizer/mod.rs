//! The sanitization pipeline.
//!
//! Every node of the tree is handed, in order, to each [`Transformer`] of the
//! pipeline: first the custom transformers registered on the policy, then the
//! built-in ones:
//!
//! - comment policy -- removes (or escapes) comments.
//! - CDATA policy -- turns CDATA sections into text.
//! - doctype policy -- removes or normalizes doctypes.
//! - element policy -- removes disallowed elements, filters attributes and
//!   delegates `style` content to the [`CssSanitizer`](crate::CssSanitizer).
//!
//! Transformers may mark nodes as already safe through the call's
//! [`NodeWhitelist`]; later transformers see that through
//! [`TransformerEnv::is_whitelisted`].

mod cdata;
mod comment;
mod doctype;
mod element;

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::PolicyConfig;
use crate::css::CssSanitizer;
use crate::dom::{Document, Encoding, NodeId, NodeKind, SerializeOptions};
use crate::error::{Result, SanitizeError};
use crate::traverse::{self, TraversalMode};

use cdata::CdataPolicy;
use comment::CommentPolicy;
use doctype::DoctypePolicy;
use element::ElementPolicy;

/// Characters stripped from input before parsing: NUL, combining marks and
/// format controls that confuse parsers or renderers.
static UNSUITABLE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x{0}\x{340}\x{341}\x{17a3}\x{17d3}\x{2028}\x{2029}\x{202a}-\x{202e}\x{206a}-\x{206f}\x{fff9}-\x{fffb}\x{feff}\x{fffc}\x{1d173}-\x{1d17a}\x{e0000}-\x{e007f}]",
    )
    .expect("unsuitable character pattern is valid")
});

/// Result of a single transformer invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WhitelistDelta {
    #[default]
    NoChange,
    /// Mark these nodes as safe for the rest of the call.
    Whitelist(Vec<NodeId>),
}

/// Nodes marked safe during one sanitize call.
#[derive(Clone, Debug, Default)]
pub struct NodeWhitelist(HashSet<NodeId>);

impl NodeWhitelist {
    /// Whether `node` was marked safe earlier in this call.
    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    /// Mark `node` safe. Returns `false` if it already was.
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.0.insert(node)
    }

    /// Number of nodes marked safe so far.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no node has been marked safe.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a transformer gets to see about the node being visited.
pub struct TransformerEnv<'a> {
    pub doc: &'a mut Document,
    pub node: NodeId,
    /// Lower-cased node name, e.g. `"div"` or `"#text"`.
    pub node_name: String,
    pub is_whitelisted: bool,
    pub node_whitelist: &'a mut NodeWhitelist,
    pub config: &'a PolicyConfig,
    pub mode: TraversalMode,
}

/// A single stage of the pipeline.
///
/// Implemented for any `Fn(&mut TransformerEnv<'_>) -> Result<WhitelistDelta>`
/// closure, so simple transformers need no type of their own. Errors abort
/// the sanitize call and are returned to its caller.
pub trait Transformer: Send + Sync {
    fn transform(&self, env: &mut TransformerEnv<'_>) -> Result<WhitelistDelta>;
}

impl<F> Transformer for F
where
    F: Fn(&mut TransformerEnv<'_>) -> Result<WhitelistDelta> + Send + Sync,
{
    fn transform(&self, env: &mut TransformerEnv<'_>) -> Result<WhitelistDelta> {
        self(env)
    }
}

const BUILTIN: [&dyn Transformer; 4] = [&CommentPolicy, &CdataPolicy, &DoctypePolicy, &ElementPolicy];

/// Sanitizes markup against a [`PolicyConfig`].
///
/// A `Sanitizer` holds no per-call state and can be shared between threads.
///
/// # Example
///
/// ```
/// use html_sanitize::{PolicyConfig, Sanitizer};
///
/// let sanitizer = Sanitizer::new(PolicyConfig::basic().clone());
/// let html = sanitizer
///     .fragment(r#"<a href="javascript:alert(1)" onclick="x()">hi</a><script>bad()</script>"#)
///     .unwrap();
/// assert_eq!(html, r#"<a rel="nofollow">hi</a>bad()"#);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Sanitizer {
    config: PolicyConfig,
}

impl Sanitizer {
    /// A sanitizer applying `config`.
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// The policy this sanitizer applies.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// A CSS sanitizer for this policy's CSS rules.
    pub fn css(&self) -> CssSanitizer<'_> {
        CssSanitizer::new(self.config.css())
    }

    /// Sanitize an HTML body fragment.
    pub fn fragment(&self, html: &str) -> Result<String> {
        sanitize_fragment(&self.config, html)
    }

    /// Sanitize a complete HTML document. The policy must allow `<html>`.
    pub fn document(&self, html: &str) -> Result<String> {
        sanitize_document(&self.config, html)
    }

    /// Sanitize the subtree rooted at `node` in place.
    pub fn node(&self, doc: &mut Document, node: NodeId) -> Result<()> {
        sanitize_node(&self.config, doc, node)
    }

    /// Sanitize `html` as a fragment in place. Returns whether it changed.
    pub fn fragment_in_place(&self, html: &mut String) -> Result<bool> {
        let sanitized = self.fragment(html)?;
        Ok(replace_if_changed(html, sanitized))
    }

    /// Sanitize `html` as a document in place. Returns whether it changed.
    pub fn document_in_place(&self, html: &mut String) -> Result<bool> {
        let sanitized = self.document(html)?;
        Ok(replace_if_changed(html, sanitized))
    }
}

fn replace_if_changed(html: &mut String, sanitized: String) -> bool {
    if *html == sanitized {
        return false;
    }
    *html = sanitized;
    true
}

pub(crate) fn sanitize_fragment(config: &PolicyConfig, html: &str) -> Result<String> {
    let options = serialize_options(config)?;
    let mut doc = Document::parse_fragment(&strip_unsuitable(html));
    let root = doc.root();
    sanitize_node(config, &mut doc, root)?;
    let out = doc.serialize(root, &options);
    tracing::debug!("Sanitized fragment: {} bytes in, {} bytes out", html.len(), out.len());
    Ok(out)
}

pub(crate) fn sanitize_document(config: &PolicyConfig, html: &str) -> Result<String> {
    require_html(config)?;
    let options = serialize_options(config)?;
    let mut doc = Document::parse_document(&strip_unsuitable(html));
    let root = doc.root();
    sanitize_node(config, &mut doc, root)?;
    let out = doc.serialize(root, &options);
    tracing::debug!("Sanitized document: {} bytes in, {} bytes out", html.len(), out.len());
    Ok(out)
}

pub(crate) fn sanitize_node(config: &PolicyConfig, doc: &mut Document, node: NodeId) -> Result<()> {
    match doc.kind(node) {
        None => {
            tracing::warn!("Refusing to sanitize a node that is not part of the document");
            return Err(SanitizeError::Precondition(
                "node does not belong to this document".to_string(),
            ));
        }
        Some(NodeKind::Document) => require_html(config)?,
        Some(_) => {}
    }

    let mut whitelist = NodeWhitelist::default();

    if !config.breadth_transformers().is_empty() {
        let stages: Vec<&dyn Transformer> = config
            .breadth_transformers()
            .iter()
            .map(|t| t.as_ref() as &dyn Transformer)
            .collect();
        traverse::walk(doc, node, TraversalMode::Breadth, |doc, id| {
            run_stages(config, doc, id, &mut whitelist, &stages, TraversalMode::Breadth)
        })?;
    }

    let stages: Vec<&dyn Transformer> = config
        .transformers()
        .iter()
        .map(|t| t.as_ref() as &dyn Transformer)
        .chain(BUILTIN)
        .collect();
    traverse::walk(doc, node, TraversalMode::Depth, |doc, id| {
        run_stages(config, doc, id, &mut whitelist, &stages, TraversalMode::Depth)
    })?;

    tracing::trace!("Whitelisted {} nodes", whitelist.len());
    Ok(())
}

fn run_stages(
    config: &PolicyConfig,
    doc: &mut Document,
    node: NodeId,
    whitelist: &mut NodeWhitelist,
    stages: &[&dyn Transformer],
    mode: TraversalMode,
) -> Result<()> {
    let Some(mut name) = doc.name(node).map(str::to_owned) else {
        return Ok(());
    };

    for stage in stages {
        let mut env = TransformerEnv {
            doc: &mut *doc,
            node,
            node_name: name,
            is_whitelisted: whitelist.contains(node),
            node_whitelist: &mut *whitelist,
            config,
            mode,
        };
        let delta = stage.transform(&mut env)?;

        if let WhitelistDelta::Whitelist(nodes) = delta {
            for id in nodes {
                if !doc.contains(id) {
                    tracing::warn!("Transformer whitelisted a node outside the document");
                    return Err(SanitizeError::Config(
                        "transformer whitelisted a node that is not part of the document"
                            .to_string(),
                    ));
                }
                whitelist.insert(id);
            }
        }

        // A transformer may have renamed the node.
        name = doc.name(node).map(str::to_owned).unwrap_or_default();
    }
    Ok(())
}

fn require_html(config: &PolicyConfig) -> Result<()> {
    if config.allows_element("html") {
        return Ok(());
    }
    tracing::warn!("Refusing to sanitize a document whose <html> element is not allowed");
    Err(SanitizeError::Precondition(
        "<html> must be an allowed element when sanitizing a document".to_string(),
    ))
}

fn serialize_options(config: &PolicyConfig) -> Result<SerializeOptions> {
    let encoding = Encoding::from_label(config.output_encoding()).inspect_err(|e| {
        tracing::warn!("{e}");
    })?;
    Ok(SerializeOptions {
        format: config.output_format(),
        encoding,
    })
}

fn strip_unsuitable(html: &str) -> Cow<'_, str> {
    UNSUITABLE_CHARS.replace_all(html, "")
}
