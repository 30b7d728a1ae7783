//! # html_sanitize
//!
//! An allow-list HTML and CSS sanitizer.
//!
//! ## Overview
//!
//! `html_sanitize` parses untrusted markup, walks the resulting tree and
//! removes every element, attribute, URL scheme and CSS construct that the
//! active [`PolicyConfig`] does not explicitly allow. What survives is
//! serialized back to a string that is safe to embed in a page.
//!
//! Disallowed elements are unwrapped (their content is kept) unless the
//! policy says to drop their contents as well, and block-level elements are
//! replaced by whitespace so that neighbouring words do not run together.
//!
//! ## Quick start
//!
//! ```rust
//! use html_sanitize::PolicyConfig;
//!
//! let html = r#"<b>bold</b> <a href="https://example.com" onclick="evil()">link</a>"#;
//!
//! // The default policy strips all markup.
//! let text = html_sanitize::fragment(html, PolicyConfig::default_policy()).unwrap();
//! assert_eq!(text, "bold link");
//!
//! let basic = html_sanitize::fragment(html, PolicyConfig::basic()).unwrap();
//! assert_eq!(
//!     basic,
//!     r#"<b>bold</b> <a href="https://example.com" rel="nofollow">link</a>"#
//! );
//! ```
//!
//! Policies are built with [`PolicyBuilder`], usually starting from a preset:
//!
//! ```rust
//! use html_sanitize::{PolicyBuilder, PolicyConfig, Sanitizer};
//!
//! let config = PolicyBuilder::from_config(PolicyConfig::restricted())
//!     .elements(["p"])
//!     .attributes("p", ["title"])
//!     .build();
//! let sanitizer = Sanitizer::new(config);
//! assert_eq!(
//!     sanitizer.fragment(r#"<p title="t" class="c">hi</p>"#).unwrap(),
//!     r#"<p title="t">hi</p>"#
//! );
//! ```
//!
//! ## Presets
//!
//! | Preset | Allows |
//! |--------|--------|
//! | [`PolicyConfig::default_policy`] | Nothing but text. |
//! | [`PolicyConfig::restricted`] | Simple inline formatting (`b`, `em`, `i`, `strong`, `u`). |
//! | [`PolicyConfig::basic`] | Inline and block formatting, links (with `rel="nofollow"`), lists and quotes. |
//! | [`PolicyConfig::relaxed`] | Most structural markup, images, tables, `style` attributes and elements. |
//!
//! Presets are built once and shared; they can be used from any thread.

pub mod config;
pub mod css;
pub mod dom;
pub mod error;
pub mod presets;
pub mod protocol;
pub mod sanitizer;
pub mod traverse;

pub use config::{
    AttributeSet, CssPolicy, OutputFormat, PolicyBuilder, PolicyConfig, Protocol, RemoveContents,
    Whitespace,
};
pub use css::CssSanitizer;
pub use dom::{Document, NodeData, NodeId, NodeKind};
pub use error::{Result, SanitizeError};
pub use sanitizer::{NodeWhitelist, Sanitizer, Transformer, TransformerEnv, WhitelistDelta};
pub use traverse::TraversalMode;

/// Sanitize an HTML body fragment with `config`.
pub fn fragment(html: &str, config: &PolicyConfig) -> Result<String> {
    sanitizer::sanitize_fragment(config, html)
}

/// Sanitize a complete HTML document with `config`, which must allow `<html>`.
pub fn document(html: &str, config: &PolicyConfig) -> Result<String> {
    sanitizer::sanitize_document(config, html)
}

/// Sanitize the subtree of `doc` rooted at `node` in place.
pub fn node(doc: &mut Document, node: NodeId, config: &PolicyConfig) -> Result<()> {
    sanitizer::sanitize_node(config, doc, node)
}

/// Sanitize a CSS declaration list (the value of a `style` attribute).
pub fn css_properties(css: &str, config: &PolicyConfig) -> String {
    CssSanitizer::new(config.css()).sanitize_properties(css)
}

/// Sanitize a CSS stylesheet.
pub fn css_stylesheet(css: &str, config: &PolicyConfig) -> String {
    CssSanitizer::new(config.css()).sanitize_stylesheet(css)
}
