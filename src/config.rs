//! Allow-list policy model and the builder used to assemble it.
//!
//! A [`PolicyConfig`] is immutable once built. New policies are derived
//! either through [`PolicyBuilder`] (usually seeded from one of the presets
//! in [`crate::presets`]) or with [`PolicyConfig::merge`], which performs a
//! deep, side-effect-free union of two policies.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::SanitizeError;
use crate::sanitizer::Transformer;

/// A URL scheme permitted in a protocol-checked attribute or CSS `url()`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    /// A URL with no scheme prefix at all (`/foo`, `bar.png`, `#top`).
    Relative,
    /// A named scheme, stored lower-cased (`http`, `mailto`).
    Scheme(String),
}

impl Protocol {
    /// A named scheme; `name` is lower-cased.
    pub fn scheme(name: &str) -> Self {
        Protocol::Scheme(name.to_ascii_lowercase())
    }
}

impl From<&str> for Protocol {
    fn from(name: &str) -> Self {
        Protocol::scheme(name)
    }
}

/// Attribute names allowed on one element (or on every element).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeSet {
    names: HashSet<String>,
    data: bool,
}

impl AttributeSet {
    /// Whether `name` is listed explicitly.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether arbitrary well-formed `data-*` attributes are allowed.
    pub fn allows_data(&self) -> bool {
        self.data
    }

    /// Whether nothing at all is allowed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && !self.data
    }

    /// The explicitly listed names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn union(&mut self, other: &AttributeSet) {
        self.names.extend(other.names.iter().cloned());
        self.data |= other.data;
    }
}

/// Which disallowed elements lose their children along with the tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RemoveContents {
    /// Children of a removed element are spliced into its position.
    #[default]
    Never,
    /// Children of every removed element are dropped.
    Always,
    /// Children are dropped only for these (removed) element names.
    Elements(HashSet<String>),
}

impl RemoveContents {
    /// Whether a removed `name` element also loses its children.
    pub fn applies_to(&self, name: &str) -> bool {
        match self {
            RemoveContents::Never => false,
            RemoveContents::Always => true,
            RemoveContents::Elements(names) => names.contains(name),
        }
    }

    fn merge(&self, other: &RemoveContents) -> RemoveContents {
        match (self, other) {
            (RemoveContents::Elements(a), RemoveContents::Elements(b)) => {
                RemoveContents::Elements(a.union(b).cloned().collect())
            }
            _ => other.clone(),
        }
    }
}

/// Text inserted around a removed element so adjacent words stay apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Whitespace {
    pub before: String,
    pub after: String,
}

impl Whitespace {
    /// Padding inserted before and after the removed element.
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// Markup dialect used when serializing the sanitized tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Html,
    Xhtml,
}

impl FromStr for OutputFormat {
    type Err = SanitizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "xhtml" => Ok(OutputFormat::Xhtml),
            other => Err(SanitizeError::Config(format!(
                "unsupported output format: {other}"
            ))),
        }
    }
}

/// The CSS sub-policy applied to `<style>` elements and `style` attributes.
///
/// Methods consume and return `self`, adding to the set-valued fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CssPolicy {
    // `None` until set, so a merge keeps the other side's flag.
    allow_comments: Option<bool>,
    allow_hacks: Option<bool>,
    at_rules: HashSet<String>,
    at_rules_with_properties: HashSet<String>,
    at_rules_with_styles: HashSet<String>,
    properties: HashSet<String>,
    protocols: HashSet<Protocol>,
}

impl CssPolicy {
    /// An empty CSS policy: no properties, no at-rules, no protocols.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep CSS comments instead of dropping them.
    pub fn allow_comments(mut self, allow: bool) -> Self {
        self.allow_comments = Some(allow);
        self
    }

    /// Tolerate the legacy IE `*prop` / `_prop` name prefixes.
    pub fn allow_hacks(mut self, allow: bool) -> Self {
        self.allow_hacks = Some(allow);
        self
    }

    /// At-rules allowed by name only; their block (if any) is dropped.
    pub fn at_rules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.at_rules.extend(lowercased(names));
        self
    }

    /// At-rules whose block is a property list (`@font-face`, `@page`).
    pub fn at_rules_with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.at_rules_with_properties.extend(lowercased(names));
        self
    }

    /// At-rules whose block holds nested style rules (`@media`, `@supports`).
    pub fn at_rules_with_styles<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.at_rules_with_styles.extend(lowercased(names));
        self
    }

    /// Property names allowed in declarations.
    pub fn properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.properties.extend(lowercased(names));
        self
    }

    /// Schemes allowed in `url()` and other URL-valued CSS.
    pub fn protocols<I, P>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Protocol>,
    {
        self.protocols.extend(protocols.into_iter().map(Into::into));
        self
    }

    /// Whether CSS comments survive.
    pub fn comments_allowed(&self) -> bool {
        self.allow_comments.unwrap_or(false)
    }

    /// Whether `*prop` / `_prop` hacks are honored.
    pub fn hacks_allowed(&self) -> bool {
        self.allow_hacks.unwrap_or(false)
    }

    /// Whether the (lower-cased, unprefixed) property `name` is allowed.
    pub fn allows_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    /// Whether `@name` is allowed in any of the three at-rule classes.
    pub fn allows_at_rule(&self, name: &str) -> bool {
        self.at_rules.contains(name)
            || self.at_rules_with_properties.contains(name)
            || self.at_rules_with_styles.contains(name)
    }

    /// Whether `@name` keeps a block of nested style rules.
    pub fn at_rule_has_styles(&self, name: &str) -> bool {
        self.at_rules_with_styles.contains(name)
    }

    /// Whether `@name` keeps a block of declarations.
    pub fn at_rule_has_properties(&self, name: &str) -> bool {
        self.at_rules_with_properties.contains(name)
    }

    /// Schemes allowed in CSS URLs.
    pub fn allowed_protocols(&self) -> &HashSet<Protocol> {
        &self.protocols
    }

    /// Union the set-valued fields. Flags that `other` set explicitly win;
    /// flags it never set keep `self`'s value.
    pub fn merge(&self, other: &CssPolicy) -> CssPolicy {
        let mut merged = self.clone();
        merged.allow_comments = other.allow_comments.or(self.allow_comments);
        merged.allow_hacks = other.allow_hacks.or(self.allow_hacks);
        merged.at_rules.extend(other.at_rules.iter().cloned());
        merged
            .at_rules_with_properties
            .extend(other.at_rules_with_properties.iter().cloned());
        merged
            .at_rules_with_styles
            .extend(other.at_rules_with_styles.iter().cloned());
        merged.properties.extend(other.properties.iter().cloned());
        merged.protocols.extend(other.protocols.iter().cloned());
        merged
    }
}

static NEVER: RemoveContents = RemoveContents::Never;

/// Immutable allow-list policy.
///
/// Build one with [`PolicyBuilder`] or start from a preset such as
/// [`PolicyConfig::relaxed`]. A policy is `Send + Sync` and may be shared by
/// any number of concurrent sanitize calls.
#[derive(Clone)]
pub struct PolicyConfig {
    elements: HashSet<String>,
    attributes: HashMap<String, AttributeSet>,
    all_attributes: AttributeSet,
    add_attributes: HashMap<String, BTreeMap<String, String>>,
    protocols: HashMap<String, HashMap<String, HashSet<Protocol>>>,
    // Scalars stay `None` until a builder sets them, so that `merge` can
    // tell an explicit choice from an untouched default.
    remove_contents: Option<RemoveContents>,
    whitespace_elements: HashMap<String, Whitespace>,
    allow_comments: Option<bool>,
    escape_comments: Option<bool>,
    allow_doctype: Option<bool>,
    output_format: Option<OutputFormat>,
    output_encoding: Option<String>,
    css: CssPolicy,
    transformers: Vec<Arc<dyn Transformer>>,
    breadth_transformers: Vec<Arc<dyn Transformer>>,
}

impl PolicyConfig {
    /// A policy that allows nothing and inserts no whitespace.
    pub(crate) fn empty() -> Self {
        Self {
            elements: HashSet::new(),
            attributes: HashMap::new(),
            all_attributes: AttributeSet::default(),
            add_attributes: HashMap::new(),
            protocols: HashMap::new(),
            remove_contents: None,
            whitespace_elements: HashMap::new(),
            allow_comments: None,
            escape_comments: None,
            allow_doctype: None,
            output_format: None,
            output_encoding: None,
            css: CssPolicy::default(),
            transformers: Vec::new(),
            breadth_transformers: Vec::new(),
        }
    }

    /// Shorthand for [`PolicyBuilder::new`].
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::new()
    }

    /// A builder seeded with this policy.
    pub fn to_builder(&self) -> PolicyBuilder {
        PolicyBuilder::from_config(self)
    }

    /// Deep-merge `other` on top of `self`.
    ///
    /// Set-valued fields are unioned, map-valued fields are merged key by
    /// key and transformer lists are concatenated (`self` first). A scalar
    /// (a flag, the output format or encoding, `remove_contents`) is taken
    /// from `other` only if `other` was built with that scalar set;
    /// otherwise `self`'s value is kept. Two `remove_contents` element sets
    /// are unioned.
    pub fn merge(&self, other: &PolicyConfig) -> PolicyConfig {
        let mut merged = self.clone();

        merged.elements.extend(other.elements.iter().cloned());

        for (element, set) in &other.attributes {
            merged
                .attributes
                .entry(element.clone())
                .or_default()
                .union(set);
        }
        merged.all_attributes.union(&other.all_attributes);

        for (element, attrs) in &other.add_attributes {
            merged
                .add_attributes
                .entry(element.clone())
                .or_default()
                .extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        for (element, by_attr) in &other.protocols {
            let entry = merged.protocols.entry(element.clone()).or_default();
            for (attr, protocols) in by_attr {
                entry
                    .entry(attr.clone())
                    .or_default()
                    .extend(protocols.iter().cloned());
            }
        }

        merged.remove_contents = match (&self.remove_contents, &other.remove_contents) {
            (Some(ours), Some(theirs)) => Some(ours.merge(theirs)),
            (ours, theirs) => theirs.clone().or_else(|| ours.clone()),
        };
        merged.whitespace_elements.extend(
            other
                .whitespace_elements
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        merged.allow_comments = other.allow_comments.or(self.allow_comments);
        merged.escape_comments = other.escape_comments.or(self.escape_comments);
        merged.allow_doctype = other.allow_doctype.or(self.allow_doctype);
        merged.output_format = other.output_format.or(self.output_format);
        merged.output_encoding = other
            .output_encoding
            .clone()
            .or_else(|| self.output_encoding.clone());
        merged.css = self.css.merge(&other.css);

        merged
            .transformers
            .extend(other.transformers.iter().cloned());
        merged
            .breadth_transformers
            .extend(other.breadth_transformers.iter().cloned());

        merged
    }

    /// Whether the lower-cased element `name` may stay in the output.
    pub fn allows_element(&self, name: &str) -> bool {
        self.elements.contains(name)
    }

    /// Allowed element names, in no particular order.
    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(String::as_str)
    }

    /// Attributes allowed on `element` specifically.
    pub fn attributes_for(&self, element: &str) -> Option<&AttributeSet> {
        self.attributes.get(element)
    }

    /// Attributes allowed on every element.
    pub fn all_attributes(&self) -> &AttributeSet {
        &self.all_attributes
    }

    /// Whether `name` is allowed on at least one element.
    pub fn allows_attribute_anywhere(&self, name: &str) -> bool {
        self.all_attributes.contains(name) || self.attributes.values().any(|s| s.contains(name))
    }

    /// Attributes forced onto every kept `element`, overwriting input values.
    pub fn added_attributes(&self, element: &str) -> Option<&BTreeMap<String, String>> {
        self.add_attributes.get(element)
    }

    /// Protocol rules for `element`, keyed by attribute name.
    pub fn protocols_for(&self, element: &str) -> Option<&HashMap<String, HashSet<Protocol>>> {
        self.protocols.get(element)
    }

    /// Which removed elements lose their children.
    pub fn remove_contents(&self) -> &RemoveContents {
        self.remove_contents.as_ref().unwrap_or(&NEVER)
    }

    /// Padding used when `element` is removed.
    pub fn whitespace_for(&self, element: &str) -> Option<&Whitespace> {
        self.whitespace_elements.get(element)
    }

    /// Whether HTML comments survive.
    pub fn allow_comments(&self) -> bool {
        self.allow_comments.unwrap_or(false)
    }

    /// Whether disallowed comments become visible text instead of being dropped.
    pub fn escape_comments(&self) -> bool {
        self.escape_comments.unwrap_or(false)
    }

    /// Whether a doctype survives (normalized to `<!DOCTYPE html>`).
    pub fn allow_doctype(&self) -> bool {
        self.allow_doctype.unwrap_or(false)
    }

    /// Dialect of the serialized output.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or_default()
    }

    /// Output encoding label, validated when a sanitize call starts.
    pub fn output_encoding(&self) -> &str {
        self.output_encoding.as_deref().unwrap_or("utf-8")
    }

    /// Rules for `style` attributes and `<style>` elements.
    pub fn css(&self) -> &CssPolicy {
        &self.css
    }

    /// Custom depth-mode transformers, run before the built-in ones.
    pub fn transformers(&self) -> &[Arc<dyn Transformer>] {
        &self.transformers
    }

    /// Transformers run in a breadth-first pass before the depth pass.
    pub fn breadth_transformers(&self) -> &[Arc<dyn Transformer>] {
        &self.breadth_transformers
    }
}

impl Default for PolicyConfig {
    /// The DEFAULT policy: nothing allowed, block-level elements replaced by
    /// spaces when removed.
    fn default() -> Self {
        crate::presets::default_policy().clone()
    }
}

impl fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyConfig")
            .field("elements", &self.elements)
            .field("attributes", &self.attributes)
            .field("all_attributes", &self.all_attributes)
            .field("add_attributes", &self.add_attributes)
            .field("protocols", &self.protocols)
            .field("remove_contents", &self.remove_contents)
            .field("whitespace_elements", &self.whitespace_elements)
            .field("allow_comments", &self.allow_comments)
            .field("escape_comments", &self.escape_comments)
            .field("allow_doctype", &self.allow_doctype)
            .field("output_format", &self.output_format)
            .field("output_encoding", &self.output_encoding)
            .field("css", &self.css)
            .field("transformers", &self.transformers.len())
            .field("breadth_transformers", &self.breadth_transformers.len())
            .finish()
    }
}

/// Builder for deriving a [`PolicyConfig`].
///
/// Element, attribute and protocol methods add to what is already allowed;
/// flag methods overwrite.
///
/// # Example
///
/// ```
/// use html_sanitize::{PolicyBuilder, PolicyConfig, Protocol};
///
/// let policy = PolicyBuilder::from_config(PolicyConfig::basic())
///     .elements(["img"])
///     .attributes("img", ["src", "alt"])
///     .protocols("img", "src", [Protocol::from("https"), Protocol::Relative])
///     .build();
///
/// assert!(policy.allows_element("img"));
/// assert!(policy.allows_element("a"));
/// ```
pub struct PolicyBuilder {
    config: PolicyConfig,
}

impl PolicyBuilder {
    /// Start from the DEFAULT policy.
    pub fn new() -> Self {
        Self {
            config: PolicyConfig::default(),
        }
    }

    /// Start from an existing policy, typically one of the presets.
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Start from a policy that allows nothing and has no whitespace rules.
    pub fn empty() -> Self {
        Self {
            config: PolicyConfig::empty(),
        }
    }

    /// Allow these elements.
    pub fn elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.elements.extend(lowercased(names));
        self
    }

    /// Allow these attributes on `element`.
    pub fn attributes<I, S>(mut self, element: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = self
            .config
            .attributes
            .entry(element.to_ascii_lowercase())
            .or_default();
        set.names.extend(lowercased(names));
        self
    }

    /// Allow attributes on every element.
    pub fn all_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.all_attributes.names.extend(lowercased(names));
        self
    }

    /// Allow any well-formed `data-*` attribute on `element`.
    pub fn data_attributes(mut self, element: &str) -> Self {
        self.config
            .attributes
            .entry(element.to_ascii_lowercase())
            .or_default()
            .data = true;
        self
    }

    /// Allow any well-formed `data-*` attribute on every element.
    pub fn all_data_attributes(mut self) -> Self {
        self.config.all_attributes.data = true;
        self
    }

    /// Force `name="value"` onto every surviving `element`.
    pub fn add_attribute(mut self, element: &str, name: &str, value: impl Into<String>) -> Self {
        self.config
            .add_attributes
            .entry(element.to_ascii_lowercase())
            .or_default()
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Restrict `element`'s `attribute` to URLs with these protocols.
    pub fn protocols<I, P>(mut self, element: &str, attribute: &str, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Protocol>,
    {
        self.config
            .protocols
            .entry(element.to_ascii_lowercase())
            .or_default()
            .entry(attribute.to_ascii_lowercase())
            .or_default()
            .extend(protocols.into_iter().map(Into::into));
        self
    }

    /// Which removed elements lose their children. Replaces any earlier
    /// setting.
    pub fn remove_contents(mut self, remove: RemoveContents) -> Self {
        self.config.remove_contents = Some(remove);
        self
    }

    /// Drop the children of these elements when they are removed.
    pub fn remove_contents_of<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra: HashSet<String> = lowercased(names).collect();
        self.config.remove_contents = Some(match self.config.remove_contents {
            Some(RemoveContents::Elements(mut existing)) => {
                existing.extend(extra);
                RemoveContents::Elements(existing)
            }
            Some(RemoveContents::Always) => RemoveContents::Always,
            Some(RemoveContents::Never) | None => RemoveContents::Elements(extra),
        });
        self
    }

    /// Surround `element` with `before`/`after` text when it is removed.
    pub fn whitespace_element(
        mut self,
        element: &str,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        self.config
            .whitespace_elements
            .insert(element.to_ascii_lowercase(), Whitespace::new(before, after));
        self
    }

    /// Forget every whitespace element rule.
    pub fn clear_whitespace_elements(mut self) -> Self {
        self.config.whitespace_elements.clear();
        self
    }

    /// Keep HTML comments.
    pub fn allow_comments(mut self, allow: bool) -> Self {
        self.config.allow_comments = Some(allow);
        self
    }

    /// When comments are not allowed, keep them as visible literal text
    /// instead of removing them.
    pub fn escape_comments(mut self, escape: bool) -> Self {
        self.config.escape_comments = Some(escape);
        self
    }

    /// Keep a doctype, normalized to `<!DOCTYPE html>`.
    pub fn allow_doctype(mut self, allow: bool) -> Self {
        self.config.allow_doctype = Some(allow);
        self
    }

    /// Serialize as HTML or XHTML.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = Some(format);
        self
    }

    /// Output character encoding. Validated when a sanitize call serializes.
    pub fn output_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.config.output_encoding = Some(encoding.into());
        self
    }

    /// Merge a CSS sub-policy into the current one.
    pub fn css(mut self, css: CssPolicy) -> Self {
        self.config.css = self.config.css.merge(&css);
        self
    }

    /// Append a custom transformer to the depth-first pipeline. Custom
    /// transformers run before the built-in ones, in registration order.
    pub fn transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.config.transformers.push(Arc::new(transformer));
        self
    }

    /// Append a custom transformer to the breadth-first pre-pass.
    pub fn breadth_transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.config.breadth_transformers.push(Arc::new(transformer));
        self
    }

    /// Deep-merge another policy into this one (see [`PolicyConfig::merge`]).
    pub fn merge(mut self, other: &PolicyConfig) -> Self {
        self.config = self.config.merge(other);
        self
    }

    /// Finish the policy.
    pub fn build(self) -> PolicyConfig {
        self.config
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn lowercased<I, S>(names: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().to_ascii_lowercase())
}
