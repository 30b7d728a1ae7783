//! CSS allow-list filtering for `style` attributes and `<style>` elements.

mod tree;

pub use tree::{
    AtRuleBlock, Component, CssNode, parse_properties, parse_stylesheet, strip_comments, stringify,
};

use crate::config::CssPolicy;
use crate::protocol;

/// Functions whose string arguments are URLs.
const URL_FUNCTIONS: &[&str] = &["url", "src", "image-set", "-webkit-image-set"];

/// Applies a [`CssPolicy`] to CSS text or to an already-parsed tree.
///
/// # Example
///
/// ```
/// use html_sanitize::{CssPolicy, CssSanitizer};
///
/// let policy = CssPolicy::new().properties(["color"]);
/// let css = CssSanitizer::new(&policy);
/// assert_eq!(css.sanitize_properties("color: red; position: fixed;"), "color: red; ");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct CssSanitizer<'a> {
    policy: &'a CssPolicy,
}

impl<'a> CssSanitizer<'a> {
    /// A sanitizer for `policy`.
    pub fn new(policy: &'a CssPolicy) -> Self {
        Self { policy }
    }

    /// Sanitize a declaration list such as a `style` attribute value.
    pub fn sanitize_properties(&self, css: &str) -> String {
        let mut nodes = parse_properties(css);
        self.filter_tree(&mut nodes);
        stringify(&nodes)
    }

    /// Sanitize a full stylesheet.
    pub fn sanitize_stylesheet(&self, css: &str) -> String {
        let mut nodes = parse_stylesheet(css);
        self.filter_tree(&mut nodes);
        stringify(&nodes)
    }

    /// Remove every node the policy does not allow, recursing into rules.
    pub fn filter_tree(&self, nodes: &mut Vec<CssNode>) {
        nodes.retain_mut(|node| self.keep(node));
    }

    fn keep(&self, node: &mut CssNode) -> bool {
        let keep = match node {
            CssNode::Whitespace(_) => true,
            CssNode::Comment(_) => self.policy.comments_allowed(),
            CssNode::Property {
                name, components, ..
            } => self.keep_property(name, components),
            CssNode::AtRule {
                name,
                prelude,
                block,
                ..
            } => self.keep_at_rule(name, prelude, block),
            CssNode::StyleRule { children, .. } => {
                self.filter_tree(children);
                true
            }
        };
        if keep && !self.policy.comments_allowed() {
            drop_inner_comments(node);
        }
        keep
    }

    fn keep_property(&self, name: &str, components: &[Component]) -> bool {
        let name = if self.policy.hacks_allowed() {
            name.strip_prefix(['*', '_']).unwrap_or(name)
        } else {
            name
        };

        if !self.policy.allows_property(name) {
            tracing::trace!("Dropping CSS property {name}");
            return false;
        }
        if !self.components_allowed(components) {
            tracing::trace!("Dropping CSS property {name} with an unsafe value");
            return false;
        }
        true
    }

    fn keep_at_rule(&self, name: &str, prelude: &[Component], block: &mut AtRuleBlock) -> bool {
        if !self.policy.allows_at_rule(name) {
            tracing::trace!("Dropping CSS at-rule @{name}");
            return false;
        }

        let raw = match std::mem::replace(block, AtRuleBlock::None) {
            AtRuleBlock::Raw(raw) => Some(raw),
            _ => None,
        };

        match raw {
            Some(raw) if self.policy.at_rule_has_styles(name) => {
                let mut rules = parse_stylesheet(&raw);
                self.filter_tree(&mut rules);
                *block = AtRuleBlock::Rules(rules);
                true
            }
            Some(raw) if self.policy.at_rule_has_properties(name) => {
                let mut properties = parse_properties(&raw);
                self.filter_tree(&mut properties);
                *block = AtRuleBlock::Properties(properties);
                true
            }
            // Other at-rules keep their prelude only, and only if it is safe.
            // Bare strings there are URLs (`@import 'x.css'`).
            _ => {
                let allowed =
                    self.components_allowed(prelude) && self.string_urls_allowed(prelude);
                if !allowed {
                    tracing::trace!("Dropping CSS at-rule @{name} with an unsafe prelude");
                }
                allowed
            }
        }
    }

    /// Whether a value is free of `expression()` and disallowed URLs.
    fn components_allowed(&self, components: &[Component]) -> bool {
        let mut run = String::new();

        for component in components {
            match component {
                Component::Ident(ident) => {
                    run.push_str(&ident.to_ascii_lowercase());
                    continue;
                }
                Component::Function { name, args } => {
                    run.push_str(name);
                    if run.ends_with("expression") {
                        return false;
                    }
                    if URL_FUNCTIONS.contains(&name.as_str()) && !self.string_urls_allowed(args) {
                        return false;
                    }
                    if !self.components_allowed(args) {
                        return false;
                    }
                }
                Component::Url(url) => {
                    if !protocol::is_allowed(url, self.policy.allowed_protocols()) {
                        return false;
                    }
                }
                Component::BadUrl => return false,
                Component::Block(inner) => {
                    if !self.components_allowed(inner) {
                        return false;
                    }
                }
                Component::String(_) | Component::Whitespace | Component::Other => {}
            }
            run.clear();
        }

        true
    }

    /// Whether every string directly in `args` is an allowed URL.
    fn string_urls_allowed(&self, args: &[Component]) -> bool {
        args.iter().all(|arg| match arg {
            Component::String(url) => protocol::is_allowed(url, self.policy.allowed_protocols()),
            _ => true,
        })
    }
}

/// Remove comments that sit inside a kept node's source text.
fn drop_inner_comments(node: &mut CssNode) {
    match node {
        CssNode::Property { raw, .. } => *raw = strip_comments(raw),
        CssNode::AtRule { head, .. } => *head = strip_comments(head),
        CssNode::StyleRule { selector, .. } => *selector = strip_comments(selector),
        CssNode::Whitespace(_) | CssNode::Comment(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;

    fn policy() -> CssPolicy {
        CssPolicy::new()
            .properties(["background", "color", "width", "font-family", "src"])
            .at_rules(["media", "font-face", "import", "charset"])
            .at_rules_with_styles(["media"])
            .at_rules_with_properties(["font-face"])
            .protocols([Protocol::from("https"), Protocol::Relative])
    }

    #[test]
    fn disallowed_properties_are_dropped() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        assert_eq!(
            css.sanitize_properties("color: red; position: fixed; width: 1px"),
            "color: red;  width: 1px"
        );
    }

    #[test]
    fn expressions_are_rejected() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        for value in [
            "width: expression(alert(1))",
            "width: EXPRESSION(alert(1))",
            r"width: \65 xpression(alert(1))",
            "width: ex/**/pression(alert(1))",
            "width: calc(1px + expression(alert(1)))",
        ] {
            assert_eq!(css.sanitize_properties(value), "", "{value}");
        }
    }

    #[test]
    fn urls_are_protocol_checked() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        assert_eq!(
            css.sanitize_properties("background: url(https://example.com/a.png)"),
            "background: url(https://example.com/a.png)"
        );
        assert_eq!(css.sanitize_properties("background: url(/a.png)"), "background: url(/a.png)");
        for value in [
            "background: url(javascript:alert(1))",
            "background: url('javascript:alert(1)')",
            "background: url(http://example.com/a.png)",
            r#"background: image-set("javascript:alert(1)" 1x)"#,
            "background: url(a b)",
        ] {
            assert_eq!(css.sanitize_properties(value), "", "{value}");
        }
    }

    #[test]
    fn hacks_are_honored_only_when_allowed() {
        let strict = policy();
        assert_eq!(
            CssSanitizer::new(&strict).sanitize_properties("*color: red; _width: 1px"),
            " "
        );

        let lenient = policy().allow_hacks(true);
        assert_eq!(
            CssSanitizer::new(&lenient).sanitize_properties("*color: red; _width: 1px"),
            "*color: red; _width: 1px"
        );
    }

    #[test]
    fn comments_follow_the_policy() {
        let strict = policy();
        assert_eq!(
            CssSanitizer::new(&strict).sanitize_properties("/* hi */color: red"),
            "color: red"
        );
        let lenient = policy().allow_comments(true);
        assert_eq!(
            CssSanitizer::new(&lenient).sanitize_properties("/* hi */color: red"),
            "/* hi */color: red"
        );
    }

    #[test]
    fn style_rules_are_filtered_recursively() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        assert_eq!(
            css.sanitize_stylesheet("a { color: red; position: absolute; }"),
            "a { color: red;  }"
        );
    }

    #[test]
    fn at_rules_with_styles_are_reparsed() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        assert_eq!(
            css.sanitize_stylesheet("@media screen { p { color: red; top: 0 } }"),
            "@media screen { p { color: red; } }"
        );
    }

    #[test]
    fn at_rules_with_properties_are_reparsed() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        assert_eq!(
            css.sanitize_stylesheet(
                "@font-face { font-family: x; src: url(javascript:alert(1)) }"
            ),
            "@font-face { font-family: x; }"
        );
    }

    #[test]
    fn other_at_rules_lose_their_block() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        assert_eq!(css.sanitize_stylesheet("@charset 'utf-8';"), "@charset 'utf-8';");
        assert_eq!(css.sanitize_stylesheet("@charset 'utf-8' { a { } }"), "@charset 'utf-8' ;");
        assert_eq!(css.sanitize_stylesheet("@keyframes x { from { } }"), "");
        assert_eq!(css.sanitize_stylesheet("@import url(javascript:alert(1));"), "");
        assert_eq!(css.sanitize_stylesheet("@import url(/site.css);"), "@import url(/site.css);");
    }

    #[test]
    fn quoted_import_urls_are_protocol_checked() {
        let policy = policy();
        let css = CssSanitizer::new(&policy);
        assert_eq!(css.sanitize_stylesheet("@import 'javascript:alert(1)';"), "");
        assert_eq!(css.sanitize_stylesheet("@import \"http://evil.example/x.css\";"), "");
        assert_eq!(
            css.sanitize_stylesheet("@import 'https://example.com/x.css';"),
            "@import 'https://example.com/x.css';"
        );
        assert_eq!(css.sanitize_stylesheet("@import \"/site.css\";"), "@import \"/site.css\";");
    }

    #[test]
    fn comments_inside_values_and_selectors_are_dropped() {
        let strict = policy();
        let css = CssSanitizer::new(&strict);
        assert_eq!(css.sanitize_properties("color: /* secret */ red"), "color:  red");
        assert_eq!(
            css.sanitize_stylesheet("a /* x */ { color: red /* y */ }"),
            "a  { color: red  }"
        );
        assert_eq!(
            css.sanitize_stylesheet("@media /* m */ screen { p { color: /* c */ red; } }"),
            "@media  screen { p { color:  red; } }"
        );

        let lenient = policy().allow_comments(true);
        assert_eq!(
            CssSanitizer::new(&lenient).sanitize_properties("color: /* kept */ red"),
            "color: /* kept */ red"
        );
    }
}
