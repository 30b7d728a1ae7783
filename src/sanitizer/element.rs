//! Element and attribute allow-listing.

use std::sync::LazyLock;

use regex::Regex;

use super::{Transformer, TransformerEnv, WhitelistDelta};
use crate::config::PolicyConfig;
use crate::css::CssSanitizer;
use crate::dom::{Document, NodeData, NodeId, NodeKind};
use crate::error::Result;
use crate::protocol;

/// Valid names for arbitrary `data-*` attributes.
static DATA_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\Adata-[a-z_][a-zA-Z0-9_.\x{E0}-\x{F6}\x{F8}-\x{17F}\x{1DD}-\x{2AF}-]*\z")
        .expect("data attribute pattern is valid")
});

/// Attributes whose spaces and double quotes are always percent-encoded.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action"];

/// Removes disallowed elements and filters the attributes of allowed ones.
pub(crate) struct ElementPolicy;

impl Transformer for ElementPolicy {
    fn transform(&self, env: &mut TransformerEnv<'_>) -> Result<WhitelistDelta> {
        if env.is_whitelisted || env.doc.kind(env.node) != Some(NodeKind::Element) {
            return Ok(WhitelistDelta::NoChange);
        }

        let name = env.node_name.as_str();
        if !env.config.allows_element(name) {
            remove_element(env.doc, env.node, name, env.config);
            return Ok(WhitelistDelta::NoChange);
        }

        filter_attributes(env.doc, env.node, name, env.config);
        if name == "style" {
            clean_style_element(env.doc, env.node, env.config);
        }

        Ok(WhitelistDelta::NoChange)
    }
}

fn remove_element(doc: &mut Document, node: NodeId, name: &str, config: &PolicyConfig) {
    tracing::trace!("Removing disallowed element <{name}>");

    if let Some(whitespace) = config.whitespace_for(name) {
        if !whitespace.before.is_empty() {
            doc.insert_before(node, NodeData::Text(whitespace.before.clone()));
        }
        if !whitespace.after.is_empty() && doc.has_children(node) {
            doc.insert_after(node, NodeData::Text(whitespace.after.clone()));
        }
    }

    if config.remove_contents().applies_to(name) || !doc.splice(node) {
        doc.detach(node);
    }
}

pub(crate) fn is_data_attribute(name: &str) -> bool {
    !name.starts_with("data-xml") && DATA_ATTRIBUTE.is_match(name)
}

fn filter_attributes(doc: &mut Document, node: NodeId, name: &str, config: &PolicyConfig) {
    let per_element = config.attributes_for(name);
    let all = config.all_attributes();
    let allow_data = per_element.is_some_and(|set| set.allows_data()) || all.allows_data();
    let protocols = config.protocols_for(name);

    doc.update_element(node, |element| {
        element.retain_attrs(|attr, value| {
            let listed = per_element.is_some_and(|set| set.contains(attr)) || all.contains(attr);
            if !listed && !(allow_data && is_data_attribute(attr)) {
                tracing::trace!("Removing attribute {attr} from <{name}>");
                return false;
            }

            let Some(allowed) = protocols.and_then(|by_attr| by_attr.get(attr)) else {
                return true;
            };
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
            if !protocol::is_allowed(value, allowed) {
                tracing::trace!("Removing attribute {attr} from <{name}> for its protocol");
                return false;
            }
            true
        });

        if let Some(added) = config.added_attributes(name) {
            for (attr, value) in added {
                element.set_attr(attr, value);
            }
        }

        if let Some(style) = element.attr("style") {
            let css = CssSanitizer::new(config.css()).sanitize_properties(style);
            if css.trim().is_empty() {
                element.remove_attr("style");
            } else {
                element.set_attr("style", &css);
            }
        }

        element.update_attrs(|attr, value| {
            let quoted = URL_ATTRIBUTES.contains(&attr) || (name == "a" && attr == "name");
            if quoted && value.contains([' ', '"']) {
                *value = value.replace('"', "%22").replace(' ', "%20");
            }
        });
    });
}

fn clean_style_element(doc: &mut Document, node: NodeId, config: &PolicyConfig) {
    let css = CssSanitizer::new(config.css()).sanitize_stylesheet(&doc.text_content(node));
    if css.trim().is_empty() {
        tracing::trace!("Removing <style> element with no allowed rules");
        doc.detach(node);
        return;
    }
    doc.clear_children(node);
    doc.append(node, NodeData::Text(css));
}
