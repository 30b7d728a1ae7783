use super::{Transformer, TransformerEnv, WhitelistDelta};
use crate::dom::NodeData;
use crate::error::Result;

/// Removes comments unless the policy allows them, or turns them into
/// visible text when `escape_comments` is set.
pub(crate) struct CommentPolicy;

impl Transformer for CommentPolicy {
    fn transform(&self, env: &mut TransformerEnv<'_>) -> Result<WhitelistDelta> {
        if env.is_whitelisted || env.config.allow_comments() {
            return Ok(WhitelistDelta::NoChange);
        }
        let Some(NodeData::Comment(text)) = env.doc.get(env.node) else {
            return Ok(WhitelistDelta::NoChange);
        };

        if env.config.escape_comments() {
            let literal = format!("<!--{text}-->");
            env.doc.replace(env.node, NodeData::Text(literal));
        } else {
            tracing::trace!("Removing comment");
            env.doc.detach(env.node);
        }
        Ok(WhitelistDelta::NoChange)
    }
}
