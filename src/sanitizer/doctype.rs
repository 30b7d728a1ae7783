use super::{Transformer, TransformerEnv, WhitelistDelta};
use crate::dom::{Doctype, NodeData};
use crate::error::Result;

/// Removes doctypes unless allowed, and reduces allowed ones to
/// `<!DOCTYPE html>`.
pub(crate) struct DoctypePolicy;

impl Transformer for DoctypePolicy {
    fn transform(&self, env: &mut TransformerEnv<'_>) -> Result<WhitelistDelta> {
        if env.is_whitelisted {
            return Ok(WhitelistDelta::NoChange);
        }
        let Some(NodeData::Doctype(doctype)) = env.doc.get(env.node) else {
            return Ok(WhitelistDelta::NoChange);
        };

        if !env.config.allow_doctype() {
            tracing::trace!("Removing doctype");
            env.doc.detach(env.node);
        } else if !doctype.is_html5() {
            tracing::trace!("Normalizing doctype {:?}", doctype.name);
            env.doc
                .update(env.node, |data| *data = NodeData::Doctype(Doctype::html5()));
        }
        Ok(WhitelistDelta::NoChange)
    }
}
