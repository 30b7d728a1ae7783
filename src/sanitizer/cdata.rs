use super::{Transformer, TransformerEnv, WhitelistDelta};
use crate::dom::NodeData;
use crate::error::Result;

/// Turns CDATA sections into ordinary (escaped) text.
pub(crate) struct CdataPolicy;

impl Transformer for CdataPolicy {
    fn transform(&self, env: &mut TransformerEnv<'_>) -> Result<WhitelistDelta> {
        if env.is_whitelisted {
            return Ok(WhitelistDelta::NoChange);
        }
        if let Some(NodeData::CData(text)) = env.doc.get(env.node) {
            let text = text.clone();
            env.doc.replace(env.node, NodeData::Text(text));
        }
        Ok(WhitelistDelta::NoChange)
    }
}
