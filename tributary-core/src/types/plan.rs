use std::collections::BTreeMap;

use crate::types::FetchNode;

/// Static configuration for one resolution run: the API to talk to and the
/// root fetch nodes, each carrying its own tree of dependent templates.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IntegrationPlan {
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// Applied on top of per-node headers for every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(rename = "defaultHeaders")]
    pub default_headers: BTreeMap<String, String>,

    pub roots: Vec<FetchNode>,
}
