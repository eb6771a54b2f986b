use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::address::Address;
use crate::types::{ExtractionSpec, SubtableSpec};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("valid regex"));

/// Names of every `{name}` token in a path template, in order of appearance.
pub fn path_placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// One declared REST call: a path template, its request shape, and the
/// extraction rules that parametrize its dependent calls.
///
/// Nodes are immutable templates. The resolution engine never mutates a
/// template in place; fan-out produces fresh concrete tasks by merging
/// extracted bindings over a clone (see `tributary-exec`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FetchNode {
    /// Endpoint path template, e.g. `/users/{userID}/orders`.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "targetTable")]
    pub target_table: Option<String>,

    #[serde(default)]
    pub request: RequestTemplate,

    /// Parameter name to candidate values. Extraction output overrides
    /// entries declared here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(rename = "boundParameters")]
    pub bound_parameters: BTreeMap<String, Vec<Value>>,

    /// Where the actual payload lives inside a response envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "topLevelDataAddress")]
    pub top_level_data_address: Option<Address>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde(rename = "extractionSpecs")]
    pub extraction_specs: Vec<ExtractionSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtables: Vec<SubtableSpec>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(rename = "dependentTemplates")]
    pub dependent_templates: BTreeMap<String, FetchNode>,
}

impl FetchNode {
    /// Destination table, defaulting to the node id.
    pub fn table(&self) -> &str {
        self.target_table.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RequestTemplate {
    #[serde(default)]
    pub method: HttpMethod,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// The fixed set of request verbs the engine can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Put,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}
