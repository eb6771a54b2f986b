use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;

use tributary_core::types::path_placeholders;

use super::error::ResolveError;
use super::expand::ParamSet;

/// Builds the concrete request URL for a node: every `{name}` token in the
/// path template is replaced by its bound value, percent-encoded. Root nodes
/// pass an empty parameter map and must carry no placeholders.
pub fn build_url(base_url: &str, path_template: &str, params: &ParamSet) -> Result<Url, ResolveError> {
    let mut path = path_template.to_string();
    for (name, value) in params {
        let token = format!("{{{name}}}");
        if !path.contains(&token) {
            continue;
        }
        let segment = scalar_segment(value).ok_or_else(|| ResolveError::NonScalarParameter {
            id: path_template.to_string(),
            name: name.clone(),
        })?;
        let encoded = urlencoding::encode(&segment);
        path = path.replace(&token, encoded.as_ref());
    }

    if let Some(name) = path_placeholders(&path).into_iter().next() {
        return Err(ResolveError::UnboundParameter {
            id: path_template.to_string(),
            name,
        });
    }

    // Base URL and path concatenate verbatim, as configured.
    let full = format!("{base_url}{path}");
    Url::parse(&full).map_err(|source| ResolveError::InvalidUrl {
        id: path_template.to_string(),
        source,
    })
}

fn scalar_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Node headers with the engine-wide defaults applied on top.
pub fn merge_headers(
    node_headers: &BTreeMap<String, String>,
    defaults: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = node_headers.clone();
    for (k, v) in defaults {
        merged.insert(k.clone(), v.clone());
    }
    merged
}
