//! Subtable promotion: a pure data-shape transform over an already fetched
//! payload, independent of the fetch fan-out.

use serde_json::Value;

use tributary_core::address::resolve_address;
use tributary_core::types::{SubRecord, SubtableSpec};

use super::error::ResolveError;

/// Emits one sub-record per subtable spec. The parent's id property is
/// copied into the sub-payload (under the id property's final key name, or
/// `parentId` when the address ends in an index) for the downstream
/// foreign-key join.
pub fn subtable_records(
    id: &str,
    payload: &Value,
    specs: &[SubtableSpec],
) -> Result<Vec<SubRecord>, ResolveError> {
    let mut out = Vec::with_capacity(specs.len());
    for spec in specs {
        let wrap = |source| ResolveError::Address {
            id: id.to_string(),
            source,
        };
        let sub = resolve_address(payload, &spec.address).map_err(wrap)?.clone();
        let parent_id = resolve_address(payload, &spec.id_property).map_err(wrap)?.clone();
        let key = spec.id_property.last_key().unwrap_or("parentId").to_string();

        out.push(SubRecord {
            target_table: spec.target_table.clone(),
            payload: attach_parent_id(sub, &key, &parent_id),
        });
    }
    Ok(out)
}

fn attach_parent_id(sub: Value, key: &str, parent_id: &Value) -> Value {
    match sub {
        Value::Object(mut map) => {
            map.insert(key.to_string(), parent_id.clone());
            Value::Object(map)
        }
        // A list subtable gets the id on every element; the converter
        // decides whether that becomes one row per element.
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| attach_parent_id(v, key, parent_id))
                .collect(),
        ),
        other => other,
    }
}
