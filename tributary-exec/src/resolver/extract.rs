//! The extraction engine: reads declared record lists out of a parent
//! payload and turns them into parameter bindings for dependent fetches.

use std::collections::BTreeMap;

use serde_json::Value;

use tributary_core::address::{resolve_address, Address};
use tributary_core::types::ExtractionSpec;

use super::error::ExtractError;
use super::expand::ParamSet;

/// Columns extracted from one shared record list.
struct BindingGroup {
    address: Address,
    /// Parameter name to per-record values; all columns have the record
    /// list's length.
    columns: Vec<(String, Vec<Value>)>,
}

/// Applies every extraction spec to `payload` and returns, per child id, one
/// complete parameter set per future fetch task.
///
/// Pairing rule: specs reading the same `sourceAddress` originate from the
/// same record list and pair positionally, row by row. Specs reading
/// different addresses have no positional relationship; their row sets
/// combine by cartesian product.
pub fn extract_bindings(
    payload: &Value,
    specs: &[ExtractionSpec],
) -> Result<BTreeMap<String, Vec<ParamSet>>, ExtractError> {
    let mut groups: BTreeMap<String, Vec<BindingGroup>> = BTreeMap::new();

    for spec in specs {
        let column = extract_column(payload, &spec.source_address, &spec.record_key)?;
        let child_groups = groups.entry(spec.target_child_id.clone()).or_default();
        match child_groups.iter_mut().find(|g| g.address == spec.source_address) {
            Some(group) => group.columns.push((spec.parameter_name.clone(), column)),
            None => child_groups.push(BindingGroup {
                address: spec.source_address.clone(),
                columns: vec![(spec.parameter_name.clone(), column)],
            }),
        }
    }

    let mut out = BTreeMap::new();
    for (child_id, child_groups) in groups {
        out.insert(child_id, combine_groups(&child_groups));
    }
    Ok(out)
}

/// Reads `record_key` from every record in the list at `address`.
fn extract_column(
    payload: &Value,
    address: &Address,
    record_key: &str,
) -> Result<Vec<Value>, ExtractError> {
    let list = match resolve_address(payload, address) {
        Ok(Value::Array(items)) => items,
        _ => {
            return Err(ExtractError::NotAList {
                address: address.to_string(),
            })
        }
    };

    let mut column = Vec::with_capacity(list.len());
    for (index, record) in list.iter().enumerate() {
        let map = record.as_object().ok_or_else(|| ExtractError::NotARecord {
            address: address.to_string(),
            index,
        })?;
        let value = map
            .get(record_key)
            .ok_or_else(|| ExtractError::MissingRecordKey {
                address: address.to_string(),
                index,
                key: record_key.to_string(),
            })?;
        if !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
            return Err(ExtractError::NonScalar {
                address: address.to_string(),
                index,
                key: record_key.to_string(),
            });
        }
        column.push(value.clone());
    }
    Ok(column)
}

/// Positional rows within each group, cartesian product across groups.
fn combine_groups(groups: &[BindingGroup]) -> Vec<ParamSet> {
    let mut sets: Vec<ParamSet> = vec![ParamSet::new()];
    for group in groups {
        let rows = group_rows(group);
        if rows.is_empty() {
            // An empty record list anywhere means no complete binding exists.
            return Vec::new();
        }
        let mut next = Vec::with_capacity(sets.len() * rows.len());
        for set in &sets {
            for row in &rows {
                let mut merged = set.clone();
                merged.extend(row.iter().map(|(k, v)| (k.clone(), v.clone())));
                next.push(merged);
            }
        }
        sets = next;
    }
    sets
}

fn group_rows(group: &BindingGroup) -> Vec<ParamSet> {
    // All columns come from one record list, so they share its length.
    let len = group.columns.first().map_or(0, |(_, c)| c.len());
    (0..len)
        .map(|i| {
            group
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column[i].clone()))
                .collect()
        })
        .collect()
}
