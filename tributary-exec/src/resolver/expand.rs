//! Template instantiation: turning an immutable [`FetchNode`] template plus
//! extracted parameter bindings into concrete fetch tasks. Templates are
//! never mutated; every task owns its own merged copy.

use std::collections::BTreeMap;

use serde_json::Value;

use tributary_core::types::FetchNode;

/// One complete `parameter name -> concrete value` map for one fetch task.
pub type ParamSet = BTreeMap<String, Value>;

/// One concrete, dispatchable fetch: a node plus a single bound value per
/// path parameter. Consumed exactly once by the resolution engine.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub node: FetchNode,
    pub params: ParamSet,
}

/// Expands `template` into one task per extracted parameter set.
///
/// Merge precedence, lowest to highest: parameters inherited from the parent
/// task, static `boundParameters` on the template, extracted bindings. A
/// multi-valued static binding fans out by cartesian product, same as an
/// extra extraction group would. `targetTable` falls back to the child id.
pub fn instantiate(
    child_id: &str,
    template: &FetchNode,
    extracted: &[ParamSet],
    inherited: &ParamSet,
) -> Vec<FetchTask> {
    let mut sets: Vec<ParamSet> = if extracted.is_empty() {
        vec![ParamSet::new()]
    } else {
        extracted.to_vec()
    };

    for (name, values) in &template.bound_parameters {
        // Extracted bindings win over static template values.
        if sets.iter().any(|s| s.contains_key(name)) {
            continue;
        }
        sets = cartesian_extend(sets, name, values);
    }

    for set in &mut sets {
        for (name, value) in inherited {
            set.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }

    let mut node = template.clone();
    if node.target_table.is_none() {
        node.target_table = Some(child_id.to_string());
    }

    sets.into_iter()
        .map(|params| FetchTask {
            node: node.clone(),
            params,
        })
        .collect()
}

fn cartesian_extend(sets: Vec<ParamSet>, name: &str, values: &[Value]) -> Vec<ParamSet> {
    let mut out = Vec::with_capacity(sets.len() * values.len());
    for set in &sets {
        for value in values {
            let mut next = set.clone();
            next.insert(name.to_string(), value.clone());
            out.push(next);
        }
    }
    out
}
