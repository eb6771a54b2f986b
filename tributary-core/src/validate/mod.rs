//! Structural validation of an integration plan, run before resolution so
//! configuration mistakes fail fast instead of mid-run.

use std::collections::BTreeSet;

use crate::error::{ValidationError, Violation};
use crate::types::{path_placeholders, FetchNode, IntegrationPlan};

pub fn validate_plan(plan: &IntegrationPlan) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if plan.base_url.is_empty() {
        violations.push(Violation::new("$.baseUrl", "base URL must not be empty"));
    }
    if plan.roots.is_empty() {
        violations.push(Violation::new("$.roots", "plan declares no root nodes"));
    }

    for (idx, root) in plan.roots.iter().enumerate() {
        let path = format!("$.roots[{idx}]");

        // Roots have no parent response to extract from, so every path
        // parameter must be statically bound.
        for name in path_placeholders(&root.id) {
            if !root.bound_parameters.contains_key(&name) {
                violations.push(Violation::new(
                    &path,
                    format!("path parameter '{{{name}}}' has no value source"),
                ));
            }
        }

        let mut ancestry = vec![root.id.clone()];
        check_node(root, &path, &mut ancestry, &mut violations);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}

fn check_node(
    node: &FetchNode,
    path: &str,
    ancestry: &mut Vec<String>,
    violations: &mut Vec<Violation>,
) {
    let mut seen_bindings = BTreeSet::new();
    for (i, spec) in node.extraction_specs.iter().enumerate() {
        let spec_path = format!("{path}.extractionSpecs[{i}]");
        if !node.dependent_templates.contains_key(&spec.target_child_id) {
            violations.push(Violation::new(
                &spec_path,
                format!(
                    "target child '{}' is not a declared dependent template",
                    spec.target_child_id
                ),
            ));
        }
        if !seen_bindings.insert((spec.target_child_id.clone(), spec.parameter_name.clone())) {
            violations.push(Violation::new(
                &spec_path,
                format!(
                    "parameter '{}' of child '{}' is bound by more than one extraction spec",
                    spec.parameter_name, spec.target_child_id
                ),
            ));
        }
    }

    for (i, subtable) in node.subtables.iter().enumerate() {
        if subtable.target_table.is_empty() {
            violations.push(Violation::new(
                format!("{path}.subtables[{i}].targetTable"),
                "subtable target table must not be empty",
            ));
        }
    }

    for (child_id, child) in &node.dependent_templates {
        let child_path = format!("{path}.dependentTemplates['{child_id}']");

        if child.id != *child_id {
            violations.push(Violation::new(
                &child_path,
                format!(
                    "template id '{}' does not match its dependent-templates key",
                    child.id
                ),
            ));
        }

        // The dependent tree must stay a tree.
        if ancestry.iter().any(|a| a == &child.id) {
            violations.push(Violation::new(
                &child_path,
                format!("node '{}' reappears as its own descendant", child.id),
            ));
            continue;
        }

        // Every path placeholder needs a value source: an extraction spec
        // feeding this child, a static binding on the template, or a
        // placeholder the parent chain already binds.
        let parent_placeholders: BTreeSet<String> =
            ancestry.iter().flat_map(|a| path_placeholders(a)).collect();
        for name in path_placeholders(&child.id) {
            let fed = node
                .extraction_specs
                .iter()
                .any(|s| s.target_child_id == *child_id && s.parameter_name == name)
                || child.bound_parameters.contains_key(&name)
                || parent_placeholders.contains(&name);
            if !fed {
                violations.push(Violation::new(
                    &child_path,
                    format!("path parameter '{{{name}}}' has no value source"),
                ));
            }
        }

        ancestry.push(child.id.clone());
        check_node(child, &child_path, ancestry, violations);
        ancestry.pop();
    }
}
