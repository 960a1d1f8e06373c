//! Relationship integrity validation across a ticket collection.
//!
//! Builds a directed reference graph from the relationship fields of every
//! record and checks it for dangling references, type-incompatible
//! references, self-references, and cycles. Dependency edges and hierarchy
//! (parent/child) edges are cycled separately: a task may depend on a
//! sibling under the same parent without that being circular.
//!
//! Cycle detection is an iterative three-coloring depth-first traversal,
//! O(V+E) per edge kind, reporting the full cycle path for diagnostics.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::config::ValidationLimits;
use crate::models::TicketType;
use crate::validation::{Record, ValidationResult, record_label};

/// List-valued relationship fields and the ticket type their entries must
/// resolve to (`None` means any ticket type is acceptable).
const LIST_REF_FIELDS: &[(&str, Option<TicketType>)] = &[
    ("dependencies", None),
    ("child_tasks", Some(TicketType::Task)),
    ("child_issues", Some(TicketType::Issue)),
    ("related_issues", Some(TicketType::Issue)),
    ("related_prs", Some(TicketType::Pr)),
];

/// Ticket types a `parent` reference may resolve to, per source type.
fn allowed_parent_types(source: TicketType) -> Option<&'static [TicketType]> {
    match source {
        TicketType::Task => Some(&[TicketType::Issue, TicketType::Epic]),
        TicketType::Issue => Some(&[TicketType::Epic]),
        _ => None,
    }
}

/// Validate cross-ticket references over a whole collection.
pub fn validate_relationships(
    records: &[Record],
    limits: &ValidationLimits,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    // Resolve every usable ID to its type. Records without a recognizable
    // ID are reported by the per-ticket pass, not here.
    let mut types: HashMap<&str, TicketType> = HashMap::new();
    for record in records {
        if let Some(id) = record.get("id").and_then(Value::as_str) {
            if let Some(ty) = TicketType::from_id(id) {
                types.insert(id, ty);
            }
        }
    }

    let mut dependency_edges: Vec<(String, String)> = Vec::new();
    let mut hierarchy_edges: HashSet<(String, String)> = HashSet::new();

    for record in records {
        let label = record_label(record);
        let Some(source) = record.get("id").and_then(Value::as_str) else {
            continue;
        };
        let source_type = types.get(source).copied();

        // parent: single reference, child -> parent hierarchy edge
        if let Some(parent) = record.get("parent").and_then(Value::as_str) {
            if parent == source {
                result.add_error(format!("{}: ticket references itself in parent", label));
            } else if !types.contains_key(parent) {
                result.add_error(format!(
                    "{}: parent references missing ticket '{}'",
                    label, parent
                ));
            } else {
                if let (Some(source_type), Some(allowed)) =
                    (source_type, source_type.and_then(allowed_parent_types))
                {
                    let parent_type = types[parent];
                    if !allowed.contains(&parent_type) {
                        let expected: Vec<String> =
                            allowed.iter().map(|t| t.to_string()).collect();
                        result.add_error(format!(
                            "{}: {} parent must reference {}, got '{}' (a {})",
                            label,
                            source_type,
                            expected.join(" or "),
                            parent,
                            parent_type
                        ));
                    }
                }
                hierarchy_edges.insert((source.to_string(), parent.to_string()));
            }
        }

        // List-valued references
        for (field, expected_type) in LIST_REF_FIELDS {
            let Some(items) = record.get(*field).and_then(Value::as_array) else {
                continue;
            };
            for item in items {
                let Some(target) = item.as_str() else {
                    result.add_error(format!(
                        "{}: field '{}' contains a non-string entry",
                        label, field
                    ));
                    continue;
                };

                if target == source {
                    result.add_error(format!(
                        "{}: ticket references itself in {}",
                        label, field
                    ));
                    continue;
                }
                if !types.contains_key(target) {
                    result.add_error(format!(
                        "{}: {} references missing ticket '{}'",
                        label, field, target
                    ));
                    continue;
                }
                if let Some(expected) = expected_type {
                    let target_type = types[target];
                    if target_type != *expected {
                        result.add_error(format!(
                            "{}: {} must reference {}s, got '{}' (a {})",
                            label, field, expected, target, target_type
                        ));
                    }
                }

                match *field {
                    "dependencies" => {
                        dependency_edges.push((source.to_string(), target.to_string()));
                    }
                    // child lists point parent -> child; normalize to
                    // child -> parent so a matching `parent` field on the
                    // child does not read as a two-node cycle
                    "child_tasks" | "child_issues" => {
                        hierarchy_edges.insert((target.to_string(), source.to_string()));
                    }
                    _ => {}
                }
            }
        }

        // Fan-out heuristic: legal but suspicious
        if source_type == Some(TicketType::Issue) {
            if let Some(children) = record.get("child_tasks").and_then(Value::as_array) {
                if children.len() as u64 > limits.max_child_tasks {
                    result.add_warning(format!(
                        "{}: issue has {} child tasks (threshold {})",
                        label,
                        children.len(),
                        limits.max_child_tasks
                    ));
                }
            }
        }
    }

    for cycle in find_cycles(&dependency_edges) {
        result.add_error(format!("circular dependency: {}", cycle.join(" -> ")));
    }
    let mut hierarchy: Vec<(String, String)> = hierarchy_edges.into_iter().collect();
    hierarchy.sort();
    for cycle in find_cycles(&hierarchy) {
        result.add_error(format!("circular hierarchy: {}", cycle.join(" -> ")));
    }

    result
}

/// Find cycles in a directed edge list using three-coloring DFS.
///
/// Nodes are visited in sorted order so the reported paths are
/// deterministic. Each returned path starts and ends with the same node.
fn find_cycles(edges: &[(String, String)]) -> Vec<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (source, target) in edges {
        adjacency.entry(source).or_default().push(target);
        adjacency.entry(target).or_default();
    }

    let mut color: HashMap<&str, Color> =
        adjacency.keys().map(|node| (*node, Color::White)).collect();
    let mut cycles = Vec::new();

    let roots: Vec<&str> = adjacency.keys().copied().collect();
    for root in roots {
        if color[root] != Color::White {
            continue;
        }

        // Explicit stack of (node, next-child-index); `path` mirrors the
        // gray chain for cycle extraction
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        let mut path: Vec<&str> = vec![root];
        color.insert(root, Color::Gray);

        while let Some((node, index)) = stack.last_mut() {
            let children = &adjacency[*node];
            if *index < children.len() {
                let child = children[*index];
                *index += 1;
                match color[child] {
                    Color::White => {
                        color.insert(child, Color::Gray);
                        stack.push((child, 0));
                        path.push(child);
                    }
                    Color::Gray => {
                        // Back edge: the cycle is the gray path from the
                        // revisited node down to here, closed on itself
                        if let Some(start) = path.iter().position(|n| *n == child) {
                            let mut cycle: Vec<String> =
                                path[start..].iter().map(|n| n.to_string()).collect();
                            cycle.push(child.to_string());
                            cycles.push(cycle);
                        }
                    }
                    Color::Black => {}
                }
            } else {
                color.insert(*node, Color::Black);
                stack.pop();
                path.pop();
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn limits() -> ValidationLimits {
        ValidationLimits::default()
    }

    #[test]
    fn test_valid_hierarchy() {
        let records = vec![
            record(json!({ "id": "EP-0001", "child_issues": ["ISS-0001", "ISS-0002"] })),
            record(json!({ "id": "ISS-0001", "parent": "EP-0001", "child_tasks": ["TSK-0001", "TSK-0002"] })),
            record(json!({ "id": "ISS-0002", "parent": "EP-0001" })),
            record(json!({ "id": "TSK-0001", "parent": "ISS-0001" })),
            record(json!({ "id": "TSK-0002", "parent": "ISS-0001", "dependencies": ["TSK-0001"] })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(result.valid, "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_dangling_parent() {
        let records = vec![record(json!({ "id": "TSK-0001", "parent": "ISS-9999" }))];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0],
            "TSK-0001: parent references missing ticket 'ISS-9999'"
        );
    }

    #[test]
    fn test_dangling_dependency_names_field_and_target() {
        let records = vec![record(
            json!({ "id": "TSK-0001", "dependencies": ["TSK-0404"] }),
        )];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(result.errors[0].contains("TSK-0001"));
        assert!(result.errors[0].contains("dependencies"));
        assert!(result.errors[0].contains("TSK-0404"));
    }

    #[test]
    fn test_three_ticket_dependency_cycle() {
        let records = vec![
            record(json!({ "id": "TSK-0001", "dependencies": ["TSK-0002"] })),
            record(json!({ "id": "TSK-0002", "dependencies": ["TSK-0003"] })),
            record(json!({ "id": "TSK-0003", "dependencies": ["TSK-0001"] })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);

        let cycle_errors: Vec<&String> = result
            .errors
            .iter()
            .filter(|e| e.contains("circular dependency"))
            .collect();
        assert_eq!(cycle_errors.len(), 1);
        for id in ["TSK-0001", "TSK-0002", "TSK-0003"] {
            assert!(cycle_errors[0].contains(id));
        }
    }

    #[test]
    fn test_self_reference_distinct_from_cycle() {
        let records = vec![record(
            json!({ "id": "TSK-0003", "dependencies": ["TSK-0003"] }),
        )];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0],
            "TSK-0003: ticket references itself in dependencies"
        );
    }

    #[test]
    fn test_self_parent() {
        let records = vec![record(json!({ "id": "TSK-0001", "parent": "TSK-0001" }))];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(result.errors[0].contains("references itself in parent"));
    }

    #[test]
    fn test_parent_type_compatibility() {
        // A task may hang off an issue or an epic, but not a PR
        let records = vec![
            record(json!({ "id": "TSK-0001", "parent": "PR-0001" })),
            record(json!({ "id": "PR-0001" })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(result.errors[0].contains("task parent must reference issue or epic"));

        // An issue's parent must be an epic
        let records = vec![
            record(json!({ "id": "ISS-0001", "parent": "ISS-0002" })),
            record(json!({ "id": "ISS-0002" })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(result.errors[0].contains("issue parent must reference epic"));
    }

    #[test]
    fn test_child_list_type_compatibility() {
        let records = vec![
            record(json!({ "id": "ISS-0001", "child_tasks": ["EP-0001"] })),
            record(json!({ "id": "EP-0001" })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(result.errors[0].contains("child_tasks must reference tasks"));
        assert!(result.errors[0].contains("EP-0001"));
    }

    #[test]
    fn test_parent_and_child_list_agree_without_false_cycle() {
        // Both sides of the same parent/child link normalize to one edge
        let records = vec![
            record(json!({ "id": "EP-0001", "child_issues": ["ISS-0001"] })),
            record(json!({ "id": "ISS-0001", "parent": "EP-0001" })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_hierarchy_cycle_detected() {
        let records = vec![
            record(json!({ "id": "TSK-0001", "parent": "ISS-0001" })),
            record(json!({ "id": "ISS-0001", "parent": "EP-0001" })),
            record(json!({ "id": "EP-0001", "child_issues": [], "parent": "EP-0002" })),
            record(json!({ "id": "EP-0002", "parent": "EP-0001" })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("circular hierarchy"))
        );
    }

    #[test]
    fn test_dependency_cycle_and_dangling_both_reported() {
        let records = vec![
            record(json!({ "id": "TSK-0001", "dependencies": ["TSK-0002"], "parent": "ISS-9999" })),
            record(json!({ "id": "TSK-0002", "dependencies": ["TSK-0001"] })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("missing ticket 'ISS-9999'"))
        );
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("circular dependency"))
        );
    }

    #[test]
    fn test_shared_dependency_is_not_a_cycle() {
        // Diamond: two tasks depend on the same prerequisite
        let records = vec![
            record(json!({ "id": "TSK-0001", "dependencies": ["TSK-0003"] })),
            record(json!({ "id": "TSK-0002", "dependencies": ["TSK-0003"] })),
            record(json!({ "id": "TSK-0003" })),
        ];
        let result = validate_relationships(&records, &limits());
        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_fanout_warning_respects_limit() {
        let children: Vec<String> = (1..=25).map(|i| format!("TSK-{:04}", i)).collect();
        let mut records = vec![record(json!({ "id": "ISS-0001", "child_tasks": children }))];
        for i in 1..=25 {
            records.push(record(json!({ "id": format!("TSK-{:04}", i) })));
        }

        let result = validate_relationships(&records, &limits());
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("25 child tasks"));
        assert!(result.warnings[0].contains("threshold 20"));

        // Raising the threshold silences the warning
        let relaxed = ValidationLimits {
            max_child_tasks: 30,
            ..ValidationLimits::default()
        };
        let result = validate_relationships(&records, &relaxed);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_non_string_entry_reported() {
        let records = vec![record(json!({ "id": "TSK-0001", "dependencies": [42] }))];
        let result = validate_relationships(&records, &limits());
        assert!(!result.valid);
        assert!(result.errors[0].contains("non-string entry"));
    }

    #[test]
    fn test_find_cycles_empty_and_acyclic() {
        assert!(find_cycles(&[]).is_empty());
        let edges = vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
            ("a".to_string(), "c".to_string()),
        ];
        assert!(find_cycles(&edges).is_empty());
    }

    #[test]
    fn test_find_cycles_reports_full_path() {
        let edges = vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
            ("c".to_string(), "a".to_string()),
        ];
        let cycles = find_cycles(&edges);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_find_cycles_two_disjoint_cycles() {
        let edges = vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "a".to_string()),
            ("x".to_string(), "y".to_string()),
            ("y".to_string(), "x".to_string()),
        ];
        assert_eq!(find_cycles(&edges).len(), 2);
    }
}
