//! Business-rule heuristics.
//!
//! These are soft checks: every hit is a warning, never an error, and one
//! rule's outcome never suppresses another's. Thresholds come from
//! [`ValidationLimits`] rather than constants, so projects can tune them in
//! config.

use serde_json::Value;

use crate::config::ValidationLimits;
use crate::models::TicketType;
use crate::validation::{Record, ValidationResult, record_label};

fn str_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn is_blank(record: &Record, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn list_is_empty(record: &Record, field: &str) -> bool {
    match record.get(field).and_then(Value::as_array) {
        Some(items) => items.is_empty(),
        None => true,
    }
}

/// Apply the warning-only rules for a ticket type.
pub fn apply_business_rules(
    record: &Record,
    ticket_type: TicketType,
    limits: &ValidationLimits,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let label = record_label(record);

    match ticket_type {
        TicketType::Epic => {
            let priority = str_field(record, "priority").unwrap_or_default();
            if matches!(priority, "high" | "critical") && is_blank(record, "business_value") {
                result.add_warning(format!(
                    "{}: {} priority epic has no business_value",
                    label, priority
                ));
            }
        }
        TicketType::Issue => {
            if str_field(record, "issue_type") == Some("bug")
                && is_blank(record, "steps_to_reproduce")
            {
                result.add_warning(format!(
                    "{}: bug issue has no steps_to_reproduce",
                    label
                ));
            }
        }
        TicketType::Pr => {
            let added = record
                .get("lines_added")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let deleted = record
                .get("lines_deleted")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            if added + deleted > limits.large_change_lines && list_is_empty(record, "reviewers") {
                result.add_warning(format!(
                    "{}: large change ({} lines) has no reviewers",
                    label,
                    added + deleted
                ));
            }

            let breaking = record
                .get("breaking_changes")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let priority = str_field(record, "priority").unwrap_or_default();
            if breaking && !matches!(priority, "high" | "critical") {
                result.add_warning(format!(
                    "{}: breaking change should carry high or critical priority",
                    label
                ));
            }
        }
        TicketType::Project => {
            if str_field(record, "status") == Some("active")
                && list_is_empty(record, "team_members")
            {
                result.add_warning(format!("{}: active project has no team_members", label));
            }
        }
        TicketType::Task => {}
    }

    result
}
