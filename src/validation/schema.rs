//! Schema validation for ticket records.
//!
//! Each ticket type has a static field table (name, expected kind, required
//! flag). Validation walks the table and the record once, collecting every
//! violation: missing required fields, kind mismatches, enum violations, ID
//! pattern mismatches, out-of-range numerics, title length, and the
//! `updated_at >= created_at` invariant. Fields outside the table (and
//! anything under `metadata`) are left alone.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::models::{Priority, TicketType};
use crate::validation::{Record, ValidationResult, record_label, workflow};

/// Expected semantic kind of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Number,
    Bool,
    List,
    Map,
    Timestamp,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Number => "number",
            FieldKind::Bool => "boolean",
            FieldKind::List => "list",
            FieldKind::Map => "mapping",
            FieldKind::Timestamp => "timestamp",
        }
    }
}

/// One entry in a ticket type's field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn req(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef {
        name,
        kind,
        required: false,
    }
}

use FieldKind::*;

/// Fields shared by every ticket type.
const COMMON_FIELDS: &[FieldDef] = &[
    req("id", Str),
    req("title", Str),
    req("status", Str),
    req("priority", Str),
    req("created_at", Timestamp),
    req("updated_at", Timestamp),
    opt("type", Str),
    opt("description", Str),
    opt("assignees", List),
    opt("tags", List),
    opt("labels", List),
    opt("dependencies", List),
    opt("parent", Str),
    opt("metadata", Map),
];

const TASK_FIELDS: &[FieldDef] = &[
    opt("due_date", Timestamp),
    opt("estimated_hours", Number),
    opt("actual_hours", Number),
];

const EPIC_FIELDS: &[FieldDef] = &[
    opt("goal", Str),
    opt("business_value", Str),
    opt("success_criteria", Str),
    opt("target_date", Timestamp),
    opt("child_issues", List),
    opt("progress_percentage", Number),
];

const ISSUE_FIELDS: &[FieldDef] = &[
    opt("issue_type", Str),
    opt("severity", Str),
    opt("steps_to_reproduce", Str),
    opt("expected_behavior", Str),
    opt("actual_behavior", Str),
    opt("child_tasks", List),
    opt("related_prs", List),
    opt("estimated_hours", Number),
    opt("actual_hours", Number),
];

const PR_FIELDS: &[FieldDef] = &[
    opt("pr_type", Str),
    opt("source_branch", Str),
    opt("target_branch", Str),
    opt("reviewers", List),
    opt("breaking_changes", Bool),
    opt("lines_added", Number),
    opt("lines_deleted", Number),
    opt("test_coverage", Number),
    opt("related_issues", List),
];

const PROJECT_FIELDS: &[FieldDef] = &[
    opt("team_members", List),
    opt("start_date", Timestamp),
    opt("end_date", Timestamp),
    opt("progress_percentage", Number),
    opt("repository", Str),
];

const SEVERITY_VALUES: &[&str] = &["low", "medium", "high", "critical"];
const ISSUE_TYPE_VALUES: &[&str] = &["bug", "feature", "enhancement", "documentation", "question"];
const PR_TYPE_VALUES: &[&str] = &["feature", "bug_fix", "refactor", "documentation", "other"];

/// Fields that must be >= 0 when present.
const NON_NEGATIVE_FIELDS: &[&str] =
    &["estimated_hours", "actual_hours", "lines_added", "lines_deleted"];

/// Fields bounded to [0, 100] when present.
const PERCENTAGE_FIELDS: &[&str] = &["progress_percentage", "test_coverage"];

const TITLE_MAX_LEN: usize = 300;

/// Type-specific field table for a ticket type (excluding common fields).
pub fn type_fields(ticket_type: TicketType) -> &'static [FieldDef] {
    match ticket_type {
        TicketType::Task => TASK_FIELDS,
        TicketType::Epic => EPIC_FIELDS,
        TicketType::Issue => ISSUE_FIELDS,
        TicketType::Pr => PR_FIELDS,
        TicketType::Project => PROJECT_FIELDS,
    }
}

/// Parse an ISO-8601 timestamp, with or without a timezone offset.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Frontmatter written by other tools may carry naive local timestamps
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn kind_matches(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::Str => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::Bool => value.is_boolean(),
        FieldKind::List => value.is_array(),
        FieldKind::Map => value.is_object(),
        // Shape only; content is checked separately for a clearer message
        FieldKind::Timestamp => value.is_string(),
    }
}

/// Validate a record's shape against its type's field table.
///
/// Pure function over its inputs; collects every violation rather than
/// stopping at the first.
pub fn validate_schema(record: &Record, ticket_type: TicketType) -> ValidationResult {
    let mut result = ValidationResult::new();
    let label = record_label(record).to_string();

    for field in COMMON_FIELDS.iter().chain(type_fields(ticket_type)) {
        check_field(&mut result, &label, record, field);
    }

    check_id_pattern(&mut result, &label, record, ticket_type);
    check_enums(&mut result, &label, record, ticket_type);
    check_numeric_ranges(&mut result, &label, record);
    check_title_length(&mut result, &label, record);
    check_timestamp_order(&mut result, &label, record);

    result
}

fn check_field(result: &mut ValidationResult, label: &str, record: &Record, field: &FieldDef) {
    match record.get(field.name) {
        None | Some(Value::Null) => {
            if field.required {
                result.add_error(format!(
                    "{}: missing required field '{}'",
                    label, field.name
                ));
            }
        }
        Some(value) => {
            if !kind_matches(field.kind, value) {
                result.add_error(format!(
                    "{}: field '{}' must be a {}, got {}",
                    label,
                    field.name,
                    field.kind.name(),
                    value_kind(value)
                ));
            } else if field.kind == FieldKind::Timestamp {
                if let Some(raw) = value.as_str() {
                    if parse_timestamp(raw).is_none() {
                        result.add_error(format!(
                            "{}: field '{}' is not a valid ISO-8601 timestamp: '{}'",
                            label, field.name, raw
                        ));
                    }
                }
            }
        }
    }
}

fn check_id_pattern(
    result: &mut ValidationResult,
    label: &str,
    record: &Record,
    ticket_type: TicketType,
) {
    if let Some(id) = record.get("id").and_then(Value::as_str) {
        if !ticket_type.id_pattern().is_match(id) {
            result.add_error(format!(
                "{}: ID '{}' does not match the {} pattern {}-<number>",
                label,
                id,
                ticket_type,
                ticket_type.id_prefix()
            ));
        }
    }
}

fn check_enum_value(
    result: &mut ValidationResult,
    label: &str,
    record: &Record,
    field: &str,
    allowed: &[&str],
) {
    if let Some(value) = record.get(field).and_then(Value::as_str) {
        if !allowed.contains(&value) {
            result.add_error(format!(
                "{}: invalid {} '{}' (expected one of: {})",
                label,
                field,
                value,
                allowed.join(", ")
            ));
        }
    }
}

fn check_enums(
    result: &mut ValidationResult,
    label: &str,
    record: &Record,
    ticket_type: TicketType,
) {
    let statuses: Vec<&str> = workflow::states(ticket_type).map(|s| s.as_str()).collect();
    check_enum_value(result, label, record, "status", &statuses);

    let priorities: Vec<&str> = Priority::all()
        .iter()
        .map(|p| match p {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        })
        .collect();
    check_enum_value(result, label, record, "priority", &priorities);

    match ticket_type {
        TicketType::Issue => {
            check_enum_value(result, label, record, "severity", SEVERITY_VALUES);
            check_enum_value(result, label, record, "issue_type", ISSUE_TYPE_VALUES);
        }
        TicketType::Pr => {
            check_enum_value(result, label, record, "pr_type", PR_TYPE_VALUES);
        }
        _ => {}
    }
}

fn check_numeric_ranges(result: &mut ValidationResult, label: &str, record: &Record) {
    for field in NON_NEGATIVE_FIELDS {
        if let Some(n) = record.get(*field).and_then(Value::as_f64) {
            if n < 0.0 {
                result.add_error(format!(
                    "{}: field '{}' must be non-negative, got {}",
                    label, field, n
                ));
            }
        }
    }
    for field in PERCENTAGE_FIELDS {
        if let Some(n) = record.get(*field).and_then(Value::as_f64) {
            if !(0.0..=100.0).contains(&n) {
                result.add_error(format!(
                    "{}: field '{}' must be between 0 and 100, got {}",
                    label, field, n
                ));
            }
        }
    }
}

fn check_title_length(result: &mut ValidationResult, label: &str, record: &Record) {
    if let Some(title) = record.get("title").and_then(Value::as_str) {
        let len = title.chars().count();
        if len == 0 || len > TITLE_MAX_LEN {
            result.add_error(format!(
                "{}: title must be 1-{} characters, got {}",
                label, TITLE_MAX_LEN, len
            ));
        }
    }
}

fn check_timestamp_order(result: &mut ValidationResult, label: &str, record: &Record) {
    let created = record
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    let updated = record
        .get("updated_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    if let (Some(created), Some(updated)) = (created, updated) {
        if updated < created {
            result.add_error(format!("{}: updated_at precedes created_at", label));
        }
    }
}
