//! Ticket validation core.
//!
//! Four independent validators and an orchestrator that composes them:
//! - [`schema`] - per-type field shape, enums, patterns, and ranges
//! - [`workflow`] - status transition rules per ticket type
//! - [`relationships`] - cross-ticket reference integrity and cycle detection
//! - [`rules`] - warning-only business heuristics
//!
//! All validators collect every violation instead of stopping at the first,
//! so one pass reports the complete defect list. They take read-only access
//! to caller-owned records and never mutate them.

pub mod relationships;
pub mod rules;
pub mod schema;
pub mod workflow;

use serde::Serialize;
use serde_json::Value;

use crate::config::ValidationLimits;
use crate::models::TicketType;

/// A ticket record as parsed from frontmatter: field name to value.
pub type Record = serde_json::Map<String, Value>;

/// Outcome of a validation pass.
///
/// `errors` are hard failures; `warnings` are advisory and never affect
/// `valid`. Created fresh per call and discarded after return.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create an empty, valid result.
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a hard failure.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    /// Record a soft issue. Never affects `valid`.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another result into this one, preserving ordering.
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Display label for a record in diagnostics: its ID when present.
pub(crate) fn record_label(record: &Record) -> &str {
    record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
}

/// Validation orchestrator.
///
/// Holds the configured limits for the rule-based checks. Construction is
/// explicit; there is no cached global configuration.
pub struct Validator {
    limits: ValidationLimits,
}

impl Validator {
    /// Create a validator with the given limits.
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Validate a single ticket record.
    ///
    /// Runs the schema validator, then (when `transition` names a requested
    /// target status) the workflow engine against the record's current
    /// status, then the business rules. Stage ordering in the merged result
    /// is stable: schema errors first, workflow next, rule warnings last.
    pub fn validate_ticket(
        &self,
        record: &Record,
        ticket_type: TicketType,
        transition: Option<&str>,
    ) -> ValidationResult {
        let mut result = schema::validate_schema(record, ticket_type);

        if let Some(requested) = transition {
            let current = record
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default();
            result.merge(workflow::validate_transition(
                ticket_type,
                current,
                requested,
            ));
        }

        result.merge(rules::apply_business_rules(record, ticket_type, &self.limits));
        result
    }

    /// Validate a collection of ticket records.
    ///
    /// Runs `validate_ticket` (without a transition) for every record in
    /// input order, checks ID uniqueness, then runs the relationship pass
    /// once over the whole set.
    pub fn validate_collection(&self, records: &[Record]) -> ValidationResult {
        let mut result = ValidationResult::new();

        for record in records {
            match record
                .get("id")
                .and_then(Value::as_str)
                .and_then(TicketType::from_id)
            {
                Some(ticket_type) => {
                    result.merge(self.validate_ticket(record, ticket_type, None));
                }
                None => {
                    result.add_error(format!(
                        "{}: cannot determine ticket type from ID",
                        record_label(record)
                    ));
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        for record in records {
            if let Some(id) = record.get("id").and_then(Value::as_str) {
                if !seen.insert(id) {
                    result.add_error(format!("duplicate ticket ID: {}", id));
                }
            }
        }

        result.merge(relationships::validate_relationships(records, &self.limits));
        result
    }
}
