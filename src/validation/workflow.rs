//! Status workflow engine.
//!
//! Each ticket type has a finite-state machine defined as a static table
//! mapping every state to the states reachable in one transition. Terminal
//! states map to the empty slice. The engine is a pure lookup; it holds no
//! state between calls.

use std::str::FromStr;

use crate::models::{Status, TicketType};
use crate::validation::ValidationResult;

use Status::*;

const TASK_FLOW: &[(Status, &[Status])] = &[
    (Open, &[InProgress, Cancelled]),
    (InProgress, &[Completed, Blocked, Cancelled]),
    (Blocked, &[InProgress, Cancelled]),
    (Completed, &[]),
    (Cancelled, &[]),
];

const EPIC_FLOW: &[(Status, &[Status])] = &[
    (Planning, &[InProgress, Cancelled]),
    (InProgress, &[OnHold, Completed, Cancelled]),
    (OnHold, &[InProgress, Cancelled]),
    (Completed, &[]),
    (Cancelled, &[]),
];

const ISSUE_FLOW: &[(Status, &[Status])] = &[
    (Open, &[InProgress, Cancelled]),
    (InProgress, &[Testing, Blocked, Cancelled]),
    (Testing, &[Completed, InProgress]),
    (Blocked, &[InProgress, Cancelled]),
    (Completed, &[]),
    (Cancelled, &[]),
];

const PR_FLOW: &[(Status, &[Status])] = &[
    (Draft, &[ReadyForReview, Closed]),
    (ReadyForReview, &[InReview, Draft, Closed]),
    (InReview, &[ChangesRequested, Approved, Closed]),
    (ChangesRequested, &[ReadyForReview, Closed]),
    (Approved, &[Merged, Closed]),
    (Merged, &[]),
    (Closed, &[]),
];

const PROJECT_FLOW: &[(Status, &[Status])] = &[
    (Planning, &[Active, Cancelled]),
    (Active, &[OnHold, Completed, Cancelled]),
    (OnHold, &[Active, Cancelled]),
    (Completed, &[Archived]),
    (Cancelled, &[Archived]),
    (Archived, &[]),
];

/// The transition table for a ticket type.
pub fn flow(ticket_type: TicketType) -> &'static [(Status, &'static [Status])] {
    match ticket_type {
        TicketType::Task => TASK_FLOW,
        TicketType::Epic => EPIC_FLOW,
        TicketType::Issue => ISSUE_FLOW,
        TicketType::Pr => PR_FLOW,
        TicketType::Project => PROJECT_FLOW,
    }
}

/// All states a ticket of this type may be in.
pub fn states(ticket_type: TicketType) -> impl Iterator<Item = Status> {
    flow(ticket_type).iter().map(|(state, _)| *state)
}

/// The states reachable from `current` in one transition.
///
/// Returns the empty slice for terminal states and for states the type's
/// workflow does not contain at all.
pub fn legal_next_states(ticket_type: TicketType, current: Status) -> &'static [Status] {
    flow(ticket_type)
        .iter()
        .find(|(state, _)| *state == current)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

/// Validate a requested status change against the type's workflow.
///
/// Self-transitions are always legal (idempotent no-op). Any move out of a
/// terminal state fails; other illegal moves fail with the legal
/// alternatives listed in the error.
pub fn validate_transition(
    ticket_type: TicketType,
    current: &str,
    requested: &str,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    let current = match Status::from_str(current) {
        Ok(s) => s,
        Err(_) => {
            result.add_error(format!("unknown status: {}", current));
            return result;
        }
    };
    let requested = match Status::from_str(requested) {
        Ok(s) => s,
        Err(_) => {
            result.add_error(format!("unknown status: {}", requested));
            return result;
        }
    };

    if !states(ticket_type).any(|s| s == current) {
        result.add_error(format!(
            "'{}' is not a {} status",
            current, ticket_type
        ));
        return result;
    }

    if current == requested {
        return result;
    }

    let legal = legal_next_states(ticket_type, current);
    if legal.contains(&requested) {
        return result;
    }

    if legal.is_empty() {
        result.add_error(format!(
            "illegal {} transition: {} -> {} ('{}' is a terminal state)",
            ticket_type, current, requested, current
        ));
    } else {
        let alternatives: Vec<&str> = legal.iter().map(|s| s.as_str()).collect();
        result.add_error(format!(
            "illegal {} transition: {} -> {} (legal next states: {})",
            ticket_type,
            current,
            requested,
            alternatives.join(", ")
        ));
    }
    result
}

/// True when the state has no legal exits in the type's workflow.
pub fn is_terminal(ticket_type: TicketType, state: Status) -> bool {
    states(ticket_type).any(|s| s == state) && legal_next_states(ticket_type, state).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_transition_always_valid() {
        for ty in TicketType::all() {
            for state in states(*ty) {
                let result = validate_transition(*ty, state.as_str(), state.as_str());
                assert!(
                    result.valid,
                    "{} self-transition from {} should be valid",
                    ty, state
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        let terminals = [
            (TicketType::Task, Completed),
            (TicketType::Task, Cancelled),
            (TicketType::Epic, Completed),
            (TicketType::Issue, Cancelled),
            (TicketType::Pr, Merged),
            (TicketType::Pr, Closed),
            (TicketType::Project, Archived),
        ];
        for (ty, state) in terminals {
            assert!(is_terminal(ty, state), "{} {} should be terminal", ty, state);
            assert!(legal_next_states(ty, state).is_empty());
        }
        // Project completed/cancelled still move to archived
        assert!(!is_terminal(TicketType::Project, Completed));
        assert!(!is_terminal(TicketType::Project, Cancelled));
    }

    #[test]
    fn test_valid_transitions() {
        let cases = [
            (TicketType::Task, "open", "in_progress"),
            (TicketType::Task, "in_progress", "completed"),
            (TicketType::Epic, "planning", "in_progress"),
            (TicketType::Issue, "testing", "in_progress"),
            (TicketType::Pr, "draft", "ready_for_review"),
            (TicketType::Pr, "approved", "merged"),
            (TicketType::Project, "completed", "archived"),
        ];
        for (ty, from, to) in cases {
            let result = validate_transition(ty, from, to);
            assert!(result.valid, "{} {} -> {} should be legal", ty, from, to);
            assert!(result.errors.is_empty());
        }
    }

    #[test]
    fn test_illegal_transition_lists_alternatives() {
        let result = validate_transition(TicketType::Task, "open", "completed");
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("open -> completed"));
        assert!(result.errors[0].contains("in_progress, cancelled"));
    }

    #[test]
    fn test_transition_out_of_terminal_state() {
        let result = validate_transition(TicketType::Task, "completed", "open");
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("terminal state"));

        let result = validate_transition(TicketType::Pr, "merged", "draft");
        assert!(!result.valid);
    }

    #[test]
    fn test_status_from_wrong_type_rejected() {
        // "draft" is a PR state, not a task state
        let result = validate_transition(TicketType::Task, "draft", "open");
        assert!(!result.valid);
        assert!(result.errors[0].contains("not a task status"));
    }

    #[test]
    fn test_unknown_status_string() {
        let result = validate_transition(TicketType::Task, "open", "reopened");
        assert!(!result.valid);
        assert!(result.errors[0].contains("unknown status"));
    }

    #[test]
    fn test_legal_next_states_unknown_state_empty() {
        assert!(legal_next_states(TicketType::Task, Draft).is_empty());
    }
}
