//! Data models for Trackdown tickets.
//!
//! This module defines the core data structures:
//! - `TicketType` - The five ticket kinds (task, epic, issue, pr, project)
//! - `Status` - Workflow states across all ticket types
//! - `Priority` - Priority ladder shared by all types
//! - `Ticket` - A ticket record as stored in YAML frontmatter

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static TASK_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^TSK-\d+$").unwrap());
static EPIC_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^EP-\d+$").unwrap());
static ISSUE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ISS-\d+$").unwrap());
static PR_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^PR-\d+$").unwrap());
static PROJECT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^PROJ-\d+$").unwrap());

/// The kind of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    Task,
    Epic,
    Issue,
    Pr,
    Project,
}

impl TicketType {
    /// Get all ticket types.
    pub fn all() -> &'static [TicketType] {
        &[
            TicketType::Task,
            TicketType::Epic,
            TicketType::Issue,
            TicketType::Pr,
            TicketType::Project,
        ]
    }

    /// ID prefix for this type (e.g., "TSK" for tasks).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TicketType::Task => "TSK",
            TicketType::Epic => "EP",
            TicketType::Issue => "ISS",
            TicketType::Pr => "PR",
            TicketType::Project => "PROJ",
        }
    }

    /// Subdirectory name under `tickets/` for this type.
    pub fn dir_name(&self) -> &'static str {
        match self {
            TicketType::Task => "tsk",
            TicketType::Epic => "ep",
            TicketType::Issue => "iss",
            TicketType::Pr => "pr",
            TicketType::Project => "proj",
        }
    }

    /// Status a freshly created ticket of this type starts in.
    pub fn initial_status(&self) -> Status {
        match self {
            TicketType::Task | TicketType::Issue => Status::Open,
            TicketType::Epic | TicketType::Project => Status::Planning,
            TicketType::Pr => Status::Draft,
        }
    }

    /// Anchored regex the type's ticket IDs must match.
    pub fn id_pattern(&self) -> &'static Regex {
        match self {
            TicketType::Task => &TASK_ID,
            TicketType::Epic => &EPIC_ID,
            TicketType::Issue => &ISSUE_ID,
            TicketType::Pr => &PR_ID,
            TicketType::Project => &PROJECT_ID,
        }
    }

    /// Derive the ticket type from an ID's prefix (the segment before `-`).
    pub fn from_id(id: &str) -> Option<TicketType> {
        let prefix = id.split('-').next()?;
        TicketType::all()
            .iter()
            .copied()
            .find(|t| t.id_prefix() == prefix)
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketType::Task => "task",
            TicketType::Epic => "epic",
            TicketType::Issue => "issue",
            TicketType::Pr => "pr",
            TicketType::Project => "project",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TicketType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "task" => Ok(TicketType::Task),
            "epic" => Ok(TicketType::Epic),
            "issue" => Ok(TicketType::Issue),
            "pr" => Ok(TicketType::Pr),
            "project" => Ok(TicketType::Project),
            _ => Err(crate::Error::UnknownTicketType(s.to_string())),
        }
    }
}

/// Workflow state of a ticket.
///
/// This is the union of all per-type states; which states a given type may
/// use, and how it may move between them, is defined by the transition
/// tables in [`crate::validation::workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Completed,
    Cancelled,
    Blocked,
    Planning,
    OnHold,
    Testing,
    Draft,
    ReadyForReview,
    InReview,
    ChangesRequested,
    Approved,
    Merged,
    Closed,
    Active,
    Archived,
}

impl Status {
    /// The snake_case wire form of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
            Status::Blocked => "blocked",
            Status::Planning => "planning",
            Status::OnHold => "on_hold",
            Status::Testing => "testing",
            Status::Draft => "draft",
            Status::ReadyForReview => "ready_for_review",
            Status::InReview => "in_review",
            Status::ChangesRequested => "changes_requested",
            Status::Approved => "approved",
            Status::Merged => "merged",
            Status::Closed => "closed",
            Status::Active => "active",
            Status::Archived => "archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "open" => Ok(Status::Open),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "cancelled" => Ok(Status::Cancelled),
            "blocked" => Ok(Status::Blocked),
            "planning" => Ok(Status::Planning),
            "on_hold" => Ok(Status::OnHold),
            "testing" => Ok(Status::Testing),
            "draft" => Ok(Status::Draft),
            "ready_for_review" => Ok(Status::ReadyForReview),
            "in_review" => Ok(Status::InReview),
            "changes_requested" => Ok(Status::ChangesRequested),
            "approved" => Ok(Status::Approved),
            "merged" => Ok(Status::Merged),
            "closed" => Ok(Status::Closed),
            "active" => Ok(Status::Active),
            "archived" => Ok(Status::Archived),
            _ => Err(crate::Error::InvalidInput(format!(
                "unknown status: {}",
                s
            ))),
        }
    }
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// All legal priority values, low to critical.
    pub fn all() -> &'static [Priority] {
        &[
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(crate::Error::InvalidInput(format!(
                "unknown priority: {}",
                s
            ))),
        }
    }
}

/// A ticket record, mirroring the YAML frontmatter layout on disk.
///
/// Type-specific fields (`business_value`, `steps_to_reproduce`,
/// `lines_added`, ...) live in the flattened `extra` map so the struct can
/// round-trip any ticket type without five near-identical definitions. The
/// validation core consumes the serialized form of this struct, a plain
/// `serde_json::Map`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier (e.g., "TSK-0001")
    pub id: String,

    /// Ticket type marker
    #[serde(rename = "type")]
    pub ticket_type: TicketType,

    /// Ticket title
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Current workflow status
    pub status: Status,

    /// Priority level
    #[serde(default)]
    pub priority: Priority,

    /// Assigned users
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,

    /// Tags for categorization
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Parent ticket ID (task -> issue/epic, issue -> epic)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Ticket IDs this ticket depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Labels (free-form, unlike tags these are not used for filtering)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Open-ended extension mapping
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Type-specific fields (child_tasks, severity, lines_added, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Ticket {
    /// Create a new ticket with the given ID, type, and title.
    pub fn new(id: String, ticket_type: TicketType, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            ticket_type,
            title,
            description: String::new(),
            status: ticket_type.initial_status(),
            priority: Priority::default(),
            assignees: Vec::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            parent: None,
            dependencies: Vec::new(),
            labels: Vec::new(),
            metadata: serde_json::Map::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Serialize to the plain mapping form the validation core consumes.
    pub fn to_record(&self) -> crate::Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => unreachable!("a struct always serializes to an object"),
        }
    }
}
