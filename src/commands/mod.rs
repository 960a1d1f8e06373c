//! Command implementations for the Trackdown CLI.
//!
//! Each command is a free function taking the project directory first and
//! returning a result struct. Result structs implement [`Output`] so the
//! binary can render them as JSON (default) or human-readable text.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::models::{Priority, Status, Ticket, TicketType};
use crate::storage::{self, TicketStore};
use crate::validation::{Record, ValidationResult, Validator, workflow};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output: Serialize {
    /// Serialize to a JSON line.
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

// === init ===

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub initialized: bool,
    pub path: String,
}

impl Output for InitResult {
    fn to_human(&self) -> String {
        if self.initialized {
            format!("Initialized trackdown project at {}", self.path)
        } else {
            format!("Project already initialized at {}", self.path)
        }
    }
}

/// Initialize a trackdown project in the given directory.
pub fn init(project_dir: &Path, name: Option<String>) -> Result<InitResult> {
    if TicketStore::exists(project_dir) {
        return Ok(InitResult {
            initialized: false,
            path: project_dir.display().to_string(),
        });
    }

    TicketStore::init(project_dir)?;
    let mut config = Config::load(project_dir)?;
    if let Some(name) = name {
        config.data.project.name = name;
    }
    config.save()?;

    Ok(InitResult {
        initialized: true,
        path: project_dir.display().to_string(),
    })
}

// === create ===

#[derive(Debug, Serialize)]
pub struct CreateResult {
    pub id: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub title: String,
    pub status: Status,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Output for CreateResult {
    fn to_human(&self) -> String {
        let mut out = format!(
            "Created {} {}: {} [{}]",
            self.ticket_type, self.id, self.title, self.status
        );
        for warning in &self.warnings {
            out.push_str(&format!("\nwarning: {}", warning));
        }
        out
    }
}

/// Options for `create` beyond type and title.
#[derive(Debug, Default)]
pub struct CreateOptions {
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assignees: Vec<String>,
    pub tags: Vec<String>,
    pub parent: Option<String>,
    pub dependencies: Vec<String>,
}

/// Create a new ticket of the given type.
pub fn create(
    project_dir: &Path,
    ticket_type: &str,
    title: String,
    options: CreateOptions,
) -> Result<CreateResult> {
    let ticket_type = TicketType::from_str(ticket_type)?;
    let store = TicketStore::open(project_dir)?;
    let mut config = Config::load(project_dir)?;

    // References must resolve at creation time; deeper integrity checks
    // (type compatibility, cycles) run in `validate`
    for reference in options.parent.iter().chain(&options.dependencies) {
        let path = store.ticket_path(reference)?;
        if !path.exists() {
            return Err(Error::NotFound(reference.clone()));
        }
    }

    let id = store.next_id(ticket_type, &mut config)?;
    let mut ticket = Ticket::new(id.clone(), ticket_type, title);
    if let Some(description) = options.description {
        ticket.description = description;
    }
    if let Some(priority) = options.priority {
        ticket.priority = Priority::from_str(&priority)?;
    }
    ticket.assignees = options.assignees;
    ticket.tags = options.tags;
    ticket.parent = options.parent;
    ticket.dependencies = options.dependencies;

    let record = ticket.to_record()?;
    let validator = Validator::new(config.data.validation.clone());
    let result = validator.validate_ticket(&record, ticket_type, None);
    if !result.valid {
        return Err(Error::InvalidInput(format!(
            "refusing to create invalid ticket: {}",
            result.errors.join("; ")
        )));
    }

    let body = storage::default_body(&ticket.title, &ticket.description);
    let path = store.save_ticket(&ticket, &body)?;
    config.save()?;

    Ok(CreateResult {
        id: ticket.id,
        ticket_type,
        title: ticket.title,
        status: ticket.status,
        path: path.display().to_string(),
        warnings: result.warnings,
    })
}

// === list ===

#[derive(Debug, Serialize)]
pub struct TicketSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListResult {
    pub tickets: Vec<TicketSummary>,
    pub count: usize,
}

impl Output for ListResult {
    fn to_human(&self) -> String {
        if self.tickets.is_empty() {
            return "No tickets found".to_string();
        }
        let mut lines: Vec<String> = self
            .tickets
            .iter()
            .map(|t| {
                format!(
                    "{}  [{}/{}]  {}",
                    t.id, t.status, t.priority, t.title
                )
            })
            .collect();
        lines.push(format!("{} ticket(s)", self.count));
        lines.join("\n")
    }
}

fn str_or_empty(record: &Record, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn summarize(record: &Record) -> TicketSummary {
    let id = str_or_empty(record, "id");
    let ticket_type = TicketType::from_id(&id)
        .map(|t| t.to_string())
        .unwrap_or_default();
    TicketSummary {
        id,
        ticket_type,
        title: str_or_empty(record, "title"),
        status: str_or_empty(record, "status"),
        priority: str_or_empty(record, "priority"),
        tags: record
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        created_at: str_or_empty(record, "created_at"),
    }
}

/// List tickets, optionally filtered by type, status, and tag.
pub fn list(
    project_dir: &Path,
    ticket_type: Option<&str>,
    status: Option<&str>,
    tag: Option<&str>,
) -> Result<ListResult> {
    let store = TicketStore::open(project_dir)?;
    let type_filter = match ticket_type {
        Some(raw) => Some(TicketType::from_str(raw)?),
        None => None,
    };

    let (loaded, _failures) = store.load_all()?;
    let mut summaries: Vec<TicketSummary> = loaded
        .iter()
        .map(|t| summarize(&t.record))
        .filter(|s| {
            if let Some(ty) = type_filter {
                if TicketType::from_id(&s.id) != Some(ty) {
                    return false;
                }
            }
            if let Some(status) = status {
                if s.status != status {
                    return false;
                }
            }
            if let Some(tag) = tag {
                if !s.tags.iter().any(|t| t == tag) {
                    return false;
                }
            }
            true
        })
        .collect();

    // Newest first; ID as a stable tiebreak
    summaries.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let count = summaries.len();
    Ok(ListResult {
        tickets: summaries,
        count,
    })
}

// === show ===

#[derive(Debug, Serialize)]
pub struct ShowResult {
    pub ticket: Record,
    pub body: String,
}

impl Output for ShowResult {
    fn to_human(&self) -> String {
        let summary = summarize(&self.ticket);
        let mut out = format!(
            "{} ({})\n  Title:    {}\n  Status:   {}\n  Priority: {}",
            summary.id, summary.ticket_type, summary.title, summary.status, summary.priority
        );
        if !summary.tags.is_empty() {
            out.push_str(&format!("\n  Tags:     {}", summary.tags.join(", ")));
        }
        if let Some(parent) = self.ticket.get("parent").and_then(Value::as_str) {
            out.push_str(&format!("\n  Parent:   {}", parent));
        }
        if let Some(deps) = self.ticket.get("dependencies").and_then(Value::as_array) {
            let deps: Vec<&str> = deps.iter().filter_map(Value::as_str).collect();
            if !deps.is_empty() {
                out.push_str(&format!("\n  Depends:  {}", deps.join(", ")));
            }
        }
        if !self.body.trim().is_empty() {
            out.push_str("\n\n");
            out.push_str(self.body.trim_end());
        }
        out
    }
}

/// Show a single ticket by ID.
pub fn show(project_dir: &Path, id: &str) -> Result<ShowResult> {
    let store = TicketStore::open(project_dir)?;
    let loaded = store.load(id)?;
    Ok(ShowResult {
        ticket: loaded.record,
        body: loaded.body,
    })
}

// === status transition ===

#[derive(Debug, Serialize)]
pub struct TransitionResult {
    pub id: String,
    pub from: String,
    pub to: String,
}

impl Output for TransitionResult {
    fn to_human(&self) -> String {
        format!("{}: {} -> {}", self.id, self.from, self.to)
    }
}

/// Change a ticket's status, enforcing the type's workflow.
pub fn set_status(project_dir: &Path, id: &str, requested: &str) -> Result<TransitionResult> {
    let ticket_type = TicketType::from_id(id).ok_or_else(|| Error::InvalidId(id.to_string()))?;
    let store = TicketStore::open(project_dir)?;
    let mut loaded = store.load(id)?;

    let current = loaded
        .record
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let result = workflow::validate_transition(ticket_type, &current, requested);
    if !result.valid {
        return Err(Error::TransitionRejected(result.errors.join("; ")));
    }

    loaded
        .record
        .insert("status".to_string(), Value::String(requested.to_string()));
    loaded.record.insert(
        "updated_at".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
    );
    store.write_record(id, &loaded.record, &loaded.body)?;

    Ok(TransitionResult {
        id: id.to_string(),
        from: current,
        to: requested.to_string(),
    })
}

/// Close a ticket by moving it to its type's closing state.
pub fn close(project_dir: &Path, id: &str) -> Result<TransitionResult> {
    let ticket_type = TicketType::from_id(id).ok_or_else(|| Error::InvalidId(id.to_string()))?;
    let target = match ticket_type {
        TicketType::Pr => Status::Closed,
        _ => Status::Completed,
    };
    set_status(project_dir, id, target.as_str())
}

// === delete ===

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

impl Output for DeleteResult {
    fn to_human(&self) -> String {
        format!("Deleted {}", self.id)
    }
}

/// Delete a ticket file.
pub fn delete(project_dir: &Path, id: &str) -> Result<DeleteResult> {
    let store = TicketStore::open(project_dir)?;
    store.delete(id)?;
    Ok(DeleteResult {
        id: id.to_string(),
        deleted: true,
    })
}

// === validate ===

#[derive(Debug, Serialize)]
pub struct ValidateResult {
    pub valid: bool,
    pub checked: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Output for ValidateResult {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for error in &self.errors {
            lines.push(format!("error: {}", error));
        }
        for warning in &self.warnings {
            lines.push(format!("warning: {}", warning));
        }
        lines.push(format!(
            "Validated {} ticket(s): {} error(s), {} warning(s)",
            self.checked,
            self.errors.len(),
            self.warnings.len()
        ));
        lines.join("\n")
    }
}

/// Validate the whole project, or a single ticket when `ticket` is given.
///
/// Single-ticket validation covers schema, workflow state, and business
/// rules; collection validation additionally checks ID uniqueness and
/// cross-ticket relationships.
pub fn validate(project_dir: &Path, ticket: Option<&str>) -> Result<ValidateResult> {
    let store = TicketStore::open(project_dir)?;
    let config = Config::load(project_dir)?;
    let validator = Validator::new(config.data.validation.clone());

    let (checked, result) = match ticket {
        Some(id) => {
            let ticket_type =
                TicketType::from_id(id).ok_or_else(|| Error::InvalidId(id.to_string()))?;
            let loaded = store.load(id)?;
            (1, validator.validate_ticket(&loaded.record, ticket_type, None))
        }
        None => {
            let (loaded, failures) = store.load_all()?;
            let mut result = ValidationResult::new();
            for failure in failures {
                result.add_error(failure);
            }
            let records: Vec<Record> = loaded.into_iter().map(|t| t.record).collect();
            result.merge(validator.validate_collection(&records));
            (records.len(), result)
        }
    };

    Ok(ValidateResult {
        valid: result.valid,
        checked,
        errors: result.errors,
        warnings: result.warnings,
    })
}

// === config ===

#[derive(Debug, Serialize)]
pub struct ConfigGetResult {
    pub key: String,
    pub value: Option<String>,
}

impl Output for ConfigGetResult {
    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => format!("{} = {}", self.key, value),
            None => format!("{} is not set", self.key),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
}

impl Output for ConfigSetResult {
    fn to_human(&self) -> String {
        format!("Set {} = {}", self.key, self.value)
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigListResult {
    pub entries: Vec<(String, String)>,
}

impl Output for ConfigListResult {
    fn to_human(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{} = {}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn toml_display(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a config value by dotted key.
pub fn config_get(project_dir: &Path, key: &str) -> Result<ConfigGetResult> {
    let config = Config::load(project_dir)?;
    Ok(ConfigGetResult {
        key: key.to_string(),
        value: config.get(key).map(|v| toml_display(&v)),
    })
}

/// Set a config value by dotted key and persist it.
pub fn config_set(project_dir: &Path, key: &str, value: &str) -> Result<ConfigSetResult> {
    let mut config = Config::load(project_dir)?;
    config.set(key, value)?;
    config.save()?;
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// List all config entries.
pub fn config_list(project_dir: &Path) -> Result<ConfigListResult> {
    let config = Config::load(project_dir)?;
    Ok(ConfigListResult {
        entries: config.entries(),
    })
}

// === info ===

#[derive(Debug, Serialize)]
pub struct InfoResult {
    pub version: &'static str,
    pub commit: &'static str,
    pub built: &'static str,
}

impl Output for InfoResult {
    fn to_human(&self) -> String {
        format!(
            "Version: {}\nCommit:  {}\nBuilt:   {}",
            self.version, self.commit, self.built
        )
    }
}

/// Report build information baked in by the build script.
pub fn info() -> InfoResult {
    InfoResult {
        version: crate::cli::package_version(),
        commit: crate::cli::git_commit(),
        built: crate::cli::build_timestamp(),
    }
}
