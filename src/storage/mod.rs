//! Storage layer for Trackdown tickets.
//!
//! Tickets live inside the project directory as markdown files with YAML
//! frontmatter, one file per ticket, under a type-prefixed tree:
//!
//! ```text
//! <project>/
//!   .trackdown/config.toml
//!   tickets/
//!     tsk/TSK-0001.md
//!     ep/EP-0001.md
//!     iss/ISS-0001.md
//!     pr/PR-0001.md
//!     proj/PROJ-0001.md
//! ```
//!
//! The store hands parsed records to callers; validation happens in
//! [`crate::validation`], never here.

pub mod frontmatter;

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::models::{Ticket, TicketType};
use crate::validation::Record;
use crate::{Error, Result};

/// Directory holding the ticket tree inside a project.
pub const TICKETS_DIR: &str = "tickets";

/// A ticket file loaded from disk.
#[derive(Debug, Clone)]
pub struct LoadedTicket {
    pub path: PathBuf,
    pub record: Record,
    pub body: String,
}

/// Storage manager for a single project.
pub struct TicketStore {
    /// Project root directory
    pub root: PathBuf,
}

impl TicketStore {
    /// Open storage for an initialized project.
    pub fn open(project_dir: &Path) -> Result<Self> {
        if !Self::exists(project_dir) {
            return Err(Error::NotInitialized);
        }
        Ok(Self {
            root: project_dir.to_path_buf(),
        })
    }

    /// Initialize storage for a new project, creating the ticket tree.
    pub fn init(project_dir: &Path) -> Result<Self> {
        let tickets = project_dir.join(TICKETS_DIR);
        for ticket_type in TicketType::all() {
            fs::create_dir_all(tickets.join(ticket_type.dir_name()))?;
        }
        fs::create_dir_all(project_dir.join(config::CONFIG_DIR))?;
        Ok(Self {
            root: project_dir.to_path_buf(),
        })
    }

    /// Check whether a project is initialized at the given directory.
    pub fn exists(project_dir: &Path) -> bool {
        project_dir.join(config::CONFIG_DIR).is_dir() && project_dir.join(TICKETS_DIR).is_dir()
    }

    /// Directory holding tickets of the given type.
    pub fn type_dir(&self, ticket_type: TicketType) -> PathBuf {
        self.root.join(TICKETS_DIR).join(ticket_type.dir_name())
    }

    /// File path for a ticket ID, derived from its prefix.
    pub fn ticket_path(&self, id: &str) -> Result<PathBuf> {
        let ticket_type =
            TicketType::from_id(id).ok_or_else(|| Error::InvalidId(id.to_string()))?;
        Ok(self.type_dir(ticket_type).join(format!("{}.md", id)))
    }

    /// Generate the next free sequential ID for a type.
    ///
    /// Starts from the configured counter, skips IDs whose files already
    /// exist, and advances the counter past the returned ID. The caller is
    /// responsible for saving the config.
    pub fn next_id(&self, ticket_type: TicketType, config: &mut Config) -> Result<String> {
        let mut counter = config.data.counters.get(ticket_type).max(1);
        loop {
            let id = format!("{}-{:04}", ticket_type.id_prefix(), counter);
            if !self.ticket_path(&id)?.exists() {
                config.data.counters.set(ticket_type, counter + 1);
                return Ok(id);
            }
            counter += 1;
        }
    }

    /// Write a new ticket to disk with the given markdown body.
    pub fn save_ticket(&self, ticket: &Ticket, body: &str) -> Result<PathBuf> {
        let record = ticket.to_record()?;
        self.write_record(&ticket.id, &record, body)
    }

    /// Write a raw record to disk, preserving fields the typed model does
    /// not know about.
    pub fn write_record(&self, id: &str, record: &Record, body: &str) -> Result<PathBuf> {
        let path = self.ticket_path(id)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let document = frontmatter::serialize(record, body)?;
        fs::write(&path, document)?;
        Ok(path)
    }

    /// Load a ticket by ID.
    pub fn load(&self, id: &str) -> Result<LoadedTicket> {
        let path = self.ticket_path(id)?;
        if !path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let (record, body) = frontmatter::parse(&content, &path.display().to_string())?;
        Ok(LoadedTicket { path, record, body })
    }

    /// Delete a ticket file by ID.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.ticket_path(id)?;
        if !path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Load every ticket in the project.
    ///
    /// Returns the parsed tickets plus a list of per-file load failures
    /// (unparseable frontmatter must not abort a collection pass). Files are
    /// visited in sorted order so output is deterministic.
    pub fn load_all(&self) -> Result<(Vec<LoadedTicket>, Vec<String>)> {
        let mut tickets = Vec::new();
        let mut failures = Vec::new();

        for ticket_type in TicketType::all() {
            let dir = self.type_dir(*ticket_type);
            if !dir.is_dir() {
                continue;
            }

            let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
                .collect();
            paths.sort();

            for path in paths {
                let content = fs::read_to_string(&path)?;
                match frontmatter::parse(&content, &path.display().to_string()) {
                    Ok((record, body)) => tickets.push(LoadedTicket { path, record, body }),
                    Err(e) => failures.push(e.to_string()),
                }
            }
        }

        Ok((tickets, failures))
    }
}

/// Default markdown body for a freshly created ticket.
pub fn default_body(title: &str, description: &str) -> String {
    let description = if description.trim().is_empty() {
        "No description provided."
    } else {
        description
    };
    format!("# {}\n\n## Description\n\n{}\n", title, description)
}

/// Walk up from `start` to find the nearest initialized project directory.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if TicketStore::exists(dir) {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Walk up from `start` to find the enclosing git repository root.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_type_dirs() {
        let temp = TempDir::new().unwrap();
        assert!(!TicketStore::exists(temp.path()));

        TicketStore::init(temp.path()).unwrap();
        assert!(TicketStore::exists(temp.path()));
        for ty in TicketType::all() {
            assert!(temp.path().join(TICKETS_DIR).join(ty.dir_name()).is_dir());
        }
    }

    #[test]
    fn test_open_uninitialized_fails() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            TicketStore::open(temp.path()),
            Err(Error::NotInitialized)
        ));
    }

    #[test]
    fn test_ticket_path_by_prefix() {
        let temp = TempDir::new().unwrap();
        let store = TicketStore::init(temp.path()).unwrap();

        let path = store.ticket_path("ISS-0042").unwrap();
        assert!(path.ends_with("tickets/iss/ISS-0042.md"));

        assert!(matches!(
            store.ticket_path("XYZ-0001"),
            Err(Error::InvalidId(_))
        ));
    }

    #[test]
    fn test_next_id_sequence_and_collision_skip() {
        let temp = TempDir::new().unwrap();
        let store = TicketStore::init(temp.path()).unwrap();
        let mut config = Config::load(temp.path()).unwrap();

        let id = store.next_id(TicketType::Task, &mut config).unwrap();
        assert_eq!(id, "TSK-0001");
        // Counter advanced even though nothing was written yet
        assert_eq!(config.data.counters.get(TicketType::Task), 2);

        // Occupy TSK-0002 out of band; generation skips over it
        let ticket = Ticket::new(
            "TSK-0002".to_string(),
            TicketType::Task,
            "Occupied".to_string(),
        );
        store.save_ticket(&ticket, "body\n").unwrap();

        let id = store.next_id(TicketType::Task, &mut config).unwrap();
        assert_eq!(id, "TSK-0003");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = TicketStore::init(temp.path()).unwrap();

        let mut ticket = Ticket::new(
            "EP-0001".to_string(),
            TicketType::Epic,
            "User management".to_string(),
        );
        ticket
            .extra
            .insert("business_value".to_string(), serde_json::json!("Onboarding"));
        let body = default_body(&ticket.title, "");
        store.save_ticket(&ticket, &body).unwrap();

        let loaded = store.load("EP-0001").unwrap();
        assert_eq!(loaded.record.get("id").unwrap(), "EP-0001");
        assert_eq!(loaded.record.get("status").unwrap(), "planning");
        assert_eq!(loaded.record.get("business_value").unwrap(), "Onboarding");
        assert!(loaded.body.contains("# User management"));
    }

    #[test]
    fn test_load_missing_ticket() {
        let temp = TempDir::new().unwrap();
        let store = TicketStore::init(temp.path()).unwrap();
        assert!(matches!(store.load("TSK-0404"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_write_record_preserves_unknown_fields() {
        let temp = TempDir::new().unwrap();
        let store = TicketStore::init(temp.path()).unwrap();

        let ticket = Ticket::new(
            "TSK-0001".to_string(),
            TicketType::Task,
            "A task".to_string(),
        );
        store.save_ticket(&ticket, "body\n").unwrap();

        let mut loaded = store.load("TSK-0001").unwrap();
        loaded
            .record
            .insert("custom_field".to_string(), serde_json::json!("kept"));
        loaded.record.insert(
            "status".to_string(),
            serde_json::json!(Status::InProgress.as_str()),
        );
        store
            .write_record("TSK-0001", &loaded.record, &loaded.body)
            .unwrap();

        let reread = store.load("TSK-0001").unwrap();
        assert_eq!(reread.record.get("custom_field").unwrap(), "kept");
        assert_eq!(reread.record.get("status").unwrap(), "in_progress");
    }

    #[test]
    fn test_load_all_reports_parse_failures() {
        let temp = TempDir::new().unwrap();
        let store = TicketStore::init(temp.path()).unwrap();

        let ticket = Ticket::new(
            "TSK-0001".to_string(),
            TicketType::Task,
            "Good".to_string(),
        );
        store.save_ticket(&ticket, "body\n").unwrap();
        fs::write(
            store.type_dir(TicketType::Task).join("TSK-0002.md"),
            "no frontmatter here\n",
        )
        .unwrap();

        let (tickets, failures) = store.load_all().unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("TSK-0002.md"));
    }

    #[test]
    fn test_load_all_sorted_across_types() {
        let temp = TempDir::new().unwrap();
        let store = TicketStore::init(temp.path()).unwrap();

        for (id, ty, title) in [
            ("TSK-0002", TicketType::Task, "b"),
            ("TSK-0001", TicketType::Task, "a"),
            ("ISS-0001", TicketType::Issue, "c"),
        ] {
            let ticket = Ticket::new(id.to_string(), ty, title.to_string());
            store.save_ticket(&ticket, "body\n").unwrap();
        }

        let (tickets, _) = store.load_all().unwrap();
        let ids: Vec<&str> = tickets
            .iter()
            .map(|t| t.record.get("id").and_then(Value::as_str).unwrap())
            .collect();
        // Types visit in declaration order, files sorted within a type
        assert_eq!(ids, vec!["TSK-0001", "TSK-0002", "ISS-0001"]);
    }

    #[test]
    fn test_find_project_root_from_subdir() {
        let temp = TempDir::new().unwrap();
        TicketStore::init(temp.path()).unwrap();
        let nested = temp.path().join("docs").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let root = find_project_root(&nested).unwrap();
        assert_eq!(root, temp.path());
    }

    #[test]
    fn test_default_body_fallback() {
        let body = default_body("Title", "");
        assert!(body.contains("No description provided."));
        let body = default_body("Title", "Real text");
        assert!(body.contains("Real text"));
    }
}
