//! Project configuration for Trackdown.
//!
//! Configuration lives at `.trackdown/config.toml` inside the project
//! directory and holds the project name, the per-type ID counters, and the
//! validation thresholds.
//!
//! The config is an explicit object: callers load it, pass it (or the
//! [`ValidationLimits`] slice of it) to whoever needs it, and call
//! [`Config::reload`] when they want to observe on-disk changes. Nothing is
//! cached globally.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::TicketType;
use crate::{Error, Result};

/// Directory holding trackdown metadata inside a project.
pub const CONFIG_DIR: &str = ".trackdown";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Thresholds consumed by the validation core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationLimits {
    /// A PR touching more than this many lines should have reviewers.
    pub large_change_lines: u64,

    /// An issue fanning out to more than this many child tasks draws a warning.
    pub max_child_tasks: u64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            large_change_lines: 500,
            max_child_tasks: 20,
        }
    }
}

/// Per-type counters for sequential ID generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Counters {
    pub task: u32,
    pub epic: u32,
    pub issue: u32,
    pub pr: u32,
    pub project: u32,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            task: 1,
            epic: 1,
            issue: 1,
            pr: 1,
            project: 1,
        }
    }
}

impl Counters {
    /// Current counter value for a ticket type.
    pub fn get(&self, ticket_type: TicketType) -> u32 {
        match ticket_type {
            TicketType::Task => self.task,
            TicketType::Epic => self.epic,
            TicketType::Issue => self.issue,
            TicketType::Pr => self.pr,
            TicketType::Project => self.project,
        }
    }

    /// Set the counter for a ticket type.
    pub fn set(&mut self, ticket_type: TicketType, value: u32) {
        match ticket_type {
            TicketType::Task => self.task = value,
            TicketType::Epic => self.epic = value,
            TicketType::Issue => self.issue = value,
            TicketType::Pr => self.pr = value,
            TicketType::Project => self.project = value,
        }
    }
}

/// Project metadata section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectSection {
    pub name: String,
}

/// The serialized shape of `.trackdown/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigData {
    pub project: ProjectSection,
    pub counters: Counters,
    pub validation: ValidationLimits,
}

/// Handle to a project's configuration file.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    pub data: ConfigData,
}

impl Config {
    /// Path of the config file for a project directory.
    pub fn path_for(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load the config for a project, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::path_for(project_dir);
        let data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))?
        } else {
            ConfigData::default()
        };
        Ok(Self { path, data })
    }

    /// Write the config back to disk, creating `.trackdown/` if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let raw = toml::to_string_pretty(&self.data).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Re-read the config from disk, replacing the in-memory values.
    pub fn reload(&mut self) -> Result<()> {
        if self.path.exists() {
            let raw = fs::read_to_string(&self.path)?;
            self.data = toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))?;
        } else {
            self.data = ConfigData::default();
        }
        Ok(())
    }

    /// Look up a value by dotted key (e.g., `validation.max_child_tasks`).
    pub fn get(&self, key: &str) -> Option<toml::Value> {
        let root = toml::Value::try_from(&self.data).ok()?;
        let mut current = root;
        for segment in key.split('.') {
            current = current.get(segment)?.clone();
        }
        Some(current)
    }

    /// Set a value by dotted key.
    ///
    /// The raw string is coerced to an integer or boolean when it parses as
    /// one, otherwise stored as a string. Fails when the key does not name
    /// an existing config field or the value has the wrong type for it.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root =
            toml::Value::try_from(&self.data).map_err(|e| Error::Config(e.to_string()))?;

        let segments: Vec<&str> = key.split('.').collect();
        let (leaf, path) = segments
            .split_last()
            .ok_or_else(|| Error::InvalidInput("empty config key".to_string()))?;

        let mut current = &mut root;
        for segment in path {
            current = current
                .get_mut(segment)
                .ok_or_else(|| Error::InvalidInput(format!("unknown config key: {}", key)))?;
        }
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::InvalidInput(format!("unknown config key: {}", key)))?;
        if !table.contains_key(*leaf) {
            return Err(Error::InvalidInput(format!("unknown config key: {}", key)));
        }

        let value = if let Ok(n) = raw.parse::<i64>() {
            toml::Value::Integer(n)
        } else if let Ok(b) = raw.parse::<bool>() {
            toml::Value::Boolean(b)
        } else {
            toml::Value::String(raw.to_string())
        };
        table.insert(leaf.to_string(), value);

        self.data = root
            .try_into()
            .map_err(|e| Error::Config(format!("invalid value for {}: {}", key, e)))?;
        Ok(())
    }

    /// List all keys and values as dotted pairs, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        if let Ok(root) = toml::Value::try_from(&self.data) {
            collect_entries("", &root, &mut entries);
        }
        entries.sort();
        entries
    }
}

fn collect_entries(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let dotted = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_entries(&dotted, child, out);
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}
