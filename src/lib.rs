//! Trackdown - a local-first ticket tracker backed by markdown files.
//!
//! This library provides the core functionality for the `td` CLI tool:
//! ticket storage as markdown files with YAML frontmatter, and a validation
//! core covering schema rules, status workflows, cross-ticket relationship
//! integrity, and business-rule heuristics.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod storage;
pub mod validation;

/// Library-level error type for Trackdown operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run `td init` first")]
    NotInitialized,

    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error("Invalid ticket ID: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown ticket type: {0}")]
    UnknownTicketType(String),

    #[error("No frontmatter found in {0}")]
    InvalidFrontmatter(String),

    #[error("Transition rejected: {0}")]
    TransitionRejected(String),
}

/// Result type alias for Trackdown operations.
pub type Result<T> = std::result::Result<T, Error>;
