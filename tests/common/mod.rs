//! Common test utilities for trackdown integration tests.
//!
//! Provides `TestEnv`: an isolated temporary project directory plus a
//! factory for `td` commands running inside it.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
pub use tempfile::TempDir;

/// A test environment with an isolated project directory.
pub struct TestEnv {
    pub project_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment without initializing a project.
    pub fn new() -> Self {
        Self {
            project_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize a project in it.
    pub fn init() -> Self {
        let env = Self::new();
        env.td().arg("init").assert().success();
        env
    }

    /// Get a Command for the td binary running in the project directory.
    pub fn td(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_td"));
        cmd.current_dir(self.project_dir.path());
        cmd
    }

    /// Path to a ticket file for the given ID.
    pub fn ticket_path(&self, id: &str) -> PathBuf {
        let dir = match id.split('-').next().unwrap() {
            "TSK" => "tsk",
            "EP" => "ep",
            "ISS" => "iss",
            "PR" => "pr",
            "PROJ" => "proj",
            other => panic!("unknown ticket prefix: {}", other),
        };
        self.project_dir
            .path()
            .join("tickets")
            .join(dir)
            .join(format!("{}.md", id))
    }

    /// Write a ticket file directly, bypassing the CLI.
    ///
    /// `frontmatter` is raw YAML without the `---` fences. Used to simulate
    /// hand-edited or externally generated tickets.
    pub fn write_ticket(&self, id: &str, frontmatter: &str) {
        let path = self.ticket_path(id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let content = format!("---\n{}\n---\n\n# {}\n", frontmatter.trim_end(), id);
        fs::write(path, content).unwrap();
    }

    /// Write a minimal valid ticket with extra frontmatter lines appended.
    pub fn write_minimal_ticket(&self, id: &str, status: &str, extra: &str) {
        let mut frontmatter = format!(
            "id: {}\ntitle: Ticket {}\nstatus: {}\npriority: medium\n\
             created_at: 2026-01-01T00:00:00Z\nupdated_at: 2026-01-02T00:00:00Z",
            id, id, status
        );
        if !extra.trim().is_empty() {
            frontmatter.push('\n');
            frontmatter.push_str(extra.trim_end());
        }
        self.write_ticket(id, &frontmatter);
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
