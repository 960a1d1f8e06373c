//! CLI argument definitions for Trackdown.

use clap::{Parser, Subcommand};

/// Trackdown - a ticket tracker backed by markdown files.
///
/// Tickets (tasks, epics, issues, PRs, projects) live as markdown files
/// with YAML frontmatter under `tickets/`. Start with `td init`, then
/// `td create task "Title"`.
#[derive(Parser, Debug)]
#[command(name = "td")]
#[command(author, version, about = "A CLI ticket tracker backed by markdown files", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if td was started in <path> instead of the current directory.
    /// Can also be set via the TD_PROJECT environment variable.
    #[arg(short = 'd', long = "project-dir", global = true, env = "TD_PROJECT")]
    pub project_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a trackdown project in the current directory
    Init {
        /// Project name stored in config
        #[arg(long)]
        name: Option<String>,
    },

    /// Create a new ticket
    Create {
        /// Ticket type: task, epic, issue, pr, or project
        ticket_type: String,

        /// Ticket title
        title: String,

        /// Detailed description
        #[arg(long)]
        description: Option<String>,

        /// Priority: low, medium, high, or critical
        #[arg(long)]
        priority: Option<String>,

        /// Assignee (repeatable)
        #[arg(long = "assignee")]
        assignees: Vec<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Parent ticket ID (task -> issue/epic, issue -> epic)
        #[arg(long)]
        parent: Option<String>,

        /// Ticket ID this ticket depends on (repeatable)
        #[arg(long = "dependency")]
        dependencies: Vec<String>,
    },

    /// List tickets
    List {
        /// Filter by ticket type
        ticket_type: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show a ticket by ID
    Show {
        /// Ticket ID (e.g., TSK-0001)
        id: String,
    },

    /// Change a ticket's status, enforcing the workflow
    Status {
        /// Ticket ID
        id: String,

        /// Requested status
        status: String,
    },

    /// Close a ticket (completed, or closed for PRs)
    Close {
        /// Ticket ID
        id: String,
    },

    /// Delete a ticket file
    Delete {
        /// Ticket ID
        id: String,
    },

    /// Validate tickets: schema, workflow state, relationships, rules
    ///
    /// Exits non-zero when any hard error is found. Warnings never affect
    /// the exit code.
    Validate {
        /// Validate a single ticket instead of the whole project
        #[arg(long)]
        ticket: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show version and build information
    Info,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Get a config value by dotted key (e.g., validation.max_child_tasks)
    Get { key: String },

    /// Set a config value by dotted key
    Set { key: String, value: String },

    /// List all config values
    List,
}

/// Package version from Cargo.toml.
pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Git commit the binary was built from.
pub fn git_commit() -> &'static str {
    env!("TD_GIT_COMMIT")
}

/// Timestamp the binary was built at.
pub fn build_timestamp() -> &'static str {
    env!("TD_BUILD_TIMESTAMP")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // This will panic if the CLI is misconfigured
        Cli::command().debug_assert();
    }
}
