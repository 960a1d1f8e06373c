//! Trackdown CLI - a ticket tracker backed by markdown files.

use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process;

use trackdown::cli::{Cli, Commands, ConfigCommands};
use trackdown::commands::{self, Output};
use trackdown::storage::{find_git_root, find_project_root};

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Determine project path: --project-dir flag > TD_PROJECT env (via clap)
    // > nearest initialized project > git root > cwd
    let project_dir = resolve_project_dir(cli.project_dir, human);

    match run_command(cli.command, &project_dir, human) {
        Ok(exit_code) => {
            if exit_code != 0 {
                process::exit(exit_code);
            }
        }
        Err(e) => {
            if human {
                eprintln!("Error: {}", e);
            } else {
                eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            }
            process::exit(1);
        }
    }
}

/// Resolve the project directory.
///
/// An explicit path (flag or env var) is used literally after an existence
/// check. Otherwise we walk up from the current directory looking for an
/// initialized project, then fall back to the git root, then the cwd, so
/// commands work from anywhere inside the tree.
fn resolve_project_dir(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!(
                        "Error: Specified project path does not exist: {}",
                        path.display()
                    );
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!(
                                "Specified project path does not exist: {}",
                                path.display()
                            )
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            find_project_root(&cwd)
                .or_else(|| find_git_root(&cwd))
                .unwrap_or(cwd)
        }
    }
}

fn run_command(
    command: Commands,
    project_dir: &std::path::Path,
    human: bool,
) -> Result<i32, trackdown::Error> {
    match command {
        Commands::Init { name } => {
            let result = commands::init(project_dir, name)?;
            output(&result, human);
        }

        Commands::Create {
            ticket_type,
            title,
            description,
            priority,
            assignees,
            tags,
            parent,
            dependencies,
        } => {
            let options = commands::CreateOptions {
                description,
                priority,
                assignees,
                tags,
                parent,
                dependencies,
            };
            let result = commands::create(project_dir, &ticket_type, title, options)?;
            output(&result, human);
        }

        Commands::List {
            ticket_type,
            status,
            tag,
        } => {
            let result = commands::list(
                project_dir,
                ticket_type.as_deref(),
                status.as_deref(),
                tag.as_deref(),
            )?;
            output(&result, human);
        }

        Commands::Show { id } => {
            let result = commands::show(project_dir, &id)?;
            output(&result, human);
        }

        Commands::Status { id, status } => {
            let result = commands::set_status(project_dir, &id, &status)?;
            output(&result, human);
        }

        Commands::Close { id } => {
            let result = commands::close(project_dir, &id)?;
            output(&result, human);
        }

        Commands::Delete { id } => {
            let result = commands::delete(project_dir, &id)?;
            output(&result, human);
        }

        Commands::Validate { ticket } => {
            let result = commands::validate(project_dir, ticket.as_deref())?;
            output(&result, human);
            // Warnings never affect the exit code; hard errors do
            if !result.valid {
                return Ok(1);
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Get { key } => {
                let result = commands::config_get(project_dir, &key)?;
                output(&result, human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(project_dir, &key, &value)?;
                output(&result, human);
            }
            ConfigCommands::List => {
                let result = commands::config_list(project_dir)?;
                output(&result, human);
            }
        },

        Commands::Info => {
            let result = commands::info();
            output(&result, human);
        }
    }

    Ok(0)
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
