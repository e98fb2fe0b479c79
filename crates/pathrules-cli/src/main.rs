//! pathrules CLI
//!
//! A command-line tool for resolving approvers from a CODEOWNERS file and
//! checking paths against a repository's ignore files.

use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

mod output;

use output::{print_error, print_owners, print_problem, print_verdict};
use pathrules_core::{CodeOwners, GitIgnoreFileSet, find_codeowners_file};

#[derive(Parser)]
#[command(name = "pathrules", version, about = "Resolve CODEOWNERS approvers and ignore verdicts")]
struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the approvers for one or more repository paths
    Owners {
        /// Path to the CODEOWNERS file (default: discovered in the repo)
        #[arg(long)]
        codeowners: Option<PathBuf>,
        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Only report approvers from non-optional sections
        #[arg(long)]
        mandatory: bool,
        /// Repository-relative paths to resolve
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Check paths against the repository's .gitignore files
    Ignored {
        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Treat the given paths as repository-relative
        #[arg(long)]
        project_relative: bool,
        /// Paths to check
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Report structural problems in the CODEOWNERS file
    Check {
        /// Path to the CODEOWNERS file (default: discovered in the repo)
        #[arg(long)]
        codeowners: Option<PathBuf>,
        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(args.command)
}

/// Initialize tracing based on verbosity level.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> ExitCode {
    let use_colors = io::stdout().is_terminal();
    match command {
        Command::Owners {
            codeowners,
            repo,
            mandatory,
            paths,
        } => {
            let codeowners = match load_codeowners(codeowners.as_deref(), &repo) {
                Ok(doc) => doc,
                Err(message) => {
                    print_error(&message, use_colors);
                    return ExitCode::FAILURE;
                }
            };
            for path in &paths {
                let approvers = if mandatory {
                    codeowners.mandatory_approvers(path)
                } else {
                    codeowners.all_approvers(path)
                };
                print_owners(path, &approvers, use_colors);
            }
            ExitCode::SUCCESS
        }
        Command::Ignored {
            repo,
            project_relative,
            paths,
        } => {
            let repo = repo.canonicalize().unwrap_or(repo);
            let set = match GitIgnoreFileSet::discover(&repo) {
                Ok(set) => set,
                Err(err) => {
                    print_error(&err.to_string(), use_colors);
                    return ExitCode::FAILURE;
                }
            };
            info!("loaded ignore rules under {}", repo.display());
            let mut failed = false;
            for path in &paths {
                // Relative paths are interpreted against the repository
                // root unless the caller asked for project-relative mode.
                let verdict = if project_relative || Path::new(path).is_absolute() {
                    set.verdict_with(path, project_relative)
                } else {
                    let absolute = repo.join(path);
                    set.verdict_with(&absolute.to_string_lossy(), false)
                };
                match verdict {
                    Ok(verdict) => print_verdict(path, verdict, use_colors),
                    Err(err) => {
                        print_error(&err.to_string(), use_colors);
                        failed = true;
                    }
                }
            }
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Check { codeowners, repo } => {
            let codeowners = match load_codeowners(codeowners.as_deref(), &repo) {
                Ok(doc) => doc,
                Err(message) => {
                    print_error(&message, use_colors);
                    return ExitCode::FAILURE;
                }
            };
            if !codeowners.has_structural_problems() {
                println!("no structural problems found");
                return ExitCode::SUCCESS;
            }
            for problem in codeowners.problems() {
                print_problem(problem, use_colors);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_codeowners(explicit: Option<&Path>, repo: &Path) -> Result<CodeOwners, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_codeowners_file(repo)
            .ok_or_else(|| format!("no CODEOWNERS file found under {}", repo.display()))?,
    };
    debug!("reading ownership rules from {}", path.display());
    let content = std::fs::read_to_string(&path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    CodeOwners::parse(&content).map_err(|err| err.to_string())
}
