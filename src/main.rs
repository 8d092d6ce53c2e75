use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use gmc::commands;
use gmc::git::{RepoContext, SystemGit};
use gmc::models::{AddOptions, DupOptions, PruneOptions, RemoveOptions, SyncOptions};
use gmc::report::{Level, Report};
use gmc::shared::{self, SyncStrategy};
use gmc::utils::{parse_pr_number, read_settings};
use gmc::WorktreeError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "gmc", about = "Manage a bare repository with worktrees beside it", version = VERSION)]
struct Cli {
    /// Log every git invocation
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new worktree
    Add {
        /// Worktree directory and branch name (attaches if the branch exists)
        name: String,
        /// Start point for a new branch (defaults to HEAD)
        #[arg(short = 'b', long = "base")]
        base: Option<String>,
        /// Fetch all remotes first
        #[arg(short = 'f', long)]
        fetch: bool,
    },
    /// List all worktrees
    #[command(alias = "ls")]
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Remove a worktree by path, directory name or branch
    #[command(alias = "rm")]
    Remove {
        name: String,
        /// Remove even with uncommitted changes
        #[arg(long)]
        force: bool,
        /// Keep the branch
        #[arg(long = "keep-branch")]
        keep_branch: bool,
        /// Show what would be removed
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Create a cohort of .dup-N worktrees on fresh branches
    Dup {
        /// Number of worktrees to create
        #[arg(short = 'n', long, default_value_t = 2)]
        count: usize,
        /// Base ref (defaults to HEAD)
        #[arg(short = 'b', long = "base")]
        base: Option<String>,
    },
    /// Rename the branch checked out in a worktree
    Promote {
        worktree: String,
        branch: String,
    },
    /// Fast-forward the base branch from upstream (or origin)
    Sync {
        /// Branch to sync (defaults to the remote's HEAD, then main or master)
        #[arg(short = 'b', long = "branch")]
        branch: Option<String>,
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Remove worktrees whose branches are merged into the base
    Prune {
        /// Base branch to check against
        #[arg(long)]
        base: Option<String>,
        /// Remove dirty worktrees too
        #[arg(long)]
        force: bool,
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Check out a pull request into pr-<number>
    Pr {
        /// Pull request number (a leading # is accepted)
        number: String,
        /// Remote to fetch from (auto-detected when omitted)
        #[arg(short = 'r', long)]
        remote: Option<String>,
    },
    /// Manage resources shared across worktrees
    Share {
        #[command(subcommand)]
        action: ShareCommands,
    },
}

#[derive(Subcommand)]
enum ShareCommands {
    /// Register a path to replicate into every worktree
    Add {
        path: String,
        /// copy or link
        #[arg(short = 's', long, default_value = "copy")]
        strategy: String,
    },
    /// Stop sharing a path
    Remove { path: String },
    /// Show shared resources
    List,
    /// Replicate shared resources into one worktree, or all of them
    Sync { worktree: Option<String> },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::InvalidSubcommand => {
                eprintln!("{} Invalid command. Use --help for usage information.", "Error:".red());
                std::process::exit(1);
            }
            _ => e.exit(),
        },
    };

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        anyhow::bail!("No command provided. Use --help for usage information.");
    };

    let settings = read_settings();
    let verbose = cli.verbose || settings.verbose;
    init_logging(verbose);

    let start = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let runner = SystemGit::new(settings.git_binary, verbose);
    let context = RepoContext::discover(Box::new(runner), &start)?;
    let mut report = Report::new();

    match command {
        Commands::Add { name, base, fetch } => {
            let options = AddOptions {
                base_branch: base,
                fetch,
            };
            let result = commands::add::run(&context, &name, &options, &mut report);
            finish(&report, result)?;
        }
        Commands::List { json } => {
            let worktrees = commands::list::run(&context)?;
            if json {
                println!("{}", commands::list::render_json(&worktrees)?);
            } else {
                for line in commands::list::render_text(&worktrees) {
                    println!("{}", line);
                }
            }
        }
        Commands::Remove {
            name,
            force,
            keep_branch,
            dry_run,
        } => {
            let options = RemoveOptions {
                force,
                delete_branch: !keep_branch,
                dry_run,
            };
            let result = commands::remove::run(&context, &name, &options, &mut report);
            finish(&report, result)?;
        }
        Commands::Dup { count, base } => {
            let options = DupOptions {
                base_branch: base,
                count,
            };
            let result = commands::dup::run(&context, &options, &mut report);
            finish(&report, result)?;
        }
        Commands::Promote { worktree, branch } => {
            let result = commands::promote::run(&context, &worktree, &branch, &mut report);
            finish(&report, result)?;
        }
        Commands::Sync { branch, dry_run } => {
            let options = SyncOptions {
                base_branch: branch,
                dry_run,
            };
            let result = commands::sync::run(&context, &options, &mut report);
            finish(&report, result)?;
        }
        Commands::Prune {
            base,
            force,
            dry_run,
        } => {
            let options = PruneOptions {
                base_branch: base,
                force,
                dry_run,
            };
            let result = commands::prune::run(&context, &options, &mut report);
            finish(&report, result)?;
        }
        Commands::Pr { number, remote } => {
            let number = parse_pr_number(&number)?;
            let result = commands::pr::run(&context, number, remote.as_deref(), &mut report);
            finish(&report, result)?;
        }
        Commands::Share { action } => run_share(&context, action, &mut report)?,
    }
    Ok(())
}

fn run_share(context: &RepoContext, action: ShareCommands, report: &mut Report) -> anyhow::Result<()> {
    match action {
        ShareCommands::Add { path, strategy } => {
            let parsed = SyncStrategy::parse(&strategy).ok_or_else(|| {
                WorktreeError::UnknownSyncStrategy {
                    path: path.clone(),
                    strategy: strategy.clone(),
                }
            })?;
            let result = shared::add_shared_resource(context, &path, parsed, report);
            finish(report, result)?;
        }
        ShareCommands::Remove { path } => {
            let result = shared::remove_shared_resource(context, &path, report);
            finish(report, result)?;
        }
        ShareCommands::List => {
            let resources = shared::list_shared_resources(context)?;
            if resources.is_empty() {
                println!("{}", "No shared resources configured.".yellow());
            }
            for resource in resources {
                println!("{}  {}", resource.path, resource.strategy.dimmed());
            }
        }
        ShareCommands::Sync { worktree } => {
            let result = match worktree {
                Some(target) => shared::sync_shared_resources(context, &target, report),
                None => shared::sync_all_shared_resources(context, report),
            };
            finish(report, result)?;
        }
    }
    Ok(())
}

/// Print whatever the operation narrated, then surface its error.
fn finish<T>(report: &Report, result: gmc::Result<T>) -> anyhow::Result<T> {
    for event in &report.events {
        match event.level {
            Level::Info => println!("{}", event.message),
            Level::Warn => eprintln!("{} {}", "Warning:".yellow(), event.message),
        }
    }
    Ok(result?)
}
