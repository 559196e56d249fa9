use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use timeline_core::{
    CommitHistory, Granularity, GitBackend, RemoteStatus, RepositoryStatus, TimelineConfig,
    WorkingTreeStatus,
};
use timeline_graph::{CommitFilter, TextRenderer};
use timeline_view::{LoadOutcome, RepositorySnapshot, TimelineView};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitup-timeline")]
#[command(about = "Date-bucketed commit timeline for Git repositories", long_about = None)]
struct Cli {
    /// Config file (defaults to <repo>/.gitup-timeline.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the commit timeline
    Timeline {
        /// Path to the repository
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Bucket by day or week (overrides config)
        #[arg(short, long)]
        granularity: Option<Granularity>,
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: usize,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Only commits whose author contains this text
        #[arg(long)]
        author: Option<String>,
        /// Only commits whose message contains this text
        #[arg(long)]
        grep: Option<String>,
        /// Line width for text output
        #[arg(long, default_value = "80")]
        width: usize,
    },
    /// Show working tree and upstream status
    Status {
        /// Path to the repository
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List local branches
    Branches {
        /// Path to the repository
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Poll repository status until interrupted
    Watch {
        /// Path to the repository
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Seconds between refreshes (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct StatusReport {
    working_tree: WorkingTreeStatus,
    remote: RemoteStatus,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Timeline { path, granularity, pages, format, author, grep, width } => {
            let config = load_config(cli.config.as_deref(), &path)?;
            let backend = open_backend(&path)?;

            let mut view = TimelineView::new(backend, &config);
            if let Some(granularity) = granularity {
                view.set_granularity(granularity);
            }
            let mut filter = CommitFilter::new();
            if let Some(author) = &author {
                filter = filter.author(author);
            }
            if let Some(grep) = &grep {
                filter = filter.message(grep);
            }
            view.set_filter(filter);

            view.load_initial().await?;
            for _ in 1..pages.max(1) {
                if view.load_more().await? == LoadOutcome::Skipped {
                    break;
                }
            }

            let graph = view.graph();
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
                Format::Text => {
                    print!("{}", TextRenderer::new(width).render(&graph));
                    let pagination = view.coordinator();
                    println!(
                        "\nShowing {} of {} commits{}",
                        pagination.loaded(),
                        pagination.total(),
                        if pagination.has_more() { " (use --pages for more)" } else { "" }
                    );
                }
            }
        }
        Commands::Status { path, format } => {
            let backend = open_backend(&path)?;
            let (working_tree, remote) = tokio::try_join!(
                backend.fetch_working_tree_status(),
                backend.fetch_remote_status()
            )?;

            match format {
                Format::Json => {
                    let report = StatusReport { working_tree, remote };
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Format::Text => {
                    println!("Working tree: {}", describe_working_tree(&working_tree));
                    println!("Upstream:     {}", describe_remote(&remote));
                }
            }
        }
        Commands::Branches { path, format } => {
            let backend = open_backend(&path)?;
            let branches = backend.fetch_branches().await?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&branches)?),
                Format::Text => {
                    if branches.is_empty() {
                        println!("No branches");
                    }
                    for branch in &branches {
                        let marker = if branch.is_current { "* " } else { "  " };
                        println!(
                            "{}{:<24} {} {:<16} {}",
                            marker, branch.name, branch.sha, branch.age, branch.message
                        );
                    }
                }
            }
        }
        Commands::Watch { path, interval } => {
            let mut config = load_config(cli.config.as_deref(), &path)?;
            if let Some(secs) = interval {
                config.poll_interval_secs = secs;
                config.validate()?;
            }
            let backend = open_backend(&path)?;

            let mut view = TimelineView::new(backend.clone(), &config);
            view.load_initial().await?;
            let pagination = view.coordinator();
            println!(
                "Watching {} ({} commits, every {}s, Ctrl-C to stop)",
                path.display(),
                pagination.total(),
                config.poll_interval_secs
            );

            let mut updates = view.mount(backend);
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = updates.borrow_and_update().clone();
                        print_snapshot(&snapshot);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        debug!("interrupted");
                        break;
                    }
                }
            }
            view.unmount().await;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>, repo_root: &Path) -> Result<TimelineConfig> {
    let config = TimelineConfig::resolve(explicit, repo_root)?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn open_backend(path: &Path) -> Result<GitBackend> {
    let backend = GitBackend::open(path)
        .with_context(|| format!("failed to open repository at {}", path.display()))?;
    info!(path = %path.display(), "opened repository");
    Ok(backend)
}

fn describe_working_tree(status: &WorkingTreeStatus) -> String {
    if status.is_clean() {
        return "clean".to_string();
    }
    format!(
        "{} staged, {} modified, {} untracked",
        status.staged, status.modified, status.untracked
    )
}

fn describe_remote(status: &RemoteStatus) -> String {
    let branch = status.current_branch.as_deref().unwrap_or("(detached)");
    match &status.remote_branch {
        None => format!("{} has no upstream", branch),
        Some(_) if status.synced => format!("{} is up to date", branch),
        Some(upstream) => format!(
            "{} vs {}: {} ahead, {} behind",
            branch, upstream, status.ahead, status.behind
        ),
    }
}

fn print_snapshot(snapshot: &RepositorySnapshot) {
    let working = snapshot
        .working_tree
        .as_ref()
        .map(describe_working_tree)
        .unwrap_or_else(|| "unknown".to_string());
    let remote = snapshot
        .remote
        .as_ref()
        .map(describe_remote)
        .unwrap_or_else(|| "unknown".to_string());

    match &snapshot.last_error {
        Some(err) => println!("[{}] {} | {} | error: {}", snapshot.ticks, working, remote, err),
        None => println!("[{}] {} | {}", snapshot.ticks, working, remote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_timeline_options() {
        let cli = Cli::try_parse_from([
            "gitup-timeline",
            "-vv",
            "timeline",
            "repo",
            "--granularity",
            "Weekly",
            "--pages",
            "3",
            "--format",
            "json",
            "--grep",
            "fix",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Timeline { path, granularity, pages, format, grep, author, .. } => {
                assert_eq!(path, PathBuf::from("repo"));
                assert_eq!(granularity, Some(Granularity::Week));
                assert_eq!(pages, 3);
                assert!(format == Format::Json);
                assert_eq!(grep.as_deref(), Some("fix"));
                assert_eq!(author, None);
            }
            _ => panic!("expected timeline command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_granularity() {
        assert!(Cli::try_parse_from(["gitup-timeline", "timeline", "--granularity", "month"]).is_err());
    }

    #[test]
    fn test_describe_status() {
        assert_eq!(describe_working_tree(&WorkingTreeStatus::default()), "clean");
        assert_eq!(
            describe_working_tree(&WorkingTreeStatus { staged: 1, modified: 2, untracked: 0 }),
            "1 staged, 2 modified, 0 untracked"
        );

        let mut remote = RemoteStatus {
            current_branch: Some("main".to_string()),
            ..RemoteStatus::default()
        };
        assert_eq!(describe_remote(&remote), "main has no upstream");

        remote.remote_branch = Some("origin/main".to_string());
        remote.ahead = 2;
        assert_eq!(describe_remote(&remote), "main vs origin/main: 2 ahead, 0 behind");

        remote.ahead = 0;
        remote.synced = true;
        assert_eq!(describe_remote(&remote), "main is up to date");
    }
}
