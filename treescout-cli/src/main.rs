use clap::{Parser, Subcommand};
use colored::Colorize;
use std::{num::NonZeroUsize, path::PathBuf, time::Duration, time::Instant};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use treescout::{
    config::SearchConfig,
    fs::OsFs,
    permissions::RuleConfig,
    results::SearchOutput,
    search::{search_many, CyclePolicy, DEFAULT_MAX_DEPTH},
    SearchError,
};

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchConfig {
    /// Query, e.g. `type:image holiday` or `case:sensitive "Read Me"`
    query: Option<String>,

    /// Root directory to search in (repeat for several roots)
    #[arg(short = 'd', long = "root")]
    roots: Vec<PathBuf>,

    /// Number of symlink hops to follow
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// How symlink loops are bounded (depth|visited)
    #[arg(long, default_value = "depth")]
    cycle_policy: CyclePolicy,

    /// Hide entries whose name starts with a dot
    #[arg(long)]
    hide_dotfiles: bool,

    /// Hide everything under this path prefix
    #[arg(long = "deny")]
    deny: Vec<String>,

    /// Patterns to ignore (gitignore format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,

    /// Print one JSON object per match
    #[arg(long)]
    json: bool,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a directory tree for entries matching a query
    Search(Box<CliSearchConfig>),
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => {
            let file_config = SearchConfig::load_from(args.config.as_deref())?;
            let config = file_config.merge_with_cli(cli_config(&args));
            init_logging(&config.log_level);

            rayon::ThreadPoolBuilder::new()
                .num_threads(config.thread_count.get())
                .build_global()
                .map_err(|e| SearchError::config_error(format!("Thread pool: {}", e)))?;

            let scopes = config.scopes()?;
            let checker = config.checker(&scopes)?;
            let options = config.search_options();
            debug!("Searching {:?} for {:?}", scopes, config.query);

            let start = Instant::now();
            let output = search_many(&OsFs, &scopes, &config.query, checker.as_ref(), &options)?;
            let elapsed = start.elapsed();
            options.metrics.log_stats();

            print_search_results(&output, &config, scopes.len() > 1, elapsed)
        }
    }
}

/// Turns parsed arguments into a config whose unset values are the defaults,
/// so `merge_with_cli` only picks up what was actually given.
fn cli_config(args: &CliSearchConfig) -> SearchConfig {
    let defaults = SearchConfig::default();
    SearchConfig {
        roots: if args.roots.is_empty() {
            defaults.roots
        } else {
            args.roots.clone()
        },
        query: args.query.clone().unwrap_or_default(),
        max_depth: args.max_depth,
        cycle_policy: args.cycle_policy,
        hide_dotfiles: args.hide_dotfiles,
        rules: args
            .deny
            .iter()
            .map(|prefix| RuleConfig {
                path: prefix.clone(),
                regex: false,
                allow: false,
            })
            .collect(),
        ignore_patterns: args.ignore.clone(),
        stats_only: args.stats,
        json: args.json,
        thread_count: args.threads.unwrap_or(defaults.thread_count),
        log_level: args.log_level.clone().unwrap_or(defaults.log_level),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn print_search_results(
    output: &SearchOutput,
    config: &SearchConfig,
    several_roots: bool,
    elapsed: Duration,
) -> Result<()> {
    if !config.stats_only {
        for m in &output.matches {
            if config.json {
                println!("{}", serde_json::to_string(m)?);
                continue;
            }
            let path = if several_roots {
                m.display_path()
            } else {
                m.relative_path.clone()
            };
            if m.info.is_dir() {
                println!("{}", format!("{}/", path).blue());
            } else {
                println!("{}", path);
            }
        }
    }

    // sub-millisecond precision is noise
    let elapsed = Duration::from_millis(elapsed.as_millis() as u64);
    let summary = format!(
        "Found {} matches ({} files, {} directories) in {}",
        output.total_matches,
        output.files,
        output.dirs,
        humantime::format_duration(elapsed)
    );
    if config.json {
        eprintln!("{}", summary);
    } else {
        println!("\n{}", summary);
    }
    Ok(())
}
