use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use textgroup::services::{
    load_items, scan_file_names, Algorithm, GroupingConfig, GroupingReport, InputFormat,
};
use textgroup::{similarity, ItemList};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "textgroup",
    version,
    about = "Group similar file names and short texts"
)]
struct Cli {
    /// Config file (default: `<config dir>/textgroup/config.json` when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output on stderr (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Group items by similarity
    Group(GroupArgs),

    /// Print the similarity percentage of two strings
    Compare {
        a: String,
        b: String,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCmd,
    },
}

#[derive(Args, Debug)]
struct GroupArgs {
    /// Input file (JSON object, JSON array or one item per line); `-` for stdin
    #[arg(short, long, value_name = "FILE", required_unless_present = "dir")]
    input: Option<String>,

    /// Group the file names found under this directory
    #[arg(short, long, value_name = "DIR", conflicts_with = "input")]
    dir: Option<PathBuf>,

    /// How to read `--input`
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,

    /// Grouping strategy (overrides config)
    #[arg(short, long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Loosest threshold in percent (exhaustive) or the match limit (fast)
    #[arg(short, long, value_name = "PERCENT")]
    lower_limit: Option<i32>,

    /// Include the 100% pass in the threshold search
    #[arg(long)]
    keep_pure_matches: bool,

    /// Accept a threshold even when singletons outnumber groups
    #[arg(long)]
    allow_single_majority: bool,

    /// Stop the exhaustive search after this many comparisons
    #[arg(long, value_name = "N")]
    max_comparisons: Option<u64>,

    /// Only keep files with this extension in `--dir` mode (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Write the JSON report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the JSON report instead of the summary
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Print the effective config
    Show,

    /// Write the default config to the config location
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let (config, config_path) =
        GroupingConfig::resolve(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Group(args) => run_group(config, args)?,

        Commands::Compare { a, b } => {
            println!("{:.2}%", similarity(&a, &b));
        }

        Commands::Config { command } => match command {
            ConfigCmd::Show => {
                match &config_path {
                    Some(path) => eprintln!("▶ Loaded from {}", path.display()),
                    None => eprintln!("▶ No config file found, using defaults"),
                }
                println!("{}", serde_json::to_string_pretty(&config)?);
            }

            ConfigCmd::Init { force } => {
                let path = match cli.config.clone() {
                    Some(path) => path,
                    None => GroupingConfig::default_path()?,
                };
                GroupingConfig::default()
                    .write_to(&path, force)
                    .with_context(|| format!("Failed to write config {:?}", path))?;
                println!("✅ Wrote default config to {}", path.display());
            }
        },
    }

    Ok(())
}

/// Logs go to stderr; `-v` raises and `-q` lowers the level, `RUST_LOG` refines it.
fn init_logging(verbose: u8, quiet: u8) {
    let level = if quiet > verbose {
        Level::ERROR
    } else {
        match verbose - quiet {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    // Also installs the bridge for records from the `log` facade.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn run_group(mut config: GroupingConfig, args: GroupArgs) -> Result<()> {
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(limit) = args.lower_limit {
        if !(0..=100).contains(&limit) {
            eprintln!("⚠️  Limit {}% is outside 0..=100 and will be clamped", limit);
        }
        config.lower_match_limit = limit;
    }
    if args.keep_pure_matches {
        config.ignore_pure_matches = false;
    }
    if args.allow_single_majority {
        config.groups_must_outweigh_singles = false;
    }
    if args.max_comparisons.is_some() {
        config.max_comparisons = args.max_comparisons;
    }
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }

    let items = load_input(&args, &config)?;
    if items.is_empty() {
        println!("No items to group.");
        return Ok(());
    }

    eprintln!(
        "▶ Grouping {} item(s) with the {} strategy…",
        items.len(),
        config.algorithm
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Comparing…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let report = benchmark("grouping", || GroupingReport::generate(&config, &items));
    spinner.finish_and_clear();

    if let Some(output) = &args.output {
        report
            .write_json(output)
            .with_context(|| format!("Failed to write report {:?}", output))?;
        eprintln!(
            "✅ Wrote {} group(s) to {}",
            report.group_count,
            output.display()
        );
    }

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn load_input(args: &GroupArgs, config: &GroupingConfig) -> Result<ItemList<String>> {
    if let Some(dir) = &args.dir {
        eprintln!("▶ Listing files in: {}", dir.display());
        return scan_file_names(dir, &config.extensions)
            .with_context(|| format!("Failed to list {:?}", dir));
    }

    match &args.input {
        Some(source) => load_items(source, args.format)
            .with_context(|| format!("Failed to read items from {}", source)),
        None => anyhow::bail!("Either --input or --dir is required"),
    }
}

fn print_summary(report: &GroupingReport<String>) {
    match report.accepted_threshold {
        Some(threshold) => println!(
            "Found {} group(s) ({} multi, {} single) at {}% similarity:",
            report.group_count, report.multi_groups, report.singletons, threshold
        ),
        None => println!(
            "Found {} group(s) ({} multi, {} single):",
            report.group_count, report.multi_groups, report.singletons
        ),
    }

    for (i, group) in report.groups.iter().enumerate() {
        println!(" Group {}:", i + 1);
        for item in group {
            println!("   ▶ {} → {}", item.key, item.text);
        }
    }

    if report.budget_exhausted {
        println!(
            "\n⚠️  Comparison budget exhausted after {} comparison(s); showing the last complete pass.",
            report.comparisons
        );
    }
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    eprintln!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
