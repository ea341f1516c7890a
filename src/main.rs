//! plistmods CLI
//!
//! Entry point for the `plistmods` command-line tool.

use clap::{Parser, Subcommand};
use plistmods::config::DEFAULT_CONFIG_PATH;
use plistmods::{
    DiagnosticKind, EffectiveConfig, ModTree, Pipeline, RunOptions, RunOutcome, Settings,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;

/// Exit code when `--strict` is set and diagnostics were raised
const EXIT_DIAGNOSTICS: i32 = 2;

#[derive(Parser)]
#[command(name = "plistmods")]
#[command(about = "Apply declarative mods to property list files", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply mod files to a plist
    Apply {
        /// Plist to patch (default: `plist` from config)
        plist: Option<PathBuf>,

        /// Extra mod file, applied after discovered ones (repeatable)
        #[arg(long = "mods", value_name = "PATH")]
        mods: Vec<PathBuf>,

        /// Directory to search for mod files, replacing configured dirs (repeatable)
        #[arg(long = "mods-dir", value_name = "DIR")]
        mods_dirs: Vec<PathBuf>,

        /// Path to repo config file (default: .plistmods.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Build target (default: `targets.default` from config)
        #[arg(long)]
        target: Option<String>,

        /// Write the result here instead of over the input
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Merge and report without writing
        #[arg(long)]
        dry_run: bool,

        /// Output the report in JSON format
        #[arg(long)]
        json: bool,

        /// Exit 2 if any diagnostic was raised
        #[arg(long)]
        strict: bool,
    },

    /// List mod files in application order
    List {
        /// Directory to search for mod files, replacing configured dirs (repeatable)
        #[arg(long = "mods-dir", value_name = "DIR")]
        mods_dirs: Vec<PathBuf>,

        /// Path to repo config file (default: .plistmods.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Decode and lint mod files without applying them
    Check {
        /// Mod files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration with provenance
    Config {
        /// Path to repo config file (default: .plistmods.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            plist,
            mods,
            mods_dirs,
            config,
            target,
            output,
            dry_run,
            json,
            strict,
        } => {
            let options = RunOptions {
                plist,
                target,
                output,
                dry_run,
                mods,
            };
            run_apply(config, mods_dirs, options, json, strict);
        }
        Commands::List {
            mods_dirs,
            config,
            json,
        } => {
            run_list(config, mods_dirs, json);
        }
        Commands::Check { files, json } => {
            run_check(&files, json);
        }
        Commands::Config { config } => {
            run_config(config);
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("plistmods=warn")),
        1 => EnvFilter::new("plistmods=info"),
        _ => EnvFilter::new("plistmods=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Build the effective config, turning `--mods-dir` flags into a CLI layer.
fn load_config(config_path: Option<PathBuf>, mods_dirs: &[PathBuf]) -> EffectiveConfig {
    if let Some(path) = &config_path {
        if !path.exists() {
            eprintln!("Error: config file not found: {}", path.display());
            process::exit(1);
        }
    }
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    // Relative --mods-dir values are taken from the working directory, not
    // the config file's.
    let cli_overrides = if mods_dirs.is_empty() {
        None
    } else {
        let cwd = std::env::current_dir().unwrap_or_default();
        let dirs: Vec<String> = mods_dirs
            .iter()
            .map(|d| cwd.join(d).to_string_lossy().to_string())
            .collect();
        Some(json!({ "mods": { "dirs": dirs } }))
    };

    match EffectiveConfig::build(Some(path.as_path()), cli_overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    }
}

fn load_settings(config_path: Option<PathBuf>, mods_dirs: &[PathBuf]) -> Settings {
    match load_config(config_path, mods_dirs).settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    }
}

fn run_apply(
    config_path: Option<PathBuf>,
    mods_dirs: Vec<PathBuf>,
    options: RunOptions,
    json_output: bool,
    strict: bool,
) {
    let pipeline = Pipeline::new(load_settings(config_path, &mods_dirs));

    let outcome = match pipeline.run(&options) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match &outcome {
        RunOutcome::Skipped { target } => {
            if json_output {
                println!("{}", json!({ "status": "skipped", "target": target }));
            } else {
                println!("Target '{}' is not enabled; plist left unchanged", target);
            }
        }
        RunOutcome::Applied { report, output } => {
            if json_output {
                match report.to_json() {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Error serializing report: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                print!("{}", report.to_human());
                match output {
                    Some(path) => println!("Wrote {}", path.display()),
                    None => println!("Dry run: nothing written"),
                }
            }
        }
    }

    let clean = outcome.report().map_or(true, |r| r.is_clean());
    if strict && !clean {
        process::exit(EXIT_DIAGNOSTICS);
    }
}

fn run_list(config_path: Option<PathBuf>, mods_dirs: Vec<PathBuf>, json_output: bool) {
    let pipeline = Pipeline::new(load_settings(config_path, &mods_dirs));

    let files = match pipeline.discover(&[]) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        let paths: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        println!("{}", json!(paths));
    } else if files.is_empty() {
        println!("No mod files found");
    } else {
        for file in &files {
            println!("{}", file.display());
        }
    }
}

fn run_check(files: &[PathBuf], json_output: bool) {
    let mut failed = false;
    let mut results = Vec::new();

    for path in files {
        let (error, findings) = check_file(path);
        let malformed = findings
            .iter()
            .any(|d| d.kind == DiagnosticKind::MalformedModEntry);
        failed |= error.is_some() || malformed;

        if json_output {
            results.push(json!({
                "file": path.display().to_string(),
                "ok": error.is_none() && !malformed,
                "error": error,
                "diagnostics": findings,
            }));
        } else {
            match &error {
                Some(e) => println!("FAIL {}: {}", path.display(), e),
                None if malformed => println!("FAIL {}", path.display()),
                None => println!("ok   {}", path.display()),
            }
            for finding in &findings {
                println!("  {}", finding.to_human());
            }
        }
    }

    if json_output {
        println!("{}", json!(results));
    }
    if failed {
        process::exit(1);
    }
}

fn check_file(path: &Path) -> (Option<String>, Vec<plistmods::Diagnostic>) {
    match ModTree::load(path) {
        Ok(tree) => (None, tree.lint()),
        Err(e) => (Some(e.to_string()), Vec::new()),
    }
}

fn run_config(config_path: Option<PathBuf>) {
    let config = load_config(config_path, &[]);
    match config.to_json() {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            process::exit(1);
        }
    }
}
