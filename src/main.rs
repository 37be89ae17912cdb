//! strudel-manifest CLI
//!
//! Entry point for the `strudel-manifest` command-line tool.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use strudel_manifest::scan::{admission, Admission};
use strudel_manifest::{Config, ManifestState, ManifestStore, RelativePath, SyncOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strudel-manifest")]
#[command(about = "Generate a sample manifest and archive previous versions", version)]
struct Cli {
    /// Scan root (default: current directory)
    #[arg(long, short = 'r', global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (default: <root>/.strudel-manifest.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the manifest if the file tree changed
    Generate {
        /// Override the manifest base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Override the listed file extension (e.g. ".wav")
        #[arg(long, short = 'e')]
        extension: Option<String>,
    },

    /// Report whether the manifest is up to date (exit 1 when stale)
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the current tree fingerprint
    Hash,

    /// Explain whether a path is scanned and which rule decided it
    Explain {
        /// Path relative to the scan root
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            base_url,
            extension,
        } => {
            let config = load_config(&cli.root, cli.config.as_deref());
            let config = match config.with_overrides(base_url, extension) {
                Ok(c) => c,
                Err(e) => fail("Invalid option", e),
            };
            run_generate(&open_store(&cli.root, config));
        }
        Commands::Status { json } => {
            let config = load_config(&cli.root, cli.config.as_deref());
            run_status(&open_store(&cli.root, config), json);
        }
        Commands::Hash => {
            let config = load_config(&cli.root, cli.config.as_deref());
            run_hash(&open_store(&cli.root, config));
        }
        Commands::Explain { path } => {
            let config = load_config(&cli.root, cli.config.as_deref());
            run_explain(&open_store(&cli.root, config), &path);
        }
    }
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("strudel-manifest: {}: {}", context, err);
    process::exit(1);
}

fn load_config(root: &Path, config_path: Option<&Path>) -> Config {
    let loaded = match config_path {
        Some(path) => Config::from_file(path),
        None => Config::load(root),
    };
    match loaded {
        Ok(c) => c,
        Err(e) => fail("Error loading config", e),
    }
}

fn open_store(root: &Path, config: Config) -> ManifestStore {
    match ManifestStore::open(root, config) {
        Ok(store) => store,
        Err(e) => fail("Error loading ignore rules", e),
    }
}

fn run_generate(store: &ManifestStore) {
    let config = store.config();
    match store.sync() {
        Ok(SyncOutcome::UpToDate { .. }) => {
            println!("Manifest up-to-date; no changes detected.");
        }
        Ok(SyncOutcome::Written {
            archived, files, ..
        }) => {
            if let Some(archived) = archived {
                println!("Archived previous manifest to {}", archived.display());
            }
            println!(
                "Wrote {} ({} files) and updated {}.",
                config.manifest_file, files, config.fingerprint_file
            );
        }
        Err(e) => fail("Manifest generation failed", e),
    }
}

fn run_status(store: &ManifestStore, json_output: bool) {
    let status = match store.status() {
        Ok(s) => s,
        Err(e) => fail("Status check failed", e),
    };

    let reason = match &status.state {
        ManifestState::Stable => None,
        ManifestState::Stale(reason) => Some(reason.as_str()),
    };

    if json_output {
        let output = serde_json::json!({
            "state": if status.state.is_stable() { "stable" } else { "stale" },
            "reason": reason,
            "current": status.current.as_str(),
            "stored": status.stored.as_ref().map(|f| f.as_str()),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => fail("Error serializing output", e),
        }
    } else {
        match reason {
            None => println!("Manifest up-to-date ({})", status.current),
            Some(reason) => println!("Manifest stale: {} ({})", reason, status.current),
        }
    }

    if !status.state.is_stable() {
        process::exit(1);
    }
}

fn run_hash(store: &ManifestStore) {
    match store.current_fingerprint() {
        Ok(fp) => println!("{}", fp),
        Err(e) => fail("Scan failed", e),
    }
}

fn run_explain(store: &ManifestStore, raw: &str) {
    let Some(path) = RelativePath::parse(raw) else {
        fail("Invalid path", format!("'{}' names the scan root", raw));
    };

    match admission(&path, store.rules()) {
        Admission::Hidden => println!("{}: skipped (hidden)", path),
        Admission::Excluded(rule) => {
            println!("{}: excluded by '{}'", path, rule.as_str())
        }
        Admission::Included { by: Some(rule) } => {
            println!("{}: included (re-included by '{}')", path, rule.as_str())
        }
        Admission::Included { by: None } => println!("{}: included", path),
    }
}
