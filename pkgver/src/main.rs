//! Package version resolver.
//!
//! Prints the version of a project directory derived from its git history,
//! an archive descriptor, frozen artifact metadata, or its directory name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pkgver::exit_codes;
use pkgver::io::config::{PkgverConfig, load_project_config};
use pkgver::io::init::{InitOptions, init_project};
use pkgver::snapshot::snapshot;
use pkgver::{Resolver, VersionUnknown, logging};

#[derive(Parser)]
#[command(
    name = "pkgver",
    version,
    about = "Derive a package version from git history or distribution metadata"
)]
struct Cli {
    /// Project directory to inspect.
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Config file (defaults to `<dir>/pkgver.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the release tag prefix.
    #[arg(long, global = true)]
    tag_prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved version.
    Show {
        /// Print version, dirty flag and origin as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Freeze the resolved version into an artifact directory.
    Snapshot {
        /// Artifact directory receiving the frozen metadata file.
        #[arg(long)]
        out: PathBuf,
    },
    /// Write `.git_archival.txt`, its `.gitattributes` entry and `pkgver.toml`.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_cli_config(&cli)?;
    match cli.command {
        Command::Show { json } => cmd_show(&cli.dir, config, json),
        Command::Snapshot { out } => cmd_snapshot(&cli.dir, config, &out),
        Command::Init { force } => cmd_init(&cli.dir, &config, force),
    }
}

fn load_cli_config(cli: &Cli) -> Result<PkgverConfig> {
    let mut config = load_project_config(&cli.dir, cli.config.as_deref())?;
    if let Some(prefix) = &cli.tag_prefix {
        config.tag_prefix = prefix.clone();
        config.validate().context("validate --tag-prefix")?;
    }
    Ok(config)
}

fn cmd_show(dir: &Path, config: PkgverConfig, json: bool) -> Result<()> {
    let rendered = Resolver::new(config).resolve(dir)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rendered).context("serialize version json")?
        );
    } else {
        println!("{}", rendered.version);
    }
    Ok(())
}

fn cmd_snapshot(dir: &Path, config: PkgverConfig, out: &Path) -> Result<()> {
    let rendered = snapshot(&Resolver::new(config), dir, out)?;
    println!("{}", rendered.version);
    Ok(())
}

fn cmd_init(dir: &Path, config: &PkgverConfig, force: bool) -> Result<()> {
    let paths = init_project(dir, config, &InitOptions { force })?;
    println!("{}", paths.archival_path.display());
    Ok(())
}

/// Map a failure to a stable exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<VersionUnknown>() {
        Some(unknown) if unknown.is_no_signal() => exit_codes::UNKNOWN,
        _ => exit_codes::INVALID,
    }
}
