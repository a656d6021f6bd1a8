// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! CLI entry point for hyper-sublayers
//!
//! Provides commands for compiling a spec file into `karabiner.json`,
//! checking it for problems, and managing backups of the output.

use anyhow::{anyhow, bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use hyper_sublayers::{
    config::{self, ConfigManager, DocumentValidator, SpecFile, ValidationLevel},
    core::{ConflictDetector, LayerCompiler},
    watcher::SpecWatcher,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hyper-sublayers")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the spec file
    #[arg(
        short,
        long,
        global = true,
        env = "HYPER_SUBLAYERS_SPEC",
        default_value = "~/.config/karabiner/hyper.toml"
    )]
    spec: PathBuf,

    /// Path to the generated karabiner.json (overrides [output].path)
    #[arg(short, long, global = true, env = "KARABINER_CONFIG")]
    output: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the spec and write karabiner.json
    Build {
        /// Skip the backup of the current output
        #[arg(long)]
        no_backup: bool,
    },

    /// Compile and validate without writing anything
    Check,

    /// Print the generated document to stdout
    Print,

    /// List the state variable allocated to every leader path
    Vars,

    /// List backups of the output file
    Backups,

    /// Restore the output file from a backup
    Restore {
        /// Backup file name (as shown by `backups`) or path
        backup: PathBuf,
    },

    /// Rebuild whenever the spec file changes
    Watch {
        /// Skip the backup of the current output
        #[arg(long)]
        no_backup: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let spec_path = expand(&cli.spec)?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Build { no_backup } => build(&spec_path, output, no_backup)?,
        Commands::Check => check(&spec_path)?,
        Commands::Print => print(&spec_path)?,
        Commands::Vars => list_variables(&spec_path)?,
        Commands::Backups => list_backups(&spec_path, output)?,
        Commands::Restore { backup } => restore(&spec_path, output, &backup)?,
        Commands::Watch { no_backup } => watch(&spec_path, output, no_backup)?,
    }

    Ok(())
}

/// Logs go to stderr so `print` output stays clean; `RUST_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hyper_sublayers={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn expand(path: &Path) -> anyhow::Result<PathBuf> {
    let raw = path.to_str().ok_or_else(|| anyhow!("Invalid path encoding"))?;
    Ok(PathBuf::from(shellexpand::tilde(raw).as_ref()))
}

fn load(spec_path: &Path) -> anyhow::Result<SpecFile> {
    println!("{} Reading spec: {}", "→".cyan(), spec_path.display());
    SpecFile::load(spec_path).with_context(|| format!("Failed to load {}", spec_path.display()))
}

/// Compile the spec and replace the output in one transaction
fn build(spec_path: &Path, output: Option<&Path>, no_backup: bool) -> anyhow::Result<()> {
    println!("{} Reading spec: {}", "→".cyan(), spec_path.display());
    let summary = config::build(spec_path, output, no_backup)
        .with_context(|| format!("Failed to build {}", spec_path.display()))?;

    if let Some(backup) = &summary.backup_path {
        println!("{} Backup: {}", "→".cyan(), backup.display());
    }

    println!(
        "{} Wrote {} rule{} across {} profile{} to {}",
        "✓".green().bold(),
        summary.rules,
        if summary.rules == 1 { "" } else { "s" },
        summary.profiles,
        if summary.profiles == 1 { "" } else { "s" },
        summary.output_path.display()
    );

    Ok(())
}

/// Compile and validate, reporting every issue
fn check(spec_path: &Path) -> anyhow::Result<()> {
    let spec = load(spec_path)?;
    let document = spec.build_document()?;

    let manipulators = ConflictDetector::from_rules(document.rules().map(|(_, rule)| rule))
        .total_manipulators();
    println!("{} Compiled {} manipulators\n", "✓".green(), manipulators);

    let report = DocumentValidator::new().validate(&document);

    if report.issues.is_empty() {
        println!("{} {}", "✓".green().bold(), "No problems detected!".bold());
        return Ok(());
    }

    for (i, issue) in report.issues.iter().enumerate() {
        let label = match issue.validation_level {
            ValidationLevel::Error => format!("Error {}", i + 1).red().bold(),
            ValidationLevel::Warning => format!("Warning {}", i + 1).yellow().bold(),
        };

        println!("{} {}", label, issue.rule.cyan());
        println!("  {}", issue.message);
        if let Some(suggestion) = &issue.suggestion {
            println!("  {} {}", "hint:".dimmed(), suggestion);
        }
        println!();
    }

    if report.has_errors() {
        bail!("The generated document has errors and would not be written");
    }

    Ok(())
}

fn print(spec_path: &Path) -> anyhow::Result<()> {
    let spec = SpecFile::load(spec_path)
        .with_context(|| format!("Failed to load {}", spec_path.display()))?;
    print!("{}", spec.build_document()?.to_pretty_json()?);
    Ok(())
}

/// List every allocated state variable per profile
fn list_variables(spec_path: &Path) -> anyhow::Result<()> {
    let spec = load(spec_path)?;
    let options = spec.compile_options()?;

    for profile in spec.profiles() {
        let layer_spec = spec.layer_spec(&profile)?;
        let compilation = LayerCompiler::new(&layer_spec, &options)?.compile()?;

        println!("{}", format!("Profile: {}\n", profile.name).bold());
        for (path, variable) in &compilation.variables {
            println!("{} → {}", format!("{}", path).cyan().bold(), variable.name().green());
        }
        println!(
            "\n{} Total: {} variables\n",
            "✓".green(),
            compilation.variables.len()
        );
    }

    Ok(())
}

fn manager_for(spec_path: &Path, output: Option<&Path>) -> anyhow::Result<ConfigManager> {
    let output_path = match output {
        Some(path) => expand(path)?,
        None => load(spec_path)?.output_path(None),
    };
    Ok(ConfigManager::new(output_path)?)
}

fn list_backups(spec_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let manager = manager_for(spec_path, output)?;
    let backups = manager.list_backups()?;

    println!(
        "{}",
        format!("Backups of: {}\n", manager.output_path().display()).bold()
    );

    for backup in &backups {
        let name = backup
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {}", name.cyan());
    }

    println!("\n{} Total: {} backups", "✓".green(), backups.len());
    Ok(())
}

fn restore(spec_path: &Path, output: Option<&Path>, backup: &Path) -> anyhow::Result<()> {
    let manager = manager_for(spec_path, output)?;

    let backup_path = if backup.exists() {
        backup.to_path_buf()
    } else {
        manager.backup_dir().join(backup)
    };

    manager.restore_backup(&backup_path)?;

    println!(
        "{} Restored {} from {}",
        "✓".green().bold(),
        manager.output_path().display(),
        backup_path.display()
    );
    Ok(())
}

/// Build once, then rebuild on every change until interrupted
fn watch(spec_path: &Path, output: Option<&Path>, no_backup: bool) -> anyhow::Result<()> {
    let watcher = SpecWatcher::new(spec_path)
        .with_context(|| format!("Failed to watch {}", spec_path.display()))?;

    if let Err(e) = build(spec_path, output, no_backup) {
        report_failure(&e);
    }

    println!("{} Watching {} (Ctrl-C to stop)", "→".cyan(), spec_path.display());

    while watcher.wait_for_change() {
        println!();
        if let Err(e) = build(spec_path, output, no_backup) {
            report_failure(&e);
        }
    }

    Ok(())
}

fn report_failure(e: &anyhow::Error) {
    error!("{:#}", e);
    println!("{} {:#}", "✗".red().bold(), e);
}
