//! # edugitops
//!
//! Command-line front end over the [`EduGitOps`] facade.

#![deny(unsafe_code)]

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edugitops::{EduGitOps, EduSettings, Outcome, SyncStatus};
use edugitops_settings::{load_settings, load_settings_from_path};

/// Student lab roster management and monitoring.
#[derive(Parser, Debug)]
#[command(name = "edugitops", version, about = "Student lab roster management and monitoring")]
struct Cli {
    /// Settings file (defaults to `~/.edugitops/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Directory holding `alumnos.yaml` and `catalogo-servicios.yaml`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter when `RUST_LOG` is unset (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List students and their checks.
    List,
    /// List catalog services.
    Catalog,
    /// Print the next free student id.
    NextId,
    /// Print the raw roster text.
    Raw,
    /// Create or update a student.
    Upsert {
        /// Student id (defaults to the next free id).
        #[arg(long)]
        id: Option<String>,
        /// Student name.
        #[arg(long)]
        name: String,
        /// Catalog app id; repeat for several.
        #[arg(long = "app")]
        apps: Vec<String>,
    },
    /// Delete a student.
    Delete {
        /// Student id.
        id: String,
    },
    /// Validate a hand-edited roster and save it.
    Validate {
        /// Roster file, or `-` for stdin.
        file: String,
    },
    /// Overwrite local documents with the remote copies.
    Pull,
    /// Commit the local roster to the remote.
    Push {
        /// Commit message.
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Rebuild Checkmk rules from the roster.
    Monitor,
}

fn load(cli: &Cli) -> Result<EduSettings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => load_settings().context("Failed to load settings")?,
    };
    if let Some(dir) = &cli.data_dir {
        settings.data.dir = Some(dir.to_string_lossy().into_owned());
    }
    Ok(settings)
}

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut text = String::new();
        let _ = std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read roster from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code)
        .ok()
        .filter(|c| *c != 0)
        .map_or(ExitCode::FAILURE, ExitCode::from)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = load(&cli)?;
    edugitops_core::logging::init_subscriber(
        cli.log_level.as_deref().unwrap_or(settings.logging.level.as_str()),
    );
    let app = EduGitOps::from_settings(&settings).context("Failed to set up remote sync")?;

    match cli.command {
        Command::List => {
            for student in app.load_roster() {
                println!("{}\t{}\t{}", student.id, student.name, student.apps.join(","));
                for check in &student.checks {
                    println!("\t{check}");
                }
            }
        }
        Command::Catalog => {
            for entry in app.load_catalog().entries() {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.id,
                    entry.port,
                    entry.protocol,
                    entry.name.as_deref().unwrap_or("")
                );
            }
        }
        Command::NextId => println!("{}", app.next_id()),
        Command::Raw => print!("{}", app.raw_roster()),
        Command::Upsert { id, name, apps } => {
            let id = id.unwrap_or_else(|| app.next_id());
            let outcome = app.upsert(&id, &name, apps)?;
            match outcome {
                Outcome::Created => println!("created student {id}"),
                Outcome::Updated => println!("updated student {id}"),
            }
        }
        Command::Delete { id } => {
            let next = app.delete(&id)?;
            println!("deleted student {id}");
            if let Some(next) = next {
                println!("next: {next}");
            }
        }
        Command::Validate { file } => {
            let text = read_input(&file)?;
            let roster = app.validate_raw_text(&text)?;
            println!("roster valid, {} students saved", roster.len());
        }
        Command::Pull => {
            let report = app.pull().await;
            for (doc, err) in &report.failures {
                eprintln!("{doc}: {err}");
            }
            println!("sync status: {}", report.status());
            if report.status() != SyncStatus::Synced {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Push { message } => {
            let outcome = app.push(message.as_deref()).await?;
            if outcome.created {
                println!("roster created on the remote");
            } else {
                println!("roster pushed");
            }
        }
        Command::Monitor => match app.run_monitoring_sync().await {
            Ok(report) => println!(
                "Checkmk updated: {} rules, {} commands",
                report.rules_created, report.commands_run
            ),
            Err(e) => {
                eprintln!("error: {e}");
                return Ok(exit_code(e.exit_code()));
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
