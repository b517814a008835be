// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! goodseed - serve or list local experiment runs.
//!
//! Usage:
//!   goodseed                     Start the local server (same as `serve`)
//!   goodseed serve [DIR]         Start the local server
//!   goodseed list [DIR] [-p P]   List projects, or the runs of one project

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use goodseed_server::config::DEFAULT_PORT;
use goodseed_server::{ServerConfig, run_server, scan};

/// Timestamps are shown to the second.
const TIMESTAMP_WIDTH: usize = 19;

#[derive(Parser, Debug)]
#[command(name = "goodseed")]
#[command(about = "Goodseed ML experiment tracker")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the local server
    Serve {
        /// Directory containing run databases (default: ~/.goodseed/projects)
        dir: Option<PathBuf>,

        /// Port to listen on
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Print extra startup information
        #[arg(short, long)]
        verbose: bool,
    },
    /// List projects (or runs with --project)
    List {
        /// Directory containing run databases (default: ~/.goodseed/projects)
        dir: Option<PathBuf>,

        /// List runs within a specific project (e.g. workspace/project-name)
        #[arg(short, long)]
        project: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Serve {
        dir: None,
        port: DEFAULT_PORT,
        verbose: false,
    });

    match command {
        Command::Serve { dir, port, verbose } => {
            init_tracing(verbose);
            run_server(ServerConfig::new(dir, port, verbose)).await
        }
        Command::List { dir, project } => {
            init_tracing(false);
            let config = ServerConfig::new(dir, DEFAULT_PORT, false);
            list(&config.projects_dir, project.as_deref());
            Ok(())
        }
    }
}

/// RUST_LOG takes precedence, fallback to info (debug with --verbose).
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn list(projects_dir: &Path, project: Option<&str>) {
    if !projects_dir.exists() {
        println!("Projects directory does not exist: {}", projects_dir.display());
        return;
    }

    match project {
        Some(project) => list_runs(projects_dir, project),
        None => list_projects(projects_dir),
    }
}

fn list_runs(projects_dir: &Path, project: &str) {
    let runs = scan::scan_runs(projects_dir, Some(project));
    if runs.is_empty() {
        println!("No runs found in project '{project}'.");
        return;
    }

    for run in &runs {
        println!("  [{}] {}", run.status, run.run_id);
        if let Some(name) = run.experiment_name.as_deref().filter(|n| !n.is_empty()) {
            println!("      name: {name}");
        }
        println!("      created: {}", short_timestamp(run.created_at.as_deref()));
    }
    println!("\n{} run(s) in {project}", runs.len());
}

fn list_projects(projects_dir: &Path) {
    let projects = scan::scan_projects(projects_dir);
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }

    for project in &projects {
        let plural = if project.run_count == 1 { "" } else { "s" };
        println!(
            "  {}  ({} run{plural}, last modified: {})",
            project.name,
            project.run_count,
            short_timestamp(project.last_modified.as_deref())
        );
    }
    println!("\n{} project(s)", projects.len());
}

fn short_timestamp(timestamp: Option<&str>) -> String {
    match timestamp.filter(|t| !t.is_empty()) {
        Some(t) => t.chars().take(TIMESTAMP_WIDTH).collect(),
        None => "-".to_string(),
    }
}
