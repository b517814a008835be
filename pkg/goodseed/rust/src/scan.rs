// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Discovery of projects and runs under the projects directory.
//!
//! Run stores live at `<project>/runs/<run>.sqlite`, where `<project>` is any
//! relative path (`acme`, `workspace/acme`, ...). The project name is that
//! relative path joined with `/` and is treated as one opaque string.
//!
//! Nothing is cached: every call walks the directory again, so removed or
//! renamed files disappear from the next listing.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::StoreError;
use crate::store::{RunStore, STORE_EXTENSION};
use crate::types::{ProjectInfo, RunInfo};

const RUNS_DIR: &str = "runs";
const DEFAULT_STATUS: &str = "unknown";

/// A run store file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFile {
    pub project: String,
    pub path: PathBuf,
}

impl RunFile {
    /// File name without extension, the fallback run id.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Project name for a run store path: the path of the directory holding
/// `runs/`, relative to `root`. `None` if the path doesn't follow the layout.
pub fn project_name(root: &Path, run_path: &Path) -> Option<String> {
    if run_path.extension().is_none_or(|ext| ext != STORE_EXTENSION) {
        return None;
    }
    let runs_dir = run_path.parent()?;
    if runs_dir.file_name().is_none_or(|name| name != RUNS_DIR) {
        return None;
    }
    let relative = runs_dir.parent()?.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Every run store under `root`, in path order. Empty when `root` doesn't
/// exist.
pub fn find_run_files(root: &Path) -> Vec<RunFile> {
    if !root.is_dir() {
        debug!(root = %root.display(), "Projects directory does not exist");
        return Vec::new();
    }

    let walker = WalkDir::new(root).sort_by_file_name().into_iter();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(project) = project_name(root, entry.path()) {
            files.push(RunFile {
                project,
                path: entry.into_path(),
            });
        }
    }
    files
}

/// Open each run store and read its identity, newest first.
///
/// A store that can't be read is logged and left out; it never fails the
/// whole listing. With `project` set, only that project's stores are opened.
pub fn scan_runs(root: &Path, project: Option<&str>) -> Vec<RunInfo> {
    let candidates = find_run_files(root)
        .into_iter()
        .filter(|f| project.is_none_or(|p| f.project == p));

    let (mut runs, skipped) =
        candidates.fold((Vec::new(), 0usize), |(mut runs, skipped), file| {
            match read_run(&file) {
                Ok(run) => {
                    runs.push(run);
                    (runs, skipped)
                }
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Failed to read run database");
                    (runs, skipped + 1)
                }
            }
        });

    if skipped > 0 {
        debug!(read = runs.len(), skipped, "Run scan finished with unreadable stores");
    }

    runs.sort_by(|a, b| newest_first(a.created_at.as_deref(), b.created_at.as_deref()));
    runs
}

/// Identity and string series names of one run store.
pub fn read_run(file: &RunFile) -> Result<RunInfo, StoreError> {
    let store = RunStore::open(&file.path)?;
    let mut meta = store.read_identity()?;
    let string_series_paths = store.read_string_series_names()?;

    Ok(RunInfo {
        project: file.project.clone(),
        run_id: meta.remove("run_name").unwrap_or_else(|| file.stem()),
        experiment_name: meta.remove("experiment_name"),
        created_at: meta.remove("created_at"),
        closed_at: meta.remove("closed_at"),
        status: meta
            .remove("status")
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        string_series_paths,
    })
}

/// Descending order with missing timestamps last.
fn newest_first(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Projects with run counts and last modification time, newest first.
///
/// Uses file metadata only; no store is opened, so this stays cheap with
/// thousands of runs.
pub fn scan_projects(root: &Path) -> Vec<ProjectInfo> {
    let mut projects: BTreeMap<String, (usize, Option<SystemTime>)> = BTreeMap::new();

    for file in find_run_files(root) {
        let modified = match file.path.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                // Usually removed between the walk and the stat
                debug!(path = %file.path.display(), error = %e, "Skipping run file");
                continue;
            }
        };
        let entry = projects.entry(file.project).or_insert((0, None));
        entry.0 += 1;
        entry.1 = entry.1.max(Some(modified));
    }

    let mut projects: Vec<(String, usize, Option<SystemTime>)> = projects
        .into_iter()
        .map(|(name, (count, modified))| (name, count, modified))
        .collect();
    // BTreeMap iteration already orders names, the stable sort keeps that for ties
    projects.sort_by(|a, b| b.2.cmp(&a.2));

    projects
        .into_iter()
        .map(|(name, run_count, modified)| ProjectInfo {
            name,
            run_count,
            last_modified: modified.map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
        })
        .collect()
}
