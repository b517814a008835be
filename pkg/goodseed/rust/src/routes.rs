// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Run-scoped routes and run store resolution.
//!
//! Paths under `/api/runs/` have the shape `{project}/{run}/{resource}`.
//! `{project}` may itself contain `/` (`workspace/acme`), so the path is
//! split from the right: the resource is a fixed suffix, `{run}` is the
//! single segment before it and everything left of that is the project.

use std::path::{Component, Path, PathBuf};

use crate::store::STORE_EXTENSION;

/// Prefix of run-scoped routes.
pub const RUN_ROUTE_PREFIX: &str = "/api/runs/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResource {
    Configs,
    Metrics,
    MetricPaths,
    StringSeries,
}

/// Route table, tested in order; the first matching suffix wins.
const RUN_ROUTES: &[(&str, RunResource)] = &[
    ("configs", RunResource::Configs),
    ("metrics", RunResource::Metrics),
    ("metric-paths", RunResource::MetricPaths),
    ("string_series", RunResource::StringSeries),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRoute {
    pub project: String,
    pub run: String,
    pub resource: RunResource,
}

/// Match the part of a run route after [`RUN_ROUTE_PREFIX`], already
/// percent-decoded. `None` means no route matches.
pub fn match_run_route(rest: &str) -> Option<RunRoute> {
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    RUN_ROUTES.iter().find_map(|(suffix, resource)| {
        let head = rest.strip_suffix(suffix)?.strip_suffix('/')?;
        let (project, run) = head.rsplit_once('/')?;
        if project.is_empty() || run.is_empty() {
            return None;
        }
        Some(RunRoute {
            project: project.to_string(),
            run: run.to_string(),
            resource: *resource,
        })
    })
}

/// Location of a run store under `root`, if it exists and stays under
/// `root`.
///
/// Every project segment and the run name must be a plain path component, so
/// `..`, `.`, empty segments and absolute paths are refused before touching
/// the filesystem. The canonical path is then checked against the canonical
/// root so symlinks can't lead outside it either.
pub fn resolve_run_path(root: &Path, project: &str, run: &str) -> Option<PathBuf> {
    if !project.split('/').all(is_plain_segment) || !is_plain_segment(run) {
        return None;
    }

    let mut path = root.to_path_buf();
    path.extend(project.split('/'));
    path.push("runs");
    path.push(format!("{run}.{STORE_EXTENSION}"));

    if !path.is_file() {
        return None;
    }

    let canonical_root = root.canonicalize().ok()?;
    let canonical = path.canonicalize().ok()?;
    if !canonical.starts_with(&canonical_root) {
        tracing::warn!(project, run, "Run path escapes the projects directory");
        return None;
    }
    Some(path)
}

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == segment
    )
}
