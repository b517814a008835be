// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::ffi::OsString;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8765;

const HOME_ENV: &str = "GOODSEED_HOME";
const DEFAULT_HOME_DIR: &str = ".goodseed";
const PROJECTS_DIR: &str = "projects";

/// Server configuration, fixed at startup and shared read-only by every
/// request handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Root holding `<project>/runs/<run>.sqlite` files.
    pub projects_dir: PathBuf,
    /// Loopback port to listen on.
    pub port: u16,
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            port: DEFAULT_PORT,
            verbose: false,
        }
    }
}

impl ServerConfig {
    /// Config for `projects_dir`, or the default directory when `None`.
    pub fn new(projects_dir: Option<PathBuf>, port: u16, verbose: bool) -> Self {
        Self {
            projects_dir: projects_dir.unwrap_or_else(default_projects_dir),
            port,
            verbose,
        }
    }
}

/// `$GOODSEED_HOME/projects`, where `GOODSEED_HOME` defaults to `~/.goodseed`.
pub fn default_projects_dir() -> PathBuf {
    goodseed_home(std::env::var_os(HOME_ENV), std::env::var_os("HOME")).join(PROJECTS_DIR)
}

fn goodseed_home(explicit: Option<OsString>, home: Option<OsString>) -> PathBuf {
    match explicit.filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => home
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_HOME_DIR),
    }
}
