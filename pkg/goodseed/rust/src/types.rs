// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Result structures shared by the store, the scanner and the HTTP layer.
//!
//! Field names match the JSON the dashboard consumes.

use serde::Serialize;

use crate::codec;
use crate::store::value::Value;

/// A group of runs sharing a (possibly nested) directory, e.g.
/// `workspace/project`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub run_count: usize,
    /// Newest modification time among the project's run files (RFC 3339).
    pub last_modified: Option<String>,
}

/// Identity metadata for one run store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInfo {
    pub project: String,
    pub run_id: String,
    pub experiment_name: Option<String>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub status: String,
    pub string_series_paths: Vec<String>,
}

/// One `(path, value)` configuration entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub path: String,
    pub value: Value,
}

/// A numeric observation. `value` may be NaN or infinite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub path: String,
    pub step: i64,
    #[serde(serialize_with = "codec::serialize_float")]
    pub value: f64,
    /// Always false; reserved for downsampled previews.
    pub is_preview: bool,
    /// Always null; reserved for downsampled previews.
    pub preview_completion: Option<f64>,
    pub logged_at: String,
}

impl MetricPoint {
    pub fn new(path: String, step: i64, value: f64, logged_at: String) -> Self {
        Self {
            path,
            step,
            value,
            is_preview: false,
            preview_completion: None,
            logged_at,
        }
    }
}

/// A text observation, typically a log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringPoint {
    pub path: String,
    pub step: i64,
    pub value: String,
    pub logged_at: String,
}

/// A window of string points plus the size of the full matching set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringPage {
    pub points: Vec<StringPoint>,
    pub total: u64,
}

/// Which rows of the string point scope to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageRequest {
    /// Every matching row.
    #[default]
    All,
    /// Skip `offset` rows, then return at most `limit`.
    Window { limit: u64, offset: u64 },
    /// The last `count` rows, still in ascending order.
    Tail { count: u64 },
}

impl PageRequest {
    /// Combine the raw query parameters. `tail` wins over `limit`/`offset`,
    /// and `offset` only applies together with `limit`.
    pub fn from_params(limit: Option<u64>, offset: u64, tail: Option<u64>) -> Self {
        match (tail, limit) {
            (Some(count), _) => PageRequest::Tail { count },
            (None, Some(limit)) => PageRequest::Window { limit, offset },
            (None, None) => PageRequest::All,
        }
    }
}
