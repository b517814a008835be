// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Read-only access to a single run store.
//!
//! A run store is a SQLite file written by the tracking client. This module
//! never writes to it: connections are opened read-only (the file is never
//! created) and carry a busy timeout so a reader facing a concurrent writer
//! fails the request instead of blocking forever.
//!
//! Tables read:
//! - `run_meta(key, value)` - identity metadata
//! - `configs(path, type_tag, value)` - tagged configuration values
//! - `metric_series(id, path)` / `metric_points(series_id, step, y, ts)`
//! - `string_series(id, path)` / `string_points(series_id, step, value, ts)`,
//!   both optional

pub mod value;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::DateTime;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params_from_iter};

use crate::error::StoreError;
use crate::types::{ConfigEntry, MetricPoint, PageRequest, StringPage, StringPoint};

/// File extension of run stores.
pub const STORE_EXTENSION: &str = "sqlite";

/// How long a read waits on a writer's lock before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(3);

const METRIC_SELECT: &str = "SELECT s.path, p.step, p.y, p.ts
     FROM metric_points p
     JOIN metric_series s ON p.series_id = s.id";

const STRING_FROM: &str = "FROM string_points p
     JOIN string_series s ON p.series_id = s.id";

/// An open, read-only run store. Dropping it closes the connection.
pub struct RunStore {
    conn: Connection,
    path: PathBuf,
}

impl RunStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        // Missing files are reported, never created
        if !path.is_file() {
            return Err(StoreError::Missing(path.display().to_string()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(busy_timeout)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// All identity key/value pairs. NULL values are skipped.
    pub fn read_identity(&self) -> Result<HashMap<String, String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM run_meta")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, raw_text(row.get_ref(1)?)))
        })?;

        let mut meta = HashMap::new();
        for row in rows {
            if let (key, Some(value)) = row? {
                meta.insert(key, value);
            }
        }
        Ok(meta)
    }

    /// Configuration entries in table order, values decoded from their type tag.
    pub fn read_configs(&self) -> Result<Vec<ConfigEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, type_tag, value FROM configs")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                raw_text(row.get_ref(2)?),
            ))
        })?;

        let mut configs = Vec::new();
        for row in rows {
            let (path, tag, raw) = row?;
            let value = value::decode_tagged(&tag, raw.as_deref()).map_err(|source| {
                StoreError::Config {
                    path: path.clone(),
                    source,
                }
            })?;
            configs.push(ConfigEntry { path, value });
        }
        Ok(configs)
    }

    /// Metric points of one series ordered by step, or of every series
    /// ordered by `(path, step)`.
    pub fn read_metric_points(&self, series: Option<&str>) -> Result<Vec<MetricPoint>, StoreError> {
        let sql = match series {
            Some(_) => format!("{METRIC_SELECT} WHERE s.path = ?1 ORDER BY p.step"),
            None => format!("{METRIC_SELECT} ORDER BY s.path, p.step"),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(series), |row| {
            // SQLite stores NaN as NULL
            let value = row.get::<_, Option<f64>>(2)?.unwrap_or(f64::NAN);
            Ok(MetricPoint::new(
                row.get(0)?,
                row.get(1)?,
                value,
                timestamp_to_rfc3339(row.get(3)?),
            ))
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Sorted names of metric series holding at least one point.
    pub fn read_metric_series_names(&self) -> Result<Vec<String>, StoreError> {
        self.distinct_series_paths("metric_series", "metric_points")
    }

    /// Sorted names of string series holding at least one point. Empty when
    /// the store has no string tables.
    pub fn read_string_series_names(&self) -> Result<Vec<String>, StoreError> {
        if !self.has_string_tables()? {
            return Ok(Vec::new());
        }
        self.distinct_series_paths("string_series", "string_points")
    }

    /// A page of string points.
    ///
    /// Rows are ordered by step within one series, or by `(path, step)` when
    /// no series is named. `total` counts the whole matching set regardless of
    /// `page`. A tail page returns the last rows of that ordering, still
    /// ascending.
    pub fn read_string_points(
        &self,
        series: Option<&str>,
        page: PageRequest,
    ) -> Result<StringPage, StoreError> {
        if !self.has_string_tables()? {
            tracing::debug!(path = %self.path.display(), "No string series tables");
            return Ok(StringPage::default());
        }

        let filter = if series.is_some() {
            "WHERE s.path = ?1"
        } else {
            ""
        };

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) {STRING_FROM} {filter}"),
            params_from_iter(series),
            |row| row.get(0),
        )?;

        let (order, order_desc) = if series.is_some() {
            ("step", "p.step DESC")
        } else {
            ("path, step", "s.path DESC, p.step DESC")
        };
        let select = format!(
            "SELECT s.path AS path, p.step AS step, p.value AS value, p.ts AS ts {STRING_FROM} {filter}"
        );
        let mut params: Vec<rusqlite::types::Value> = series
            .map(|s| rusqlite::types::Value::Text(s.to_string()))
            .into_iter()
            .collect();

        let sql = match page {
            PageRequest::All => format!("{select} ORDER BY {order}"),
            PageRequest::Window { limit, offset } => {
                params.push(sql_int(limit));
                params.push(sql_int(offset));
                let n = params.len();
                format!("{select} ORDER BY {order} LIMIT ?{} OFFSET ?{n}", n - 1)
            }
            PageRequest::Tail { count } => {
                params.push(sql_int(count));
                let n = params.len();
                format!(
                    "SELECT * FROM ({select} ORDER BY {order_desc} LIMIT ?{n}) ORDER BY {order}"
                )
            }
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Ok(StringPoint {
                path: row.get(0)?,
                step: row.get(1)?,
                value: raw_text(row.get_ref(2)?).unwrap_or_default(),
                logged_at: timestamp_to_rfc3339(row.get(3)?),
            })
        })?;

        Ok(StringPage {
            points: rows.collect::<Result<_, _>>()?,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    fn distinct_series_paths(
        &self,
        series_table: &str,
        points_table: &str,
    ) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT s.path FROM {series_table} s
             JOIN {points_table} p ON s.id = p.series_id
             ORDER BY s.path"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn has_string_tables(&self) -> Result<bool, StoreError> {
        Ok(self.has_table("string_series")? && self.has_table("string_points")?)
    }

    fn has_table(&self, name: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn sql_int(n: u64) -> rusqlite::types::Value {
    rusqlite::types::Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Text of a loosely typed column. SQLite lets writers store any type in any
/// column, so numbers and blobs are rendered rather than rejected.
fn raw_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Render a unix timestamp in seconds as RFC 3339 with a `+00:00` offset.
pub fn timestamp_to_rfc3339(ts: f64) -> String {
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
