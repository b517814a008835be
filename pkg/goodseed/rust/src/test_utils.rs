// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Fixture run stores for unit tests.
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};

const CORE_SCHEMA: &str = "
CREATE TABLE run_meta (key TEXT PRIMARY KEY, value TEXT);
CREATE TABLE configs (path TEXT PRIMARY KEY, type_tag TEXT NOT NULL, value TEXT);
CREATE TABLE metric_series (id INTEGER PRIMARY KEY, path TEXT UNIQUE NOT NULL);
CREATE TABLE metric_points (series_id INTEGER NOT NULL, step INTEGER NOT NULL, y REAL, ts INTEGER NOT NULL);
";

const STRING_SCHEMA: &str = "
CREATE TABLE string_series (id INTEGER PRIMARY KEY, path TEXT UNIQUE NOT NULL);
CREATE TABLE string_points (series_id INTEGER NOT NULL, step INTEGER NOT NULL, value TEXT, ts INTEGER NOT NULL);
";

/// A writable run store laid out as `<root>/<project>/runs/<run>.sqlite`.
pub struct RunFixture {
    path: PathBuf,
    conn: Connection,
}

impl RunFixture {
    pub fn create(root: &Path, project: &str, run: &str) -> Self {
        let fixture = Self::create_without_string_tables(root, project, run);
        fixture.conn.execute_batch(STRING_SCHEMA).unwrap();
        fixture
    }

    pub fn create_without_string_tables(root: &Path, project: &str, run: &str) -> Self {
        let runs_dir = root.join(project).join("runs");
        std::fs::create_dir_all(&runs_dir).unwrap();
        let path = runs_dir.join(format!("{run}.sqlite"));
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(CORE_SCHEMA).unwrap();
        Self { path, conn }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hold an exclusive write lock until the fixture is dropped.
    pub fn begin_exclusive(&self) {
        self.conn.execute_batch("BEGIN EXCLUSIVE").unwrap();
    }

    pub fn meta(&self, key: &str, value: &str) {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO run_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .unwrap();
    }

    pub fn config(&self, path: &str, tag: &str, raw: Option<&str>) {
        self.conn
            .execute(
                "INSERT INTO configs (path, type_tag, value) VALUES (?1, ?2, ?3)",
                params![path, tag, raw],
            )
            .unwrap();
    }

    pub fn metric_series(&self, path: &str) -> i64 {
        series_id(&self.conn, "metric_series", path)
    }

    pub fn metric_point(&self, path: &str, step: i64, y: f64, ts: i64) {
        let id = self.metric_series(path);
        self.conn
            .execute(
                "INSERT INTO metric_points (series_id, step, y, ts) VALUES (?1, ?2, ?3, ?4)",
                params![id, step, y, ts],
            )
            .unwrap();
    }

    pub fn string_series(&self, path: &str) -> i64 {
        series_id(&self.conn, "string_series", path)
    }

    pub fn string_point(&self, path: &str, step: i64, value: &str, ts: i64) {
        let id = self.string_series(path);
        self.conn
            .execute(
                "INSERT INTO string_points (series_id, step, value, ts) VALUES (?1, ?2, ?3, ?4)",
                params![id, step, value, ts],
            )
            .unwrap();
    }
}

fn series_id(conn: &Connection, table: &str, path: &str) -> i64 {
    conn.execute(
        &format!("INSERT OR IGNORE INTO {table} (path) VALUES (?1)"),
        [path],
    )
    .unwrap();
    conn.query_row(
        &format!("SELECT id FROM {table} WHERE path = ?1"),
        [path],
        |row| row.get(0),
    )
    .unwrap()
}
