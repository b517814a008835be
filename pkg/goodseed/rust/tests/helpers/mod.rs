// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use rusqlite::{Connection, params};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

const SCHEMA: &str = "
CREATE TABLE run_meta (key TEXT PRIMARY KEY, value TEXT);
CREATE TABLE configs (path TEXT PRIMARY KEY, type_tag TEXT NOT NULL, value TEXT);
CREATE TABLE metric_series (id INTEGER PRIMARY KEY, path TEXT UNIQUE NOT NULL);
CREATE TABLE metric_points (series_id INTEGER NOT NULL, step INTEGER NOT NULL, y REAL, ts INTEGER NOT NULL);
CREATE TABLE string_series (id INTEGER PRIMARY KEY, path TEXT UNIQUE NOT NULL);
CREATE TABLE string_points (series_id INTEGER NOT NULL, step INTEGER NOT NULL, value TEXT, ts INTEGER NOT NULL);
";

/// A temporary projects directory.
pub struct Projects {
    dir: TempDir,
}

impl Projects {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn app(&self) -> Router {
        goodseed_server::build_app(self.root().to_path_buf())
    }

    /// Create `<root>/<project>/runs/<run>.sqlite` with the full schema.
    pub fn run(&self, project: &str, run: &str) -> RunWriter {
        let path = self.run_path(project, run);
        let conn = Connection::open(&path).expect("failed to create run store");
        conn.execute_batch(SCHEMA).expect("failed to create schema");
        RunWriter { conn }
    }

    /// Write a file with the store extension that is not a SQLite database.
    pub fn corrupt_run(&self, project: &str, run: &str) {
        std::fs::write(self.run_path(project, run), b"definitely not sqlite")
            .expect("failed to write corrupt store");
    }

    fn run_path(&self, project: &str, run: &str) -> PathBuf {
        let runs_dir = self.root().join(project).join("runs");
        std::fs::create_dir_all(&runs_dir).expect("failed to create runs dir");
        runs_dir.join(format!("{run}.sqlite"))
    }
}

/// Writer for one fixture run store.
pub struct RunWriter {
    conn: Connection,
}

impl RunWriter {
    pub fn meta(&self, key: &str, value: &str) -> &Self {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO run_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .expect("insert run_meta");
        self
    }

    pub fn config(&self, path: &str, tag: &str, raw: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO configs (path, type_tag, value) VALUES (?1, ?2, ?3)",
                params![path, tag, raw],
            )
            .expect("insert config");
        self
    }

    pub fn metric(&self, path: &str, step: i64, y: f64) -> &Self {
        let id = self.series_id("metric_series", path);
        self.conn
            .execute(
                "INSERT INTO metric_points (series_id, step, y, ts) VALUES (?1, ?2, ?3, ?4)",
                params![id, step, y, 1_700_000_000 + step],
            )
            .expect("insert metric point");
        self
    }

    pub fn string(&self, path: &str, step: i64, value: &str) -> &Self {
        let id = self.series_id("string_series", path);
        self.conn
            .execute(
                "INSERT INTO string_points (series_id, step, value, ts) VALUES (?1, ?2, ?3, ?4)",
                params![id, step, value, 1_700_000_000 + step],
            )
            .expect("insert string point");
        self
    }

    fn series_id(&self, table: &str, path: &str) -> i64 {
        self.conn
            .execute(
                &format!("INSERT OR IGNORE INTO {table} (path) VALUES (?1)"),
                [path],
            )
            .expect("insert series");
        self.conn
            .query_row(
                &format!("SELECT id FROM {table} WHERE path = ?1"),
                [path],
                |row| row.get(0),
            )
            .expect("select series id")
    }
}

/// Response status, headers and body parsed as JSON (`Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: Router, method: Method, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request");
    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not JSON")
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri).await
}
