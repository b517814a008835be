// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! JSON encoding of API responses.
//!
//! JSON has no literal for NaN or the infinities, and `serde_json` silently
//! writes them as `null`. Every float that can reach a response goes through
//! this module instead and is written as:
//!
//! | Float | JSON |
//! |-------|------|
//! | NaN | `"NaN"` |
//! | +Infinity | `"Infinity"` |
//! | -Infinity | `"-Infinity"` |
//!
//! Everything else is written exactly as `serde_json` would.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::store::value::Value;
use crate::types::{ConfigEntry, MetricPoint, ProjectInfo, RunInfo, StringPage, StringPoint};

/// Sentinel string for a non-finite float, `None` for finite ones.
pub fn non_finite_sentinel(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some("NaN")
    } else if f == f64::INFINITY {
        Some("Infinity")
    } else if f == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

/// `serialize_with` helper for `f64` fields.
pub fn serialize_float<S>(f: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match non_finite_sentinel(*f) {
        Some(sentinel) => serializer.serialize_str(sentinel),
        None => serializer.serialize_f64(*f),
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serialize_float(f, serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Object(map) => serializer.collect_map(map),
        }
    }
}

/// Config entries written as a JSON object, keeping table order.
pub struct ConfigMap(pub Vec<ConfigEntry>);

impl Serialize for ConfigMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.path, &entry.value)?;
        }
        map.end()
    }
}

// --- Response envelopes ---

#[derive(Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectInfo>,
}

#[derive(Serialize)]
pub struct RunsResponse {
    pub runs: Vec<RunInfo>,
}

#[derive(Serialize)]
pub struct ConfigsResponse {
    pub configs: ConfigMap,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub metrics: Vec<MetricPoint>,
}

#[derive(Serialize)]
pub struct MetricPathsResponse {
    pub paths: Vec<String>,
}

#[derive(Serialize)]
pub struct StringSeriesResponse {
    pub string_series: Vec<StringPoint>,
    pub total: u64,
}

impl From<StringPage> for StringSeriesResponse {
    fn from(page: StringPage) -> Self {
        Self {
            string_series: page.points,
            total: page.total,
        }
    }
}
