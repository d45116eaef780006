// SPDX-License-Identifier: Apache-2.0

//! Universal data types for the query engine
//!
//! Shared by both backends: connection settings, the value model rows are
//! normalized into, and the result envelope every query returns.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::error::EngineError;
use crate::observability::Sensitive;

/// Identifier of a pooled engine, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineId(pub Uuid);

impl EngineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Connection settings supplied when an engine is acquired
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default = "empty_password")]
    pub password: Sensitive<String>,
}

fn empty_password() -> Sensitive<String> {
    Sensitive::new(String::new())
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: Sensitive::new(password.into()),
        }
    }
}

/// Which family of backend an engine talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "MySQLEngine")]
    Relational,
    #[serde(rename = "RedisEngine")]
    KeyValue,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relational => "MySQLEngine",
            Self::KeyValue => "RedisEngine",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation an engine performs for the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    FetchSchema,
    FetchTable,
    SqlQuery,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchSchema => "fetchSchema",
            Self::FetchTable => "fetchTable",
            Self::SqlQuery => "sqlQuery",
        };
        f.write_str(name)
    }
}

/// Universal value representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// A single result row, keyed by (de-duplicated) column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// One console request after defaults have been applied
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub namespace: String,
    pub target: String,
    pub command: String,
    pub timeout: Duration,
}

/// What a backend produced for one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub total: u64,
    pub affected_rows: u64,
}

impl QueryOutput {
    pub fn affected(rows: u64) -> Self {
        Self {
            affected_rows: rows,
            ..Self::default()
        }
    }
}

/// Result envelope returned for every query, successful or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub backend: BackendKind,
    pub action: Action,
    /// True once the backend call was attempted.
    pub executed: bool,
    pub started_at: Option<DateTime<Local>>,
    pub duration_ms: u64,
    pub error: Option<EngineError>,
    /// Statement as sent to the backend (after any rewrite).
    pub command: String,
    pub total: u64,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub affected_rows: u64,
}

impl QueryResult {
    pub fn new(backend: BackendKind, action: Action, command: impl Into<String>) -> Self {
        Self {
            backend,
            action,
            executed: false,
            started_at: None,
            duration_ms: 0,
            error: None,
            command: command.into(),
            total: 0,
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows: 0,
        }
    }

    pub fn failed(
        backend: BackendKind,
        action: Action,
        command: impl Into<String>,
        error: EngineError,
    ) -> Self {
        let mut result = Self::new(backend, action, command);
        result.error = Some(error);
        result
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn apply(&mut self, output: QueryOutput) {
        self.columns = output.columns;
        self.rows = output.rows;
        self.total = output.total;
        self.affected_rows = output.affected_rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_redacted_in_debug_and_json() {
        let config = ConnectionConfig::new("127.0.0.1", 3306, "root", "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert_eq!(config.password.expose(), "hunter2");
    }

    #[test]
    fn config_deserializes_without_credentials() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"host":"localhost","port":6379}"#).unwrap();
        assert_eq!(config.username, "");
        assert_eq!(config.password.expose(), "");
    }

    #[test]
    fn kinds_and_actions_use_wire_names() {
        assert_eq!(
            serde_json::to_string(&BackendKind::KeyValue).unwrap(),
            "\"RedisEngine\""
        );
        assert_eq!(serde_json::to_string(&Action::SqlQuery).unwrap(), "\"sqlQuery\"");
        assert_eq!(Action::FetchTable.to_string(), "fetchTable");
    }

    #[test]
    fn row_serializes_as_plain_object() {
        let row = Row::new()
            .with_column("id", Value::Int(1))
            .with_column("name", Value::from("alice"));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "alice");
    }
}
