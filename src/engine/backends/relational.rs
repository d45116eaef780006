// SPDX-License-Identifier: Apache-2.0

//! Relational (MySQL) backend
//!
//! Mutating statements go through the execute path and only report an
//! affected-row count; everything else is fetched and normalized.

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::normalize::{normalize_rows, normalize_value, RawRowSet, RawValue};
use crate::engine::sql_safety::{self, Screening};
use crate::engine::statement::StatementKind;
use crate::engine::timeout::{within, CONNECT_TIMEOUT};
use crate::engine::traits::{Backend, SqlConnector, SqlExecutor};
use crate::engine::types::{BackendKind, ConnectionConfig, QueryOutput, Value};

pub struct RelationalBackend {
    connector: Arc<dyn SqlConnector>,
}

impl RelationalBackend {
    pub fn new(connector: Arc<dyn SqlConnector>) -> Self {
        Self { connector }
    }
}

/// First column of every row, rendered as text.
fn first_column(set: RawRowSet) -> EngineResult<Vec<String>> {
    if set.rows.is_empty() {
        return Ok(Vec::new());
    }
    if set.columns.is_empty() {
        return Err(EngineError::FieldEmpty);
    }
    Ok(set
        .rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .map(|value| match value {
            RawValue::Text(s) => s,
            RawValue::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
            other => match normalize_value(other) {
                Value::Text(s) => s,
                Value::Int(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => String::new(),
            },
        })
        .collect())
}

#[async_trait]
impl Backend for RelationalBackend {
    type Session = Box<dyn SqlExecutor>;

    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn screen(
        &self,
        command: &str,
        allow_list: Option<&[StatementKind]>,
    ) -> EngineResult<Screening> {
        sql_safety::screen(command, allow_list)
    }

    fn fallback_command(&self, target: &str) -> String {
        format!("desc {}", target)
    }

    async fn open(&self, config: &ConnectionConfig, namespace: &str) -> EngineResult<Self::Session> {
        let database = (!namespace.is_empty()).then_some(namespace);
        within(CONNECT_TIMEOUT, self.connector.connect(config, database)).await
    }

    async fn close(&self, session: Self::Session) -> EngineResult<()> {
        session.close().await
    }

    async fn namespaces(&self, session: &mut Self::Session) -> EngineResult<Vec<String>> {
        let set = session.query("SHOW DATABASES").await?;
        first_column(set)
    }

    async fn targets(&self, session: &mut Self::Session) -> EngineResult<Vec<String>> {
        let set = session.query("SHOW TABLES").await?;
        first_column(set)
    }

    async fn run(&self, session: &mut Self::Session, command: &str) -> EngineResult<QueryOutput> {
        let kind = sql_safety::classify(command).unwrap_or_else(|_| sql_safety::preview(command));

        if kind.is_mutation() {
            let affected = session.execute(command).await?;
            return Ok(QueryOutput::affected(affected));
        }

        let set = session.query(command).await?;
        let (columns, rows) = normalize_rows(set);
        Ok(QueryOutput {
            total: rows.len() as u64,
            columns,
            rows,
            affected_rows: 0,
        })
    }
}
