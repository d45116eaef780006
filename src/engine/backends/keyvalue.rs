// SPDX-License-Identifier: Apache-2.0

//! Key-value (Redis) backend
//!
//! Namespaces are logical databases named `db0..dbN-1`; targets are keys.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::normalize::{command_row, KV_RESULT_COLUMNS};
use crate::engine::redis_safety;
use crate::engine::sql_safety::Screening;
use crate::engine::statement::StatementKind;
use crate::engine::timeout::{within, CONNECT_TIMEOUT, PING_TIMEOUT};
use crate::engine::traits::{Backend, KvClient, KvConnector};
use crate::engine::types::{BackendKind, ConnectionConfig, QueryOutput};

const SCAN_BATCH: usize = 100;

pub struct KeyValueBackend {
    connector: Arc<dyn KvConnector>,
}

impl KeyValueBackend {
    pub fn new(connector: Arc<dyn KvConnector>) -> Self {
        Self { connector }
    }
}

/// Parses `dbN` (or a bare `N`) into a database index; empty means 0.
pub fn parse_db_index(namespace: &str) -> EngineResult<u32> {
    if namespace.is_empty() {
        return Ok(0);
    }
    namespace
        .strip_prefix("db")
        .unwrap_or(namespace)
        .parse()
        .map_err(|_| EngineError::config(format!("invalid redis database: {}", namespace)))
}

#[async_trait]
impl Backend for KeyValueBackend {
    type Session = Box<dyn KvClient>;

    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    fn screen(
        &self,
        command: &str,
        allow_list: Option<&[StatementKind]>,
    ) -> EngineResult<Screening> {
        let passed = redis_safety::screen(command, allow_list)?;
        Ok(Screening {
            command: command.to_string(),
            passed,
        })
    }

    fn fallback_command(&self, target: &str) -> String {
        format!("type {}", target)
    }

    /// The key named in the command wins over the console's selection.
    fn resolve_target(&self, target: &str, command: &str) -> String {
        redis_safety::extract_key(command).unwrap_or_else(|_| target.to_string())
    }

    async fn open(&self, config: &ConnectionConfig, namespace: &str) -> EngineResult<Self::Session> {
        let db_index = parse_db_index(namespace)?;
        let mut client = within(CONNECT_TIMEOUT, self.connector.connect(config, db_index)).await?;

        let pinged = within(PING_TIMEOUT, client.ping()).await;
        if let Err(e) = pinged {
            if let Err(close_err) = client.close().await {
                debug!(error = %close_err, "closing unreachable client failed");
            }
            return Err(e);
        }

        Ok(client)
    }

    async fn close(&self, session: Self::Session) -> EngineResult<()> {
        session.close().await
    }

    async fn namespaces(&self, session: &mut Self::Session) -> EngineResult<Vec<String>> {
        let entries = session.config_get("databases").await?;
        if entries.len() != 2 {
            return Err(EngineError::schema_fetch_failed(format!(
                "CONFIG GET databases returned {} entries",
                entries.len()
            )));
        }

        let count: u32 = entries[1].parse().map_err(|_| {
            EngineError::schema_fetch_failed(format!("invalid database count: {}", entries[1]))
        })?;

        Ok((0..count).map(|i| format!("db{}", i)).collect())
    }

    async fn targets(&self, session: &mut Self::Session) -> EngineResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (next, batch) = session.scan(cursor, "*", SCAN_BATCH).await?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }

    async fn run(&self, session: &mut Self::Session, command: &str) -> EngineResult<QueryOutput> {
        let argv = redis_safety::tokenize(command)?;
        if argv.is_empty() {
            return Err(EngineError::UnknownCommand);
        }

        let key_type = match argv.get(1) {
            Some(key) => match session.type_of(key).await {
                Ok(t) => t,
                Err(e) => {
                    debug!(error = %e, "TYPE lookup failed");
                    String::new()
                }
            },
            None => String::new(),
        };

        let value = session.dispatch(&argv).await?;
        if value.is_null() {
            return Err(EngineError::KeyNotExist);
        }

        Ok(QueryOutput {
            columns: KV_RESULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![command_row(&argv[0], &key_type, value)],
            total: 1,
            affected_rows: 1,
        })
    }
}
