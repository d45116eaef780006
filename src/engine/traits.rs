// SPDX-License-Identifier: Apache-2.0

//! Trait seams of the engine
//!
//! The driver-level traits (`SqlConnector`/`SqlExecutor`,
//! `KvConnector`/`KvClient`) are the narrow surfaces the engine needs from a
//! database client. [`Backend`] sits one level up: it knows how a family of
//! databases is screened, opened, listed and queried, and is the type
//! parameter of the pooled engine.

use async_trait::async_trait;

use crate::engine::error::EngineResult;
use crate::engine::normalize::RawRowSet;
use crate::engine::sql_safety::Screening;
use crate::engine::statement::StatementKind;
use crate::engine::types::{BackendKind, ConnectionConfig, QueryOutput, Value};

/// A live relational connection
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Runs a row-returning statement.
    async fn query(&mut self, sql: &str) -> EngineResult<RawRowSet>;

    /// Runs a statement for its side effect and returns the affected row count.
    async fn execute(&mut self, sql: &str) -> EngineResult<u64>;

    async fn close(self: Box<Self>) -> EngineResult<()>;
}

/// Opens relational connections
#[async_trait]
pub trait SqlConnector: Send + Sync {
    /// Connects to `database`, or to no default database when it is `None`.
    async fn connect(
        &self,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> EngineResult<Box<dyn SqlExecutor>>;
}

/// A live key-value connection
#[async_trait]
pub trait KvClient: Send + Sync {
    /// Sends a raw command. A nil reply comes back as `Value::Null`.
    async fn dispatch(&mut self, argv: &[String]) -> EngineResult<Value>;

    async fn ping(&mut self) -> EngineResult<()>;

    /// `CONFIG GET <key>`, flattened to `[name, value, ...]`.
    async fn config_get(&mut self, key: &str) -> EngineResult<Vec<String>>;

    /// One `SCAN` step: returns the next cursor and a batch of keys.
    async fn scan(&mut self, cursor: u64, pattern: &str, count: usize)
        -> EngineResult<(u64, Vec<String>)>;

    async fn type_of(&mut self, key: &str) -> EngineResult<String>;

    async fn close(self: Box<Self>) -> EngineResult<()>;
}

/// Opens key-value connections
#[async_trait]
pub trait KvConnector: Send + Sync {
    async fn connect(
        &self,
        config: &ConnectionConfig,
        db_index: u32,
    ) -> EngineResult<Box<dyn KvClient>>;
}

/// A family of databases the pooled engine can drive
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    type Session: Send;

    fn kind(&self) -> BackendKind;

    /// Classifies `command` and decides whether `allow_list` admits it.
    fn screen(
        &self,
        command: &str,
        allow_list: Option<&[StatementKind]>,
    ) -> EngineResult<Screening>;

    /// Statement used when the console sends an empty command.
    fn fallback_command(&self, target: &str) -> String;

    /// Target the query is attributed to.
    fn resolve_target(&self, target: &str, _command: &str) -> String {
        target.to_string()
    }

    /// Opens a session bound to `namespace` (empty means the server default).
    async fn open(&self, config: &ConnectionConfig, namespace: &str) -> EngineResult<Self::Session>;

    async fn close(&self, session: Self::Session) -> EngineResult<()>;

    async fn namespaces(&self, session: &mut Self::Session) -> EngineResult<Vec<String>>;

    async fn targets(&self, session: &mut Self::Session) -> EngineResult<Vec<String>>;

    async fn run(&self, session: &mut Self::Session, command: &str) -> EngineResult<QueryOutput>;
}
