// SPDX-License-Identifier: Apache-2.0

//! Console facade
//!
//! The three calls a web console makes: list namespaces, list targets in a
//! namespace, run a statement. Each call forks an engine from the pool and
//! always destroys it before returning.

pub mod mysql;
pub mod options;
pub mod redis;

pub use mysql::MySqlConsole;
pub use options::{HandlerOptions, QueryOptions};
pub use redis::RedisConsole;

use tracing::{instrument, warn};

use crate::engine::error::EngineResult;
use crate::engine::pool::EnginePool;
use crate::engine::traits::Backend;
use crate::engine::types::{Action, BackendKind, ExecutionRequest, QueryResult};

pub struct Console<B: Backend> {
    pool: EnginePool<B>,
}

impl<B: Backend> Console<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            pool: EnginePool::new(backend),
        }
    }

    pub fn pool(&self) -> &EnginePool<B> {
        &self.pool
    }

    pub fn console_type(&self) -> BackendKind {
        self.pool.backend().kind()
    }

    /// Lists databases (relational) or `db0..dbN-1` (key-value).
    #[instrument(skip_all, fields(backend = %self.console_type(), host = %options.conn.host))]
    pub async fn fetch_namespaces(&self, options: &HandlerOptions) -> EngineResult<Vec<String>> {
        let mut engine = self.pool.fork(options.conn.clone(), "").await?;
        let namespaces = engine.schema().await;
        self.pool.destroy(engine).await;

        if let Err(ref e) = namespaces {
            warn!(error = %e, "listing namespaces failed");
        }
        namespaces
    }

    /// Lists tables (relational) or keys (key-value) in `namespace`.
    #[instrument(skip(self, options), fields(backend = %self.console_type()))]
    pub async fn fetch_targets(
        &self,
        namespace: &str,
        options: &HandlerOptions,
    ) -> EngineResult<Vec<String>> {
        let mut engine = self.pool.fork(options.conn.clone(), namespace).await?;
        let targets = engine.table().await;
        self.pool.destroy(engine).await;

        if let Err(ref e) = targets {
            warn!(error = %e, "listing targets failed");
        }
        targets
    }

    /// Runs `command` against `namespace`; an empty command inspects `target`.
    ///
    /// Failures are reported in the returned result, never as an `Err`.
    #[instrument(
        skip(self, command, options),
        fields(backend = %self.console_type(), command_len = command.len())
    )]
    pub async fn run_query(
        &self,
        namespace: &str,
        target: &str,
        command: &str,
        options: &HandlerOptions,
    ) -> QueryResult {
        let backend = self.pool.backend();
        let command = if command.trim().is_empty() {
            backend.fallback_command(target)
        } else {
            command.to_string()
        };

        let request = ExecutionRequest {
            namespace: namespace.to_string(),
            target: backend.resolve_target(target, &command),
            command,
            timeout: options.timeout(),
        };

        let policy = match options.policy_for(backend.kind()) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(error = %e, "invalid policy");
                return QueryResult::failed(backend.kind(), Action::SqlQuery, request.command, e);
            }
        };

        let mut engine = match self.pool.fork(options.conn.clone(), namespace).await {
            Ok(engine) => engine,
            Err(e) => {
                warn!(error = %e, "acquiring engine failed");
                return QueryResult::failed(
                    backend.kind(),
                    Action::SqlQuery,
                    request.command,
                    e,
                );
            }
        };

        let result = match engine.bind_hooks(options.hooks.clone()) {
            Ok(()) => engine.query(&request, &policy).await,
            Err(e) => QueryResult::failed(backend.kind(), Action::SqlQuery, request.command.clone(), e),
        };
        self.pool.destroy(engine).await;
        result
    }
}
