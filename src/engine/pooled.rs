// SPDX-License-Identifier: Apache-2.0

//! Pooled engine
//!
//! One reusable engine slot. While acquired it owns a live session together
//! with the connection settings, namespace and hooks of the current caller;
//! reset closes the session and drops all of that in one step, so nothing
//! bound by one caller survives into the next acquisition.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tracing::{debug, instrument, warn};

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::statement::PolicyConfig;
use crate::engine::timeout::{within, DEFAULT_QUERY_TIMEOUT};
use crate::engine::traits::Backend;
use crate::engine::types::{Action, ConnectionConfig, EngineId, ExecutionRequest, QueryResult};
use crate::interceptor::{post_execute, pre_execute, Hooks, PostHookContext, PreHookContext};
use crate::metrics;

/// Observable lifecycle state of a pooled engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Acquired,
}

struct Lease<S> {
    session: S,
    config: ConnectionConfig,
    namespace: String,
    hooks: Hooks,
}

enum Slot<S> {
    Idle,
    Acquired(Lease<S>),
}

fn lease_mut<S>(slot: &mut Slot<S>) -> EngineResult<&mut Lease<S>> {
    match slot {
        Slot::Acquired(lease) => Ok(lease),
        Slot::Idle => Err(EngineError::internal("engine is not acquired")),
    }
}

/// Outcome of policy screening for one query
enum Gate {
    /// Refused by the allow-list.
    Blocked(EngineError),
    /// Could not be screened (missing namespace, parse failure, unknown verb).
    PolicyError(EngineError),
    /// Admitted; carries the statement to run.
    Passed(String),
}

/// A reusable engine bound to one backend family
pub struct PooledEngine<B: Backend> {
    id: EngineId,
    backend: Arc<B>,
    slot: Slot<B::Session>,
}

impl<B: Backend> PooledEngine<B> {
    pub(crate) fn new(backend: Arc<B>) -> Self {
        Self {
            id: EngineId::new(),
            backend,
            slot: Slot::Idle,
        }
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    pub fn state(&self) -> EngineState {
        match self.slot {
            Slot::Idle => EngineState::Idle,
            Slot::Acquired(_) => EngineState::Acquired,
        }
    }

    pub fn config(&self) -> Option<&ConnectionConfig> {
        match &self.slot {
            Slot::Acquired(lease) => Some(&lease.config),
            Slot::Idle => None,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match &self.slot {
            Slot::Acquired(lease) => Some(&lease.namespace),
            Slot::Idle => None,
        }
    }

    pub fn has_hooks(&self) -> bool {
        match &self.slot {
            Slot::Acquired(lease) => !lease.hooks.is_empty(),
            Slot::Idle => false,
        }
    }

    /// Opens a session for `namespace`. The engine stays idle on failure.
    #[instrument(
        skip(self, config),
        fields(engine = %self.id, backend = %self.backend.kind(), host = %config.host, port = config.port)
    )]
    pub async fn acquire(&mut self, config: ConnectionConfig, namespace: &str) -> EngineResult<()> {
        if let Slot::Acquired(_) = self.slot {
            return Err(EngineError::internal("engine is already acquired"));
        }

        let session = self.backend.open(&config, namespace).await?;
        self.slot = Slot::Acquired(Lease {
            session,
            config,
            namespace: namespace.to_string(),
            hooks: Hooks::default(),
        });
        debug!("engine acquired");
        Ok(())
    }

    /// Replaces the hooks bound to the current lease.
    pub fn bind_hooks(&mut self, hooks: Hooks) -> EngineResult<()> {
        lease_mut(&mut self.slot)?.hooks = hooks;
        Ok(())
    }

    /// Closes the session, then drops settings and hooks together.
    #[instrument(skip(self), fields(engine = %self.id, backend = %self.backend.kind()))]
    pub async fn reset(&mut self) {
        let Slot::Acquired(lease) = std::mem::replace(&mut self.slot, Slot::Idle) else {
            return;
        };

        let Lease { session, .. } = lease;
        if let Err(e) = self.backend.close(session).await {
            warn!(error = %e, "closing session failed");
        }
        debug!("engine reset");
    }

    /// Lists namespaces visible to the session.
    #[instrument(
        skip(self),
        fields(engine = %self.id, backend = %self.backend.kind(), action = %Action::FetchSchema)
    )]
    pub async fn schema(&mut self) -> EngineResult<Vec<String>> {
        let lease = lease_mut(&mut self.slot)?;
        within(DEFAULT_QUERY_TIMEOUT, self.backend.namespaces(&mut lease.session)).await
    }

    /// Lists targets (tables or keys) in the acquired namespace.
    #[instrument(
        skip(self),
        fields(engine = %self.id, backend = %self.backend.kind(), action = %Action::FetchTable)
    )]
    pub async fn table(&mut self) -> EngineResult<Vec<String>> {
        let lease = lease_mut(&mut self.slot)?;
        if lease.namespace.is_empty() {
            return Err(EngineError::config("schema should be provided"));
        }
        within(DEFAULT_QUERY_TIMEOUT, self.backend.targets(&mut lease.session)).await
    }

    fn screen(&self, request: &ExecutionRequest, policy: &PolicyConfig) -> Gate {
        if request.namespace.is_empty() {
            return Gate::PolicyError(EngineError::config("schema should be provided"));
        }
        if policy.bypass {
            return Gate::Passed(request.command.clone());
        }
        match self.backend.screen(&request.command, policy.allow_list()) {
            Ok(screening) if screening.passed => Gate::Passed(screening.command),
            Ok(screening) => Gate::Blocked(EngineError::policy_violation(screening.command)),
            Err(e) => Gate::PolicyError(e),
        }
    }

    /// Screens, hooks and executes one statement.
    ///
    /// Never fails: every outcome, including refusals, lands in the returned
    /// result, and the post-hook sees it exactly once.
    #[instrument(
        skip_all,
        fields(
            engine = %self.id,
            backend = %self.backend.kind(),
            action = %Action::SqlQuery,
            namespace = %request.namespace,
            target = %request.target,
            command_len = request.command.len()
        )
    )]
    pub async fn query(&mut self, request: &ExecutionRequest, policy: &PolicyConfig) -> QueryResult {
        let kind = self.backend.kind();
        let mut result = QueryResult::new(kind, Action::SqlQuery, request.command.clone());
        let gate = self.screen(request, policy);

        let lease = match lease_mut(&mut self.slot) {
            Ok(lease) => lease,
            Err(e) => {
                result.error = Some(e);
                return result;
            }
        };

        match gate {
            Gate::Blocked(e) => {
                debug!("blocked by policy");
                metrics::record_blocked();
                result.error = Some(e);
            }
            Gate::PolicyError(e) => {
                debug!(error = %e, "policy screening failed");
                metrics::record_invalid();
                result.error = Some(e);
            }
            Gate::Passed(command) => {
                result.command = command;
                let pre = PreHookContext {
                    backend: kind,
                    action: Action::SqlQuery,
                    schema: request.namespace.clone(),
                    command: result.command.clone(),
                };

                match pre_execute(&lease.hooks, &pre) {
                    Err(e) => {
                        metrics::record_rejected();
                        result.error = Some(e);
                    }
                    Ok(()) => {
                        result.executed = true;
                        result.started_at = Some(Local::now());
                        let started = Instant::now();

                        let outcome = within(
                            request.timeout,
                            self.backend.run(&mut lease.session, &pre.command),
                        )
                        .await;

                        result.duration_ms = started.elapsed().as_millis() as u64;
                        match outcome {
                            Ok(output) => result.apply(output),
                            Err(e) => result.error = Some(e),
                        }
                        metrics::record_query(result.duration_ms as f64, result.is_ok());
                    }
                }
            }
        }

        post_execute(
            &lease.hooks,
            &PostHookContext::from_result(&request.namespace, &result),
        );
        result
    }
}
