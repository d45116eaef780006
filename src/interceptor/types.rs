// SPDX-License-Identifier: Apache-2.0

//! Interceptor Types
//!
//! Contexts handed to query hooks and the hook function types themselves.
//! Hooks only ever see these snapshots, never the connection.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{Action, BackendKind, QueryResult};

/// What a pre-execution hook sees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreHookContext {
    pub backend: BackendKind,
    pub action: Action,
    pub schema: String,
    /// Statement about to run, after policy rewriting.
    pub command: String,
}

/// What a post-execution hook sees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHookContext {
    pub backend: BackendKind,
    pub action: Action,
    pub schema: String,
    pub command: String,
    pub executed: bool,
    pub started_at: Option<DateTime<Local>>,
    pub duration_ms: u64,
    pub error: Option<EngineError>,
    pub affected_rows: u64,
}

impl PostHookContext {
    pub fn from_result(schema: &str, result: &QueryResult) -> Self {
        Self {
            backend: result.backend,
            action: result.action,
            schema: schema.to_string(),
            command: result.command.clone(),
            executed: result.executed,
            started_at: result.started_at,
            duration_ms: result.duration_ms,
            error: result.error.clone(),
            affected_rows: result.affected_rows,
        }
    }
}

/// Runs before the backend call; an error vetoes the query.
pub type PreHook = Arc<dyn Fn(&PreHookContext) -> EngineResult<()> + Send + Sync>;

/// Runs once per query whatever the outcome.
pub type PostHook = Arc<dyn Fn(&PostHookContext) + Send + Sync>;

/// Hooks bound to an acquired engine
#[derive(Clone, Default)]
pub struct Hooks {
    pub pre: Option<PreHook>,
    pub post: Option<PostHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pre<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PreHookContext) -> EngineResult<()> + Send + Sync + 'static,
    {
        self.pre = Some(Arc::new(hook));
        self
    }

    pub fn with_post<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PostHookContext) + Send + Sync + 'static,
    {
        self.post = Some(Arc::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_none() && self.post.is_none()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre", &self.pre.is_some())
            .field("post", &self.post.is_some())
            .finish()
    }
}
