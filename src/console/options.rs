// SPDX-License-Identifier: Apache-2.0

//! Per-request console options
//!
//! Connection settings, query deadline and policy, loadable from JSON. Hooks
//! are code, not config, and are attached with the builder methods.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::statement::{PolicyConfig, StatementKind};
use crate::engine::timeout::query_timeout;
use crate::engine::types::{BackendKind, ConnectionConfig};
use crate::interceptor::{Hooks, PostHookContext, PreHookContext};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryOptions {
    /// Seconds; zero or negative selects the default deadline.
    #[serde(default)]
    pub timeout_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerOptions {
    pub conn: ConnectionConfig,
    #[serde(default)]
    pub query: QueryOptions,
    /// Statement kind names, resolved per console: `"set"` is the SQL
    /// statement on MySQL and the command on Redis.
    #[serde(default)]
    pub allow_list: Option<Vec<String>>,
    #[serde(default)]
    pub bypass_policy: bool,
    #[serde(skip)]
    pub hooks: Hooks,
}

impl HandlerOptions {
    pub fn new(conn: ConnectionConfig) -> Self {
        Self {
            conn,
            query: QueryOptions::default(),
            allow_list: None,
            bypass_policy: false,
            hooks: Hooks::default(),
        }
    }

    pub fn with_timeout_secs(mut self, secs: i64) -> Self {
        self.query.timeout_secs = secs;
        self
    }

    pub fn with_allow_list(mut self, kinds: Vec<StatementKind>) -> Self {
        self.allow_list = Some(kinds.iter().map(|kind| kind.name().to_string()).collect());
        self
    }

    pub fn with_bypass_policy(mut self, bypass: bool) -> Self {
        self.bypass_policy = bypass;
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_pre_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PreHookContext) -> EngineResult<()> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_pre(hook);
        self
    }

    pub fn with_post_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PostHookContext) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_post(hook);
        self
    }

    pub fn timeout(&self) -> Duration {
        query_timeout(self.query.timeout_secs)
    }

    /// Policy for a console of `family`; entries naming another family's
    /// kinds are a `ConfigError`.
    pub fn policy_for(&self, family: BackendKind) -> EngineResult<PolicyConfig> {
        let allow_list = match &self.allow_list {
            Some(names) => Some(
                names
                    .iter()
                    .map(|name| {
                        StatementKind::from_name(family, name).ok_or_else(|| {
                            EngineError::config(format!(
                                "{} is not a statement kind for {}",
                                name, family
                            ))
                        })
                    })
                    .collect::<EngineResult<Vec<_>>>()?,
            ),
            None => None,
        };
        Ok(PolicyConfig {
            allow_list,
            bypass: self.bypass_policy,
        })
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::config(format!("invalid handler options: {}", e)))?;
        if let Some(unknown) = options.allow_list.iter().flatten().find(|name| {
            StatementKind::from_sql_name(name).is_none() && StatementKind::from_verb(name).is_none()
        }) {
            return Err(EngineError::config(format!("unknown statement kind: {}", unknown)));
        }
        Ok(options)
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }
}
