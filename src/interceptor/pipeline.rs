// SPDX-License-Identifier: Apache-2.0

//! Interceptor Pipeline
//!
//! Invokes the hooks bound to an engine:
//! 1. Pre-execution: may veto the query
//! 2. Post-execution: observes the outcome, exactly once per query

use tracing::{debug, info, warn};

use super::types::{Hooks, PostHook, PostHookContext, PreHookContext};
use crate::engine::error::EngineResult;

/// Runs the pre-execution hook, if any.
pub fn pre_execute(hooks: &Hooks, context: &PreHookContext) -> EngineResult<()> {
    let Some(hook) = hooks.pre.as_ref() else {
        return Ok(());
    };

    let outcome = hook(context);
    if let Err(ref e) = outcome {
        debug!(
            backend = %context.backend,
            action = %context.action,
            error = %e,
            "pre-execution hook vetoed query"
        );
    }
    outcome
}

/// Runs the post-execution hook, if any.
pub fn post_execute(hooks: &Hooks, context: &PostHookContext) {
    if let Some(hook) = hooks.post.as_ref() {
        hook(context);
    }
}

/// Post-hook that writes one structured `audit` event per query.
pub fn audit_hook() -> PostHook {
    std::sync::Arc::new(|ctx: &PostHookContext| match &ctx.error {
        None => info!(
            target: "audit",
            backend = %ctx.backend,
            action = %ctx.action,
            schema = %ctx.schema,
            executed = ctx.executed,
            duration_ms = ctx.duration_ms,
            affected_rows = ctx.affected_rows,
            command_len = ctx.command.len(),
            "query completed"
        ),
        Some(e) => warn!(
            target: "audit",
            backend = %ctx.backend,
            action = %ctx.action,
            schema = %ctx.schema,
            executed = ctx.executed,
            duration_ms = ctx.duration_ms,
            error = %e,
            "query failed"
        ),
    })
}
