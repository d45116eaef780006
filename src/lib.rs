// SPDX-License-Identifier: Apache-2.0

// webconsole - query interception and pooled execution for database consoles
// Core library

pub mod console;
pub mod engine;
pub mod interceptor;
pub mod metrics;
pub mod observability;

pub use console::{Console, HandlerOptions, MySqlConsole, RedisConsole};
pub use engine::{
    Action, BackendKind, ConnectionConfig, EngineError, EngineResult, PolicyConfig, QueryResult,
    StatementKind, Value,
};
pub use interceptor::{Hooks, PostHookContext, PreHookContext};
