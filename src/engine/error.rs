// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the query engine
//!
//! Driver errors, policy decisions and hook vetoes are all mapped to these
//! variants so a caller only ever inspects one error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all engine operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineError {
    /// A mandatory input (namespace, statement, option) is missing or invalid.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Failed to parse key from command")]
    KeyParseError,

    #[error("Unknown command")]
    UnknownCommand,

    #[error("Command not supported: {verb}")]
    UnsupportedCommand { verb: String },

    #[error("Statement forbidden by policy: {command}")]
    PolicyViolation { command: String },

    #[error("Rejected by pre-execution hook: {message}")]
    PreHookRejected { message: String },

    #[error("Key does not exist")]
    KeyNotExist,

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Upstream error: {message}")]
    UpstreamError { message: String },

    #[error("Field is empty")]
    FieldEmpty,

    #[error("Namespace list fetch failed: {message}")]
    SchemaFetchFailed { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError { message: msg.into() }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError { message: msg.into() }
    }

    pub fn unsupported(verb: impl Into<String>) -> Self {
        Self::UnsupportedCommand { verb: verb.into() }
    }

    pub fn policy_violation(command: impl Into<String>) -> Self {
        Self::PolicyViolation { command: command.into() }
    }

    /// Error a pre-execution hook returns to veto a query.
    pub fn hook_rejected(msg: impl Into<String>) -> Self {
        Self::PreHookRejected { message: msg.into() }
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamError { message: msg.into() }
    }

    pub fn schema_fetch_failed(msg: impl Into<String>) -> Self {
        Self::SchemaFetchFailed { message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    /// Policy outcomes that stop a query before the backend is called.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Self::PolicyViolation { .. }
                | Self::UnsupportedCommand { .. }
                | Self::UnknownCommand
                | Self::ParseError { .. }
        )
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = EngineError::policy_violation("drop table t");
        assert_eq!(err.to_string(), "Statement forbidden by policy: drop table t");

        let err = EngineError::Timeout { timeout_ms: 15000 };
        assert_eq!(err.to_string(), "Operation timed out after 15000ms");
    }

    #[test]
    fn serializes_with_variant_tag() {
        let json = serde_json::to_string(&EngineError::KeyNotExist).unwrap();
        assert_eq!(json, "\"KeyNotExist\"");

        let json = serde_json::to_value(EngineError::config("schema should be provided")).unwrap();
        assert_eq!(json["ConfigError"]["message"], "schema should be provided");
    }
}
