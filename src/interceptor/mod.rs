// SPDX-License-Identifier: Apache-2.0

//! Query Interceptor
//!
//! Caller-supplied hooks around every pooled query:
//! - **Pre-execution**: sees the statement after policy screening and may veto it
//! - **Post-execution**: observes the outcome on every path, including vetoes
//!   and policy refusals

pub mod pipeline;
pub mod types;

pub use pipeline::{audit_hook, post_execute, pre_execute};
pub use types::*;
