// SPDX-License-Identifier: Apache-2.0

// Query Engine Module
// Policy screening, pooled sessions and result shaping for console backends

pub mod backends;
pub mod drivers;
pub mod error;
pub mod normalize;
pub mod pool;
pub mod pooled;
pub mod redis_safety;
pub mod sql_safety;
pub mod statement;
pub mod timeout;
pub mod traits;
pub mod types;

pub use backends::{KeyValueBackend, RelationalBackend};
pub use error::{EngineError, EngineResult};
pub use pool::EnginePool;
pub use pooled::{EngineState, PooledEngine};
pub use statement::{PolicyConfig, StatementKind};
pub use traits::Backend;
pub use types::*;
