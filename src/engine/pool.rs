// SPDX-License-Identifier: Apache-2.0

//! Engine pool
//!
//! Free list of idle [`PooledEngine`]s for one backend family. Forking takes
//! an idle engine (or builds one) and acquires it; destroying resets it and
//! puts it back. An engine is owned by exactly one caller between the two.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::error::EngineResult;
use crate::engine::pooled::PooledEngine;
use crate::engine::traits::Backend;
use crate::engine::types::ConnectionConfig;

pub struct EnginePool<B: Backend> {
    backend: Arc<B>,
    idle: Mutex<Vec<PooledEngine<B>>>,
    created: AtomicUsize,
}

impl<B: Backend> EnginePool<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            idle: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn take_idle(&self) -> PooledEngine<B> {
        let reused = self.idle.lock().pop();
        match reused {
            Some(engine) => engine,
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                PooledEngine::new(Arc::clone(&self.backend))
            }
        }
    }

    /// Hands out an engine acquired for `namespace`.
    ///
    /// If the session cannot be opened the engine goes straight back to the
    /// free list and the error is returned.
    pub async fn fork(
        &self,
        config: ConnectionConfig,
        namespace: &str,
    ) -> EngineResult<PooledEngine<B>> {
        let mut engine = self.take_idle();
        match engine.acquire(config, namespace).await {
            Ok(()) => {
                debug!(engine = %engine.id(), "engine forked");
                Ok(engine)
            }
            Err(e) => {
                self.idle.lock().push(engine);
                Err(e)
            }
        }
    }

    /// Resets `engine` and returns it to the free list.
    pub async fn destroy(&self, mut engine: PooledEngine<B>) {
        engine.reset().await;
        self.idle.lock().push(engine);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Engines built over the pool's lifetime.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}
