// SPDX-License-Identifier: Apache-2.0

//! Redis console

use std::sync::Arc;

use super::Console;
use crate::engine::backends::KeyValueBackend;
use crate::engine::drivers::RedisConnector;
use crate::engine::traits::KvConnector;

pub type RedisConsole = Console<KeyValueBackend>;

impl RedisConsole {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(RedisConnector::new()))
    }

    pub fn with_connector(connector: Arc<dyn KvConnector>) -> Self {
        Self::with_backend(KeyValueBackend::new(connector))
    }
}

impl Default for RedisConsole {
    fn default() -> Self {
        Self::new()
    }
}
