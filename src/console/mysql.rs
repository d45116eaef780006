// SPDX-License-Identifier: Apache-2.0

//! MySQL console

use std::sync::Arc;

use super::Console;
use crate::engine::backends::RelationalBackend;
use crate::engine::drivers::MySqlConnector;
use crate::engine::traits::SqlConnector;

pub type MySqlConsole = Console<RelationalBackend>;

impl MySqlConsole {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(MySqlConnector::new()))
    }

    /// Builds a console over any relational connector.
    pub fn with_connector(connector: Arc<dyn SqlConnector>) -> Self {
        Self::with_backend(RelationalBackend::new(connector))
    }
}

impl Default for MySqlConsole {
    fn default() -> Self {
        Self::new()
    }
}
