// SPDX-License-Identifier: Apache-2.0

//! MySQL Driver
//!
//! Implements the relational connector traits for MySQL/MariaDB using SQLx.
//! Each session owns a single connection; statements go over the text
//! protocol so anything the server accepts can be sent verbatim.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor as _, Row as _};

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::normalize::{RawRowSet, RawValue};
use crate::engine::traits::{SqlConnector, SqlExecutor};
use crate::engine::types::ConnectionConfig;

/// Opens MySQL connections
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    fn connect_options(config: &ConnectionConfig, database: Option<&str>) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(config.password.expose())
            .charset("utf8mb4");

        match database {
            Some(db) => options.database(db),
            None => options,
        }
    }
}

#[async_trait]
impl SqlConnector for MySqlConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> EngineResult<Box<dyn SqlExecutor>> {
        let options = Self::connect_options(config, database);
        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| EngineError::connection_failed(e.to_string()))?;

        Ok(Box::new(MySqlExecutor { conn }))
    }
}

/// A single MySQL connection
pub struct MySqlExecutor {
    conn: MySqlConnection,
}

impl MySqlExecutor {
    /// Extracts a value from a MySqlRow at the given index
    fn extract_value(row: &MySqlRow, idx: usize) -> RawValue {
        // Try u64 first for BIGINT UNSIGNED columns
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return v.map(RawValue::UInt).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(RawValue::Int).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return v.map(|i| RawValue::Int(i as i64)).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<u32>, _>(idx) {
            return v.map(|u| RawValue::Int(u as i64)).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return v.map(|i| RawValue::Int(i as i64)).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<u16>, _>(idx) {
            return v.map(|u| RawValue::Int(u as i64)).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<i8>, _>(idx) {
            return v.map(|i| RawValue::Int(i as i64)).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<u8>, _>(idx) {
            return v.map(|u| RawValue::Int(u as i64)).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.map(RawValue::Float).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
            return v.map(|f| RawValue::Float(f as f64)).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(RawValue::Text).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
            return v.map(RawValue::DateTime).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
            return v
                .map(|dt| RawValue::DateTime(dt.naive_utc()))
                .unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
            return v.map(RawValue::Date).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
            return v.map(RawValue::Time).unwrap_or(RawValue::Null);
        }
        if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(idx) {
            return v.map(RawValue::Json).unwrap_or(RawValue::Null);
        }
        // BIT, BLOB, DECIMAL and anything else the server sends as bytes
        if let Ok(v) = row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
            return v.map(RawValue::Bytes).unwrap_or(RawValue::Null);
        }

        RawValue::Null
    }

    fn convert_rows(rows: &[MySqlRow]) -> RawRowSet {
        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = rows
            .iter()
            .map(|row| {
                (0..row.columns().len())
                    .map(|idx| Self::extract_value(row, idx))
                    .collect()
            })
            .collect();

        RawRowSet { columns, rows }
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn query(&mut self, sql: &str) -> EngineResult<RawRowSet> {
        let rows: Vec<MySqlRow> = (&mut self.conn)
            .fetch_all(sqlx::raw_sql(sql))
            .await
            .map_err(|e| EngineError::upstream(e.to_string()))?;

        Ok(Self::convert_rows(&rows))
    }

    async fn execute(&mut self, sql: &str) -> EngineResult<u64> {
        let result = (&mut self.conn)
            .execute(sqlx::raw_sql(sql))
            .await
            .map_err(|e| EngineError::upstream(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn close(self: Box<Self>) -> EngineResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| EngineError::upstream(e.to_string()))
    }
}
