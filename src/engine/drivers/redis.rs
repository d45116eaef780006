// SPDX-License-Identifier: Apache-2.0

//! Redis Driver
//!
//! Implements the key-value connector traits using the redis-rs crate over a
//! multiplexed async connection.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use redis::aio::MultiplexedConnection;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::{KvClient, KvConnector};
use crate::engine::types::{ConnectionConfig, Value};

/// Opens Redis connections
#[derive(Debug, Default, Clone, Copy)]
pub struct RedisConnector;

impl RedisConnector {
    pub fn new() -> Self {
        Self
    }

    /// Builds a Redis connection URL from config
    fn build_connection_string(config: &ConnectionConfig, db_index: u32) -> String {
        let password = config.password.expose();
        if !config.username.is_empty() || !password.is_empty() {
            let user = if config.username.is_empty() {
                String::new()
            } else {
                Self::encode_userinfo_component(&config.username)
            };
            let password = Self::encode_userinfo_component(password);
            format!(
                "redis://{}:{}@{}:{}/{}",
                user, password, config.host, config.port, db_index
            )
        } else {
            format!("redis://{}:{}/{}", config.host, config.port, db_index)
        }
    }

    fn encode_userinfo_component(value: &str) -> String {
        utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
    }
}

#[async_trait]
impl KvConnector for RedisConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
        db_index: u32,
    ) -> EngineResult<Box<dyn KvClient>> {
        let conn_str = Self::build_connection_string(config, db_index);
        let client = redis::Client::open(conn_str)
            .map_err(|e| EngineError::connection_failed(e.to_string()))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| EngineError::connection_failed(e.to_string()))?;

        Ok(Box::new(RedisClient { conn }))
    }
}

/// A multiplexed Redis connection bound to one logical database
pub struct RedisClient {
    conn: MultiplexedConnection,
}

#[async_trait]
impl KvClient for RedisClient {
    async fn dispatch(&mut self, argv: &[String]) -> EngineResult<Value> {
        let Some((name, args)) = argv.split_first() else {
            return Err(EngineError::UnknownCommand);
        };

        let mut cmd = redis::cmd(name);
        for arg in args {
            cmd.arg(arg);
        }

        let value: redis::Value = cmd
            .query_async(&mut self.conn)
            .await
            .map_err(|e| EngineError::upstream(e.to_string()))?;

        Ok(redis_value_to_value(&value))
    }

    async fn ping(&mut self) -> EngineResult<()> {
        redis::cmd("PING")
            .query_async::<String>(&mut self.conn)
            .await
            .map_err(|e| EngineError::connection_failed(format!("PING failed: {}", e)))?;
        Ok(())
    }

    async fn config_get(&mut self, key: &str) -> EngineResult<Vec<String>> {
        redis::cmd("CONFIG")
            .arg("GET")
            .arg(key)
            .query_async::<Vec<String>>(&mut self.conn)
            .await
            .map_err(|e| EngineError::upstream(e.to_string()))
    }

    async fn scan(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> EngineResult<(u64, Vec<String>)> {
        redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async::<(u64, Vec<String>)>(&mut self.conn)
            .await
            .map_err(|e| EngineError::upstream(e.to_string()))
    }

    async fn type_of(&mut self, key: &str) -> EngineResult<String> {
        redis::cmd("TYPE")
            .arg(key)
            .query_async::<String>(&mut self.conn)
            .await
            .map_err(|e| EngineError::upstream(e.to_string()))
    }

    async fn close(self: Box<Self>) -> EngineResult<()> {
        // The multiplexed connection shuts down once its last handle is dropped.
        drop(self.conn);
        Ok(())
    }
}

fn redis_value_to_string(value: &redis::Value) -> String {
    match value {
        redis::Value::BulkString(bytes) => String::from_utf8_lossy(bytes).to_string(),
        redis::Value::SimpleString(s) => s.clone(),
        redis::Value::Int(i) => i.to_string(),
        redis::Value::Double(f) => f.to_string(),
        redis::Value::Boolean(b) => b.to_string(),
        redis::Value::Nil => "(nil)".to_string(),
        redis::Value::Okay => "OK".to_string(),
        other => format!("{:?}", other),
    }
}

/// Converts a redis::Value to an engine Value
pub fn redis_value_to_value(value: &redis::Value) -> Value {
    match value {
        redis::Value::Nil => Value::Null,
        redis::Value::Int(i) => Value::Int(*i),
        redis::Value::Double(f) => Value::Float(*f),
        redis::Value::Boolean(b) => Value::Bool(*b),
        redis::Value::BulkString(bytes) => match String::from_utf8(bytes.clone()) {
            Ok(s) => Value::Text(s),
            Err(_) => Value::Bytes(bytes.clone()),
        },
        redis::Value::SimpleString(s) | redis::Value::VerbatimString { text: s, .. } => {
            Value::Text(s.clone())
        }
        redis::Value::Okay => Value::Text("OK".to_string()),
        redis::Value::Array(items) | redis::Value::Set(items) => {
            Value::Array(items.iter().map(redis_value_to_value).collect())
        }
        redis::Value::Map(pairs) => {
            let map = pairs
                .iter()
                .map(|(k, v)| {
                    let val = serde_json::to_value(redis_value_to_value(v))
                        .unwrap_or(serde_json::Value::Null);
                    (redis_value_to_string(k), val)
                })
                .collect();
            Value::Json(serde_json::Value::Object(map))
        }
        redis::Value::Attribute { data, .. } => redis_value_to_value(data),
        redis::Value::BigNumber(big) => Value::Text(big.to_string()),
        redis::Value::ServerError(err) => {
            Value::Text(format!("ERROR: {}", err.details().unwrap_or("unknown")))
        }
        redis::Value::Push { data, .. } => {
            Value::Array(data.iter().map(redis_value_to_value).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_string_encodes_credentials() {
        let config = ConnectionConfig::new("10.0.0.1", 6379, "", "p@ss/word");
        assert_eq!(
            RedisConnector::build_connection_string(&config, 2),
            "redis://:p%40ss%2Fword@10.0.0.1:6379/2"
        );

        let config = ConnectionConfig::new("localhost", 6380, "", "");
        assert_eq!(
            RedisConnector::build_connection_string(&config, 0),
            "redis://localhost:6380/0"
        );
    }

    #[test]
    fn converts_replies() {
        assert_eq!(redis_value_to_value(&redis::Value::Nil), Value::Null);
        assert_eq!(redis_value_to_value(&redis::Value::Okay), Value::from("OK"));
        assert_eq!(
            redis_value_to_value(&redis::Value::BulkString(b"hello".to_vec())),
            Value::from("hello")
        );
        assert_eq!(
            redis_value_to_value(&redis::Value::BulkString(vec![0xff, 0xfe])),
            Value::Bytes(vec![0xff, 0xfe])
        );
        assert_eq!(
            redis_value_to_value(&redis::Value::Array(vec![
                redis::Value::Int(1),
                redis::Value::Nil
            ])),
            Value::Array(vec![Value::Int(1), Value::Null])
        );
    }

    #[test]
    fn converts_maps_to_json() {
        let value = redis::Value::Map(vec![(
            redis::Value::SimpleString("field".into()),
            redis::Value::BulkString(b"v".to_vec()),
        )]);
        assert_eq!(
            redis_value_to_value(&value),
            Value::Json(serde_json::json!({"field": "v"}))
        );
    }
}
