// SPDX-License-Identifier: Apache-2.0

// Database drivers module

pub mod mysql;
pub mod redis;

pub use self::mysql::MySqlConnector;
pub use self::redis::RedisConnector;
