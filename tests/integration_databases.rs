// SPDX-License-Identifier: Apache-2.0

//! Live-server tests. Skipped unless `WEBCONSOLE_TEST_LIVE` is set; point the
//! `WEBCONSOLE_TEST_*` variables at disposable MySQL and Redis instances.

use std::sync::Arc;

use webconsole::console::{HandlerOptions, MySqlConsole, RedisConsole};
use webconsole::engine::error::{EngineError, EngineResult};
use webconsole::engine::statement::StatementKind;
use webconsole::engine::types::{ConnectionConfig, Value};
use webconsole::interceptor::PostHookContext;

const DEFAULT_DB: &str = "testdb";

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16_or_default(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

fn live_tests_enabled() -> bool {
    std::env::var("WEBCONSOLE_TEST_LIVE")
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

fn mysql_options() -> HandlerOptions {
    HandlerOptions::new(ConnectionConfig::new(
        env_or_default("WEBCONSOLE_TEST_MYSQL_HOST", "127.0.0.1"),
        env_u16_or_default("WEBCONSOLE_TEST_MYSQL_PORT", 3306),
        env_or_default("WEBCONSOLE_TEST_MYSQL_USER", "webconsole"),
        env_or_default("WEBCONSOLE_TEST_MYSQL_PASSWORD", "webconsole_test"),
    ))
}

fn mysql_db() -> String {
    env_or_default("WEBCONSOLE_TEST_MYSQL_DB", DEFAULT_DB)
}

fn redis_options() -> HandlerOptions {
    HandlerOptions::new(ConnectionConfig::new(
        env_or_default("WEBCONSOLE_TEST_REDIS_HOST", "127.0.0.1"),
        env_u16_or_default("WEBCONSOLE_TEST_REDIS_PORT", 6379),
        env_or_default("WEBCONSOLE_TEST_REDIS_USER", ""),
        env_or_default("WEBCONSOLE_TEST_REDIS_PASSWORD", ""),
    ))
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

async fn run_ok(
    console: &MySqlConsole,
    db: &str,
    sql: &str,
    options: &HandlerOptions,
) -> EngineResult<webconsole::QueryResult> {
    let result = console.run_query(db, "", sql, options).await;
    match result.error.clone() {
        Some(e) => Err(e),
        None => Ok(result),
    }
}

#[tokio::test]
async fn mysql_e2e() -> EngineResult<()> {
    if !live_tests_enabled() {
        return Ok(());
    }

    let console = MySqlConsole::new();
    let db = mysql_db();
    let table = unique_name("console");
    let writer = mysql_options().with_allow_list(vec![
        StatementKind::Ddl,
        StatementKind::Insert,
        StatementKind::Select,
    ]);

    let namespaces = console.fetch_namespaces(&mysql_options()).await?;
    assert!(namespaces.contains(&db), "{} missing from {:?}", db, namespaces);

    run_ok(
        &console,
        &db,
        &format!("CREATE TABLE {} (id INT PRIMARY KEY, name VARCHAR(32), flag BIT(1))", table),
        &writer,
    )
    .await?;

    let inserted = run_ok(
        &console,
        &db,
        &format!("INSERT INTO {} VALUES (1, 'ada', b'1'), (2, 'grace', b'0')", table),
        &writer,
    )
    .await?;
    assert_eq!(inserted.affected_rows, 2);

    let tables = console.fetch_targets(&db, &mysql_options()).await?;
    assert!(tables.contains(&table));

    let described = console.run_query(&db, &table, "", &mysql_options()).await;
    assert!(described.is_ok(), "{:?}", described.error);
    assert_eq!(described.total, 3);

    let selected = run_ok(
        &console,
        &db,
        &format!("SELECT id, name, flag, id FROM {} ORDER BY id", table),
        &mysql_options(),
    )
    .await?;
    assert!(selected.command.ends_with("LIMIT 100"));
    assert_eq!(selected.columns, vec!["id", "name", "flag", "id(1)"]);
    assert_eq!(selected.rows[0].get("flag"), Some(&Value::from("true")));
    assert_eq!(selected.rows[1].get("name"), Some(&Value::from("grace")));

    let blocked = console
        .run_query(&db, &table, &format!("DELETE FROM {}", table), &mysql_options())
        .await;
    assert!(matches!(blocked.error, Some(EngineError::PolicyViolation { .. })));

    run_ok(&console, &db, &format!("DROP TABLE {}", table), &writer).await?;
    Ok(())
}

#[tokio::test]
async fn mysql_post_hook_audits_every_query() -> EngineResult<()> {
    if !live_tests_enabled() {
        return Ok(());
    }

    let seen = Arc::new(parking_lot::Mutex::new(Vec::<PostHookContext>::new()));
    let sink = Arc::clone(&seen);
    let options = mysql_options()
        .with_timeout_secs(1)
        .with_post_hook(move |ctx| sink.lock().push(ctx.clone()));
    let console = MySqlConsole::new();
    let db = mysql_db();

    console.run_query(&db, "", "SELECT 1", &options).await;
    let slow = console.run_query(&db, "", "SELECT SLEEP(3)", &options).await;
    assert_eq!(slow.error, Some(EngineError::Timeout { timeout_ms: 1000 }));

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|ctx| ctx.executed));
    Ok(())
}

#[tokio::test]
async fn redis_e2e() -> EngineResult<()> {
    if !live_tests_enabled() {
        return Ok(());
    }

    let console = RedisConsole::new();
    let key = unique_name("console");
    let writer = redis_options().with_allow_list(vec![
        StatementKind::SetValue,
        StatementKind::Get,
        StatementKind::Del,
    ]);

    let databases = console.fetch_namespaces(&redis_options()).await?;
    assert!(databases.iter().any(|db| db == "db0"));

    let set = console
        .run_query("db0", "", &format!("SET {} \"hello world\"", key), &writer)
        .await;
    assert!(set.is_ok(), "{:?}", set.error);

    let keys = console.fetch_targets("db0", &redis_options()).await?;
    assert!(keys.contains(&key));

    let typed = console.run_query("db0", &key, "", &redis_options()).await;
    assert_eq!(typed.rows[0].get("command_result"), Some(&Value::from("string")));

    let got = console
        .run_query("db0", "", &format!("GET {}", key), &redis_options())
        .await;
    assert_eq!(got.rows[0].get("command_result"), Some(&Value::from("hello world")));
    assert_eq!(got.rows[0].get("redis_key_type"), Some(&Value::from("string")));

    let blocked = console
        .run_query("db0", "", &format!("DEL {}", key), &redis_options())
        .await;
    assert!(matches!(blocked.error, Some(EngineError::PolicyViolation { .. })));

    let deleted = console
        .run_query("db0", "", &format!("DEL {}", key), &writer)
        .await;
    assert!(deleted.is_ok());

    let missing = console
        .run_query("db0", "", &format!("GET {}", key), &redis_options())
        .await;
    assert_eq!(missing.error, Some(EngineError::KeyNotExist));
    Ok(())
}
