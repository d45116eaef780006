// SPDX-License-Identifier: Apache-2.0

//! SQL statement classification and allow-list screening.
//!
//! Statements are parsed with the MySQL dialect. Anything other than exactly
//! one statement is rejected, so `select 1; drop table t` never reaches the
//! allow-list check.

use sqlparser::ast::{Expr, LimitClause, Query, SetExpr, SetOperator, Statement, Value};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::statement::{effective_allow_list, StatementKind, DEFAULT_SQL_ALLOW_LIST};

/// Row cap appended to unbounded selects.
pub const DEFAULT_ROW_LIMIT: u64 = 100;

/// Outcome of screening a statement against an allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screening {
    /// Statement to send to the backend (possibly rewritten).
    pub command: String,
    pub passed: bool,
}

fn parse_single(sql: &str) -> EngineResult<Statement> {
    let mut statements = Parser::parse_sql(&MySqlDialect {}, sql)
        .map_err(|e| EngineError::parse(e.to_string()))?;

    match statements.len() {
        1 => Ok(statements.remove(0)),
        0 => Err(EngineError::parse("no statement found")),
        n => Err(EngineError::parse(format!(
            "expected a single statement, found {}",
            n
        ))),
    }
}

/// Classifies a single SQL statement.
pub fn classify(sql: &str) -> EngineResult<StatementKind> {
    let statement = parse_single(sql)?;
    Ok(refined_kind(&statement, sql))
}

/// AST kind, with statements the AST does not distinguish resolved by keyword.
///
/// Query bodies are never re-read by keyword: a leading `WITH` says nothing
/// about what the statement does.
fn refined_kind(statement: &Statement, sql: &str) -> StatementKind {
    match kind_of(statement) {
        StatementKind::Other if !matches!(statement, Statement::Query(_)) => preview(sql),
        kind => kind,
    }
}

/// Kind of a query body; a CTE wrapping DML takes the kind of the DML.
fn query_kind(query: &Query) -> StatementKind {
    set_expr_kind(query.body.as_ref())
}

fn set_expr_kind(expr: &SetExpr) -> StatementKind {
    match expr {
        SetExpr::Select(_) | SetExpr::Values(_) | SetExpr::Table(_) => StatementKind::Select,
        SetExpr::Query(inner) => query_kind(inner),
        SetExpr::SetOperation { left, right, .. } => {
            match (set_expr_kind(left), set_expr_kind(right)) {
                (StatementKind::Select, kind) | (kind, _) => kind,
            }
        }
        SetExpr::Insert(inner) | SetExpr::Update(inner) | SetExpr::Delete(inner) => {
            kind_of(inner)
        }
        _ => StatementKind::Other,
    }
}

fn kind_of(statement: &Statement) -> StatementKind {
    match statement {
        Statement::Query(query) => query_kind(query),
        Statement::Insert(insert) => {
            if insert.replace_into {
                StatementKind::Replace
            } else {
                StatementKind::Insert
            }
        }
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete { .. } => StatementKind::Delete,

        Statement::CreateTable { .. }
        | Statement::CreateView { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateSchema { .. }
        | Statement::AlterTable { .. }
        | Statement::AlterView { .. }
        | Statement::AlterIndex { .. }
        | Statement::Drop { .. }
        | Statement::Truncate { .. }
        | Statement::RenameTable { .. } => StatementKind::Ddl,

        Statement::StartTransaction { .. } => StatementKind::Begin,
        Statement::Commit { .. } => StatementKind::Commit,
        Statement::Rollback { savepoint, .. } => {
            if savepoint.is_some() {
                StatementKind::Savepoint
            } else {
                StatementKind::Rollback
            }
        }
        Statement::Savepoint { .. } => StatementKind::Savepoint,
        Statement::ReleaseSavepoint { .. } => StatementKind::Release,

        Statement::Set { .. } => StatementKind::Set,
        Statement::Use { .. } => StatementKind::Use,

        Statement::ShowVariable { .. }
        | Statement::ShowVariables { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowDatabases { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowCollation { .. }
        | Statement::ShowFunctions { .. } => StatementKind::Show,

        Statement::Explain { .. } | Statement::ExplainTable { .. } => StatementKind::Explain,

        Statement::Flush { .. } => StatementKind::Flush,
        Statement::Call { .. } => StatementKind::CallProc,
        Statement::Grant { .. } | Statement::Revoke { .. } => StatementKind::Priv,
        Statement::Comment { .. } => StatementKind::Comment,

        _ => StatementKind::Other,
    }
}

/// Kind guessed from the leading keyword, for statements the parser rejects.
pub fn preview(sql: &str) -> StatementKind {
    let Some(first) = sql.split_whitespace().next() else {
        return StatementKind::Unknown;
    };
    match first.trim_start_matches('(').to_ascii_lowercase().as_str() {
        "select" | "with" => StatementKind::Select,
        "insert" => StatementKind::Insert,
        "replace" => StatementKind::Replace,
        "update" => StatementKind::Update,
        "delete" => StatementKind::Delete,
        "create" | "alter" | "drop" | "truncate" | "rename" => StatementKind::Ddl,
        "show" => StatementKind::Show,
        "desc" | "describe" | "explain" => StatementKind::Explain,
        "use" => StatementKind::Use,
        "set" => StatementKind::Set,
        "lock" => StatementKind::LockTables,
        "unlock" => StatementKind::UnlockTables,
        "flush" => StatementKind::Flush,
        _ => StatementKind::Other,
    }
}

/// True for a plain select, a union of selects or a parenthesized select
/// with no LIMIT/FETCH at any level.
fn needs_row_limit(query: &Query) -> bool {
    if query.limit_clause.is_some() || query.fetch.is_some() {
        return false;
    }
    match query.body.as_ref() {
        SetExpr::Select(_)
        | SetExpr::SetOperation {
            op: SetOperator::Union,
            ..
        } => true,
        SetExpr::Query(inner) => needs_row_limit(inner),
        _ => false,
    }
}

fn apply_row_limit(query: &mut Query) {
    query.limit_clause = Some(LimitClause::LimitOffset {
        limit: Some(Expr::value(Value::Number(
            DEFAULT_ROW_LIMIT.to_string(),
            false,
        ))),
        offset: None,
        limit_by: vec![],
    });
}

/// Screens `sql` against `allow_list` (default `{select, show, explain}`).
///
/// A passed, unbounded select is rewritten with `LIMIT 100`; every other
/// statement is returned as given.
pub fn screen(sql: &str, allow_list: Option<&[StatementKind]>) -> EngineResult<Screening> {
    if sql.trim().is_empty() {
        return Err(EngineError::config("SQL statement should be provided"));
    }

    let mut statement = parse_single(sql)?;
    let kind = refined_kind(&statement, sql);
    let allowed = effective_allow_list(allow_list, DEFAULT_SQL_ALLOW_LIST);

    if !allowed.contains(&kind) {
        tracing::debug!(?kind, "statement kind not in allow-list");
        return Ok(Screening {
            command: sql.to_string(),
            passed: false,
        });
    }

    if let Statement::Query(query) = &mut statement {
        if needs_row_limit(query) {
            apply_row_limit(query);
            return Ok(Screening {
                command: statement.to_string(),
                passed: true,
            });
        }
    }

    Ok(Screening {
        command: sql.to_string(),
        passed: true,
    })
}
