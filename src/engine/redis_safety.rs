// SPDX-License-Identifier: Apache-2.0

//! Redis command tokenizing and allow-list screening.
//!
//! Commands are split with POSIX shell word rules, so `set k "a b"` carries
//! three arguments. The verb is looked up in a fixed table; verbs outside the
//! table are refused even when no allow-list is configured.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::statement::{effective_allow_list, StatementKind, DEFAULT_KV_ALLOW_LIST};

/// Splits a command line into words.
///
/// Single quotes are literal. Inside double quotes a backslash only escapes
/// `\`, `"`, `$`, `` ` `` and newline. Outside quotes it escapes any character.
/// A word starting with `#` opens a comment that runs to the end of the line.
pub fn tokenize(input: &str) -> EngineResult<Vec<String>> {
    shlex::split(input)
        .ok_or_else(|| EngineError::parse("unbalanced quotes or dangling escape in command"))
}

fn verb_kind(words: &[String]) -> EngineResult<StatementKind> {
    let Some(verb) = words.first() else {
        return Err(EngineError::UnknownCommand);
    };
    StatementKind::from_verb(verb).ok_or_else(|| EngineError::unsupported(verb.to_ascii_lowercase()))
}

/// Classifies a command by its verb.
pub fn classify(command: &str) -> EngineResult<StatementKind> {
    let words = tokenize(command)?;
    verb_kind(&words)
}

/// Screens a command against `allow_list` (default: the read family).
pub fn screen(command: &str, allow_list: Option<&[StatementKind]>) -> EngineResult<bool> {
    if command.trim().is_empty() {
        return Err(EngineError::config("redis command should be provided"));
    }

    let kind = classify(command)?;
    let allowed = effective_allow_list(allow_list, DEFAULT_KV_ALLOW_LIST);
    let passed = allowed.contains(&kind);
    if !passed {
        tracing::debug!(?kind, "command kind not in allow-list");
    }
    Ok(passed)
}

/// Returns the key a command addresses: its second word, verbatim.
pub fn extract_key(command: &str) -> EngineResult<String> {
    let mut words = tokenize(command)?;
    if words.len() < 2 {
        return Err(EngineError::KeyParseError);
    }
    Ok(words.swap_remove(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<String> {
        tokenize(input).unwrap()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(words("get   mykey"), vec!["get", "mykey"]);
        assert_eq!(words("\thget h\n f "), vec!["hget", "h", "f"]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn honors_quotes_and_escapes() {
        assert_eq!(words(r#"set k "a b""#), vec!["set", "k", "a b"]);
        assert_eq!(words("set k 'it''s'"), vec!["set", "k", "its"]);
        assert_eq!(words(r#"set k 'a\b'"#), vec!["set", "k", r"a\b"]);
        assert_eq!(words(r#"set k "say \"hi\"""#), vec!["set", "k", r#"say "hi""#]);
        assert_eq!(words(r#"set k "a\nb""#), vec!["set", "k", r"a\nb"]);
        assert_eq!(words(r"set k a\ b"), vec!["set", "k", "a b"]);
        assert_eq!(words(r#"set k """#), vec!["set", "k", ""]);
        assert_eq!(words(r#"get pre"fix"post"#), vec!["get", "prefixpost"]);
    }

    #[test]
    fn comments_and_line_continuations() {
        assert_eq!(words("get k # trailing note"), vec!["get", "k"]);
        assert_eq!(words("get a#b"), vec!["get", "a#b"]);
        assert_eq!(words("get \\\nk"), vec!["get", "k"]);
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        assert!(matches!(tokenize("get 'k"), Err(EngineError::ParseError { .. })));
        assert!(matches!(tokenize("get \"k"), Err(EngineError::ParseError { .. })));
        assert!(matches!(tokenize("get k\\"), Err(EngineError::ParseError { .. })));
    }

    #[test]
    fn default_allow_list_admits_reads_only() {
        for cmd in ["ttl k", "type k", "get k", "hget h f", "HGETALL h", "hexists h f"] {
            assert!(screen(cmd, None).unwrap(), "{cmd} should pass");
        }
        for cmd in ["hset h f v", "set k v", "del k", "expireat k 100"] {
            assert!(!screen(cmd, None).unwrap(), "{cmd} should be blocked");
        }
    }

    #[test]
    fn unknown_verbs_are_unsupported() {
        assert!(matches!(
            screen("keys *", None),
            Err(EngineError::UnsupportedCommand { .. })
        ));
        match screen("foobar x", None) {
            Err(EngineError::UnsupportedCommand { verb }) => assert_eq!(verb, "foobar"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn blank_and_empty_commands() {
        assert!(matches!(screen("", None), Err(EngineError::ConfigError { .. })));
        assert!(matches!(screen("  ", None), Err(EngineError::ConfigError { .. })));
        assert!(matches!(screen("''", None), Err(EngineError::UnsupportedCommand { .. })));
        assert!(matches!(classify("# just a note"), Err(EngineError::UnknownCommand)));
    }

    #[test]
    fn custom_allow_list_admits_writes() {
        let allow = [StatementKind::HSet, StatementKind::Get];
        assert!(screen("hset h f v", Some(&allow[..])).unwrap());
        assert!(!screen("hget h f", Some(&allow[..])).unwrap());
    }

    #[test]
    fn extracts_second_word_as_key() {
        assert_eq!(extract_key("get mykey").unwrap(), "mykey");
        assert_eq!(extract_key(r#"hget "my key" f"#).unwrap(), "my key");
        assert!(matches!(extract_key("ping"), Err(EngineError::KeyParseError)));
        assert!(matches!(extract_key(""), Err(EngineError::KeyParseError)));
    }
}
