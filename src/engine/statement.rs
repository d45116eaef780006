// SPDX-License-Identifier: Apache-2.0

//! Closed classification of console statements.
//!
//! Relational kinds come from the SQL AST; key-value kinds are one per
//! supported command verb, split into a read and a write family.

use std::fmt;

use crate::engine::types::BackendKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    // Relational
    Select,
    Insert,
    Replace,
    Update,
    Delete,
    Ddl,
    Begin,
    Commit,
    Rollback,
    Set,
    Show,
    Use,
    Explain,
    Savepoint,
    Release,
    LockTables,
    UnlockTables,
    Flush,
    CallProc,
    Priv,
    Comment,
    Other,
    Unknown,

    // Key-value: keys
    Type,
    Exists,
    Ttl,
    Scan,
    Del,
    Expire,
    ExpireAt,
    // strings
    Get,
    MGet,
    StrLen,
    Append,
    Incr,
    IncrBy,
    SetValue,
    MSet,
    SetEx,
    SetNx,
    // hashes
    HGetAll,
    HExists,
    HGet,
    HMGet,
    HKeys,
    HVals,
    HDel,
    HSet,
    HMSet,
    // lists
    LLen,
    LRange,
    LIndex,
    LPop,
    RPop,
    LPush,
    RPush,
    LInsert,
    // sets
    SCard,
    SMembers,
    SIsMember,
    SDiff,
    SUnion,
    SAdd,
    SRem,
    // sorted sets
    ZCard,
    ZRange,
    ZRank,
    ZCount,
    ZScore,
    ZRangeByScore,
    ZAdd,
    ZRem,
}

/// Relational kinds allowed when no allow-list is configured.
pub const DEFAULT_SQL_ALLOW_LIST: &[StatementKind] =
    &[StatementKind::Select, StatementKind::Show, StatementKind::Explain];

/// Key-value kinds that only read data.
pub const KV_READ_FAMILY: &[StatementKind] = &[
    StatementKind::Type,
    StatementKind::Exists,
    StatementKind::Ttl,
    StatementKind::Scan,
    StatementKind::Get,
    StatementKind::MGet,
    StatementKind::StrLen,
    StatementKind::HGetAll,
    StatementKind::HExists,
    StatementKind::HGet,
    StatementKind::HMGet,
    StatementKind::HKeys,
    StatementKind::HVals,
    StatementKind::LLen,
    StatementKind::LRange,
    StatementKind::LIndex,
    StatementKind::SCard,
    StatementKind::SMembers,
    StatementKind::SIsMember,
    StatementKind::SDiff,
    StatementKind::SUnion,
    StatementKind::ZCard,
    StatementKind::ZRange,
    StatementKind::ZRank,
    StatementKind::ZCount,
    StatementKind::ZScore,
    StatementKind::ZRangeByScore,
];

/// Key-value kinds that modify data.
pub const KV_WRITE_FAMILY: &[StatementKind] = &[
    StatementKind::Del,
    StatementKind::Expire,
    StatementKind::ExpireAt,
    StatementKind::Append,
    StatementKind::Incr,
    StatementKind::IncrBy,
    StatementKind::SetValue,
    StatementKind::MSet,
    StatementKind::SetEx,
    StatementKind::SetNx,
    StatementKind::HDel,
    StatementKind::HSet,
    StatementKind::HMSet,
    StatementKind::LPop,
    StatementKind::RPop,
    StatementKind::LPush,
    StatementKind::RPush,
    StatementKind::LInsert,
    StatementKind::SAdd,
    StatementKind::SRem,
    StatementKind::ZAdd,
    StatementKind::ZRem,
];

/// Key-value kinds allowed when no allow-list is configured.
pub const DEFAULT_KV_ALLOW_LIST: &[StatementKind] = KV_READ_FAMILY;

impl StatementKind {
    /// Kinds executed for their side effect; only an affected-row count comes back.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Insert | Self::Replace | Self::Update | Self::Delete | Self::Ddl
        )
    }

    pub fn is_key_value(&self) -> bool {
        KV_READ_FAMILY.contains(self) || KV_WRITE_FAMILY.contains(self)
    }

    pub fn is_key_value_read(&self) -> bool {
        KV_READ_FAMILY.contains(self)
    }

    /// Maps a key-value command verb (any case) to its kind.
    pub fn from_verb(verb: &str) -> Option<Self> {
        lookup(KV_VERBS, verb)
    }

    /// Maps a relational allow-list name (any case) to its kind.
    pub fn from_sql_name(name: &str) -> Option<Self> {
        lookup(SQL_NAMES, name)
    }

    /// Resolves an allow-list entry within one backend family.
    ///
    /// `"set"` is the `SET` statement for a relational console and the
    /// `SET` command for a key-value one.
    pub fn from_name(family: BackendKind, name: &str) -> Option<Self> {
        match family {
            BackendKind::Relational => Self::from_sql_name(name),
            BackendKind::KeyValue => Self::from_verb(name),
        }
    }

    /// Allow-list name of this kind.
    pub fn name(&self) -> &'static str {
        SQL_NAMES
            .iter()
            .chain(KV_VERBS)
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn lookup(table: &[(&'static str, StatementKind)], name: &str) -> Option<StatementKind> {
    let name = name.to_ascii_lowercase();
    table
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, kind)| *kind)
}

const SQL_NAMES: &[(&str, StatementKind)] = &[
    ("select", StatementKind::Select),
    ("insert", StatementKind::Insert),
    ("replace", StatementKind::Replace),
    ("update", StatementKind::Update),
    ("delete", StatementKind::Delete),
    ("ddl", StatementKind::Ddl),
    ("begin", StatementKind::Begin),
    ("commit", StatementKind::Commit),
    ("rollback", StatementKind::Rollback),
    ("set", StatementKind::Set),
    ("show", StatementKind::Show),
    ("use", StatementKind::Use),
    ("explain", StatementKind::Explain),
    ("savepoint", StatementKind::Savepoint),
    ("release", StatementKind::Release),
    ("locktables", StatementKind::LockTables),
    ("unlocktables", StatementKind::UnlockTables),
    ("flush", StatementKind::Flush),
    ("callproc", StatementKind::CallProc),
    ("priv", StatementKind::Priv),
    ("comment", StatementKind::Comment),
    ("other", StatementKind::Other),
    ("unknown", StatementKind::Unknown),
];

const KV_VERBS: &[(&str, StatementKind)] = &[
    ("type", StatementKind::Type),
    ("exists", StatementKind::Exists),
    ("ttl", StatementKind::Ttl),
    ("scan", StatementKind::Scan),
    ("del", StatementKind::Del),
    ("expire", StatementKind::Expire),
    ("expireat", StatementKind::ExpireAt),
    ("get", StatementKind::Get),
    ("mget", StatementKind::MGet),
    ("strlen", StatementKind::StrLen),
    ("append", StatementKind::Append),
    ("incr", StatementKind::Incr),
    ("incrby", StatementKind::IncrBy),
    ("set", StatementKind::SetValue),
    ("mset", StatementKind::MSet),
    ("setex", StatementKind::SetEx),
    ("setnx", StatementKind::SetNx),
    ("hgetall", StatementKind::HGetAll),
    ("hexists", StatementKind::HExists),
    ("hget", StatementKind::HGet),
    ("hmget", StatementKind::HMGet),
    ("hkeys", StatementKind::HKeys),
    ("hvals", StatementKind::HVals),
    ("hdel", StatementKind::HDel),
    ("hset", StatementKind::HSet),
    ("hmset", StatementKind::HMSet),
    ("llen", StatementKind::LLen),
    ("lrange", StatementKind::LRange),
    ("lindex", StatementKind::LIndex),
    ("lpop", StatementKind::LPop),
    ("rpop", StatementKind::RPop),
    ("lpush", StatementKind::LPush),
    ("rpush", StatementKind::RPush),
    ("linsert", StatementKind::LInsert),
    ("scard", StatementKind::SCard),
    ("smembers", StatementKind::SMembers),
    ("sismember", StatementKind::SIsMember),
    ("sdiff", StatementKind::SDiff),
    ("sunion", StatementKind::SUnion),
    ("sadd", StatementKind::SAdd),
    ("srem", StatementKind::SRem),
    ("zcard", StatementKind::ZCard),
    ("zrange", StatementKind::ZRange),
    ("zrank", StatementKind::ZRank),
    ("zcount", StatementKind::ZCount),
    ("zscore", StatementKind::ZScore),
    ("zrangebyscore", StatementKind::ZRangeByScore),
    ("zadd", StatementKind::ZAdd),
    ("zrem", StatementKind::ZRem),
];

/// Administrator policy applied to console queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    /// `None` or empty selects the backend's default allow-list.
    pub allow_list: Option<Vec<StatementKind>>,
    /// Skips screening entirely; statements run unchanged.
    pub bypass: bool,
}

impl PolicyConfig {
    pub fn allow_list(&self) -> Option<&[StatementKind]> {
        self.allow_list.as_deref()
    }
}

/// Resolves the effective allow-list: an absent or empty list means the default.
pub fn effective_allow_list<'a>(
    configured: Option<&'a [StatementKind]>,
    default: &'a [StatementKind],
) -> &'a [StatementKind] {
    match configured {
        Some(list) if !list.is_empty() => list,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_are_disjoint() {
        for kind in KV_READ_FAMILY {
            assert!(!KV_WRITE_FAMILY.contains(kind), "{kind:?} in both families");
        }
        assert_eq!(KV_READ_FAMILY.len() + KV_WRITE_FAMILY.len(), 49);
    }

    #[test]
    fn every_key_value_kind_has_a_verb() {
        let verbs = [
            "type", "exists", "ttl", "scan", "del", "expire", "expireat", "get", "mget",
            "strlen", "append", "incr", "incrby", "set", "mset", "setex", "setnx", "hgetall",
            "hexists", "hget", "hmget", "hkeys", "hvals", "hdel", "hset", "hmset", "llen",
            "lrange", "lindex", "lpop", "rpop", "lpush", "rpush", "linsert", "scard",
            "smembers", "sismember", "sdiff", "sunion", "sadd", "srem", "zcard", "zrange",
            "zrank", "zcount", "zscore", "zrangebyscore", "zadd", "zrem",
        ];
        for verb in verbs {
            let kind = StatementKind::from_verb(verb).expect(verb);
            assert!(kind.is_key_value());
        }
    }

    #[test]
    fn hexists_is_its_own_kind() {
        assert_eq!(StatementKind::from_verb("HEXISTS"), Some(StatementKind::HExists));
        assert_eq!(StatementKind::from_verb("exists"), Some(StatementKind::Exists));
    }

    #[test]
    fn unknown_verbs_have_no_kind() {
        assert_eq!(StatementKind::from_verb("keys"), None);
        assert_eq!(StatementKind::from_verb("flushall"), None);
    }

    #[test]
    fn empty_allow_list_falls_back_to_default() {
        let empty: Vec<StatementKind> = Vec::new();
        assert_eq!(
            effective_allow_list(Some(&empty), DEFAULT_SQL_ALLOW_LIST),
            DEFAULT_SQL_ALLOW_LIST
        );
        assert_eq!(effective_allow_list(None, DEFAULT_KV_ALLOW_LIST), KV_READ_FAMILY);

        let custom = vec![StatementKind::Insert];
        assert_eq!(
            effective_allow_list(Some(&custom), DEFAULT_SQL_ALLOW_LIST),
            &[StatementKind::Insert]
        );
    }

    #[test]
    fn names_resolve_within_their_family() {
        assert_eq!(
            StatementKind::from_name(BackendKind::KeyValue, "set"),
            Some(StatementKind::SetValue)
        );
        assert_eq!(
            StatementKind::from_name(BackendKind::Relational, "SET"),
            Some(StatementKind::Set)
        );
        assert_eq!(StatementKind::from_name(BackendKind::Relational, "get"), None);
        assert_eq!(StatementKind::from_name(BackendKind::KeyValue, "select"), None);
        assert_eq!(StatementKind::from_name(BackendKind::KeyValue, "setvalue"), None);
    }

    #[test]
    fn names_round_trip() {
        for (name, kind) in SQL_NAMES {
            assert_eq!(kind.name(), *name);
            assert_eq!(StatementKind::from_sql_name(name), Some(*kind));
        }
        for (verb, kind) in KV_VERBS {
            assert_eq!(kind.name(), *verb);
        }
        assert_eq!(StatementKind::SetValue.to_string(), "set");
        assert_eq!(StatementKind::LockTables.to_string(), "locktables");
    }
}
