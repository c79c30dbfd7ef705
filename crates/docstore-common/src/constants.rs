//! Constants shared across DocStore.

// =============================================================================
// Identifier Limits
// =============================================================================

/// Maximum identifier length in bytes.
///
/// PostgreSQL truncates identifiers longer than `NAMEDATALEN - 1` (63)
/// bytes, which would make two distinct field names collide.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Prefix reserved for internal columns.
pub const RESERVED_PREFIX: &str = "__";

/// Placeholder column for engines that cannot create a table without columns.
///
/// Never reported in a `ColumnMap` and never returned in result rows.
pub const PLACEHOLDER_COLUMN: &str = "__docstore_slot";

/// SQL keywords rejected as table or field names.
///
/// Compared case-insensitively. Type names such as `integer` or `text` are
/// deliberately absent: they are only non-reserved keywords and are common
/// field names.
pub const RESERVED_WORDS: &[&str] = &[
    "all", "alter", "and", "any", "as", "asc", "between", "both", "by", "case", "cast", "check",
    "collate", "column", "constraint", "create", "cross", "current_date", "current_time",
    "current_timestamp", "current_user", "default", "delete", "desc", "distinct", "do", "drop",
    "else", "end", "except", "false", "fetch", "for", "foreign", "from", "grant", "group",
    "having", "in", "inner", "insert", "intersect", "into", "is", "join", "leading", "left",
    "like", "limit", "natural", "not", "null", "offset", "on", "only", "or", "order", "outer",
    "primary", "references", "returning", "right", "select", "session_user", "set", "some",
    "table", "then", "to", "trailing", "true", "truncate", "union", "unique", "update", "user",
    "using", "values", "when", "where", "window", "with",
];

// =============================================================================
// Connection Defaults
// =============================================================================

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default application name reported to the engine.
pub const DEFAULT_APPLICATION_NAME: &str = "docstore";

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Path value that selects an in-memory SQLite database.
pub const SQLITE_MEMORY_PATH: &str = ":memory:";
