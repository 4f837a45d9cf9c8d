//! Backend dialects.
//!
//! Everything dialect-specific funnels through two functions: identifier
//! quoting and timestamp formatting. The core emits ANSI-ish SQL otherwise.

use chrono::{DateTime, Utc};

/// The relational backends Lattice can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    Mysql,
    SqlServer,
}

impl Dialect {
    /// Quotes an identifier (table or column name) for this backend.
    ///
    /// This is the only place identifiers are quoted; dynamic table names
    /// must pass through here before being spliced into SQL.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Self::Sqlite | Self::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::Mysql => format!("`{}`", ident.replace('`', "``")),
            Self::SqlServer => format!("[{}]", ident.replace(']', "]]")),
        }
    }

    /// Formats a timestamp as the TEXT form this backend stores.
    pub fn format_timestamp(&self, dt: &DateTime<Utc>) -> String {
        match self {
            Self::Sqlite => dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            Self::Postgres | Self::Mysql | Self::SqlServer => {
                dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_per_backend() {
        assert_eq!(Dialect::Sqlite.quote_ident("idx_1a"), "\"idx_1a\"");
        assert_eq!(Dialect::Postgres.quote_ident("idx_1a"), "\"idx_1a\"");
        assert_eq!(Dialect::Mysql.quote_ident("idx_1a"), "`idx_1a`");
        assert_eq!(Dialect::SqlServer.quote_ident("idx_1a"), "[idx_1a]");
    }

    #[test]
    fn quoting_escapes_delimiters() {
        assert_eq!(Dialect::Sqlite.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::Mysql.quote_ident("a`b"), "`a``b`");
        assert_eq!(Dialect::SqlServer.quote_ident("a]b"), "[a]]b]");
    }

    #[test]
    fn timestamp_round_trips_through_parse() {
        let now = Utc::now();
        for dialect in [
            Dialect::Sqlite,
            Dialect::Postgres,
            Dialect::Mysql,
            Dialect::SqlServer,
        ] {
            let formatted = dialect.format_timestamp(&now);
            assert!(
                crate::value::parse_datetime(&formatted).is_some(),
                "{dialect:?} produced unparseable {formatted}"
            );
        }
    }
}
