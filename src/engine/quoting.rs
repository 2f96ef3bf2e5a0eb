//! Identifier quoting for synthesized DDL.
//!
//! This differs from a simple "always wrap in quotes" renderer: §8 of the
//! spec requires that a bare, all-lowercase identifier with no special
//! characters round-trip unquoted, while anything else (mixed case,
//! digits-leading, punctuation, reserved words) gets double-quoted with
//! embedded quotes doubled, matching `quote_ident()`'s own escaping rule.

/// A conservative subset of the PostgreSQL reserved-word list: words that
/// are reserved in every SQL standard class PostgreSQL recognizes, i.e.
/// always need quoting even when they're lowercase and otherwise
/// identifier-shaped. Keeping this small and explicit is safer than trying
/// to keep a generated list in sync with the server.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both", "case",
    "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false", "fetch",
    "for", "foreign", "from", "grant", "group", "having", "in", "initially", "intersect", "into",
    "lateral", "leading", "limit", "localtime", "localtimestamp", "not", "null", "offset", "on",
    "only", "or", "order", "placing", "primary", "references", "returning", "select", "session_user",
    "some", "symmetric", "table", "then", "to", "trailing", "true", "union", "unique", "user",
    "using", "variadic", "when", "where", "window", "with",
];

fn is_bare_safe(ident: &str) -> bool {
    if ident.is_empty() {
        return false;
    }
    let mut chars = ident.chars();
    let first = chars.next().unwrap();
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return false;
    }
    !RESERVED_WORDS.contains(&ident)
}

/// Quote `ident` only if it needs it; otherwise return it unchanged.
pub fn quote_ident(ident: &str) -> String {
    if is_bare_safe(ident) {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// `<schema>.<name>`, each component independently quoted.
pub fn quote_qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

pub fn escape_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
