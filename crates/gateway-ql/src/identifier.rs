//! Safe identifier and literal handling for the ICAT query language.
//!
//! Unlike SQL, the catalogue query language has no quoted-identifier escape
//! hatch: entity and attribute names are bare Java-style identifiers. Since
//! the rendered query is a single string (there is no driver-level bind
//! parameter), literal quoting here is load-bearing, not a discouraged
//! fallback the way `quote_literal` is in a parameterized SQL builder.

use crate::error::{QlError, Result};

/// Validate and return an identifier (entity name, attribute name, alias) as-is.
///
/// The catalogue query language does not support quoting, so an identifier
/// containing anything other than ASCII letters, digits, and underscores
/// cannot be rendered safely and is rejected instead.
pub fn render_ident(name: &str) -> Result<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(QlError::InvalidIdentifier(name.to_string()))
    }
}

/// Quote a string literal for embedding in a rendered query.
///
/// Wraps in single quotes and doubles any embedded single quote, matching
/// the catalogue query language's own escaping convention.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render a numeric literal (no quoting, but passed through a single place
/// so callers never hand-format numbers into query strings).
pub fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Check if a string is a valid bare identifier.
///
/// Catalogue identifiers must start with a letter or underscore and contain
/// only letters, digits, and underscores.
pub fn is_valid_identifier(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let mut chars = s.chars();
    let first = chars.next().unwrap();

    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ident() {
        assert_eq!(render_ident("Dataset").unwrap(), "Dataset");
        assert_eq!(render_ident("investigation").unwrap(), "investigation");
        assert!(render_ident("my table").is_err());
        assert!(render_ident("").is_err());
        assert!(render_ident("o1; DROP").is_err());
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("hello"), "'hello'");
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn test_render_number() {
        assert_eq!(render_number(5.0), "5");
        assert_eq!(render_number(5.5), "5.5");
        assert_eq!(render_number(-3.0), "-3");
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("users"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("user123"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("123users"));
        assert!(!is_valid_identifier("my-table"));
        assert!(!is_valid_identifier("my table"));
    }
}
