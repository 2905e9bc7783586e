//! The core string-fragment builder.
//!
//! The catalogue query language is rendered as a single string: there is no
//! driver-level bind parameter the way a SQL statement has `$1, $2, ...`.
//! `QlFragment` is therefore a plain accumulating string buffer rather than
//! the fragment-plus-positional-params pair a parameterized SQL builder
//! needs; literal values are escaped and inlined as they're pushed.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QlFragment {
    text: String,
}

impl QlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(s: impl Into<String>) -> Self {
        Self { text: s.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn push(&mut self, s: &str) -> &mut Self {
        self.text.push_str(s);
        self
    }

    pub fn push_fragment(&mut self, other: QlFragment) -> &mut Self {
        self.text.push_str(&other.text);
        self
    }

    /// Wrap this fragment's text in parentheses.
    pub fn parens(mut self) -> Self {
        self.text = format!("({})", self.text);
        self
    }

    /// Join a set of fragments with a separator, producing a single fragment.
    pub fn join(sep: &str, parts: impl IntoIterator<Item = QlFragment>) -> Self {
        let joined = parts
            .into_iter()
            .map(|f| f.text)
            .collect::<Vec<_>>()
            .join(sep);
        Self { text: joined }
    }
}

impl From<&str> for QlFragment {
    fn from(s: &str) -> Self {
        Self::raw(s)
    }
}

impl From<String> for QlFragment {
    fn from(s: String) -> Self {
        Self::raw(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_and_push() {
        let mut f = QlFragment::raw("SELECT o");
        f.push(" FROM Dataset o");
        assert_eq!(f.as_str(), "SELECT o FROM Dataset o");
    }

    #[test]
    fn test_parens() {
        let f = QlFragment::raw("a = 1").parens();
        assert_eq!(f.as_str(), "(a = 1)");
    }

    #[test]
    fn test_join() {
        let parts = vec![QlFragment::raw("a = 1"), QlFragment::raw("b = 2")];
        let joined = QlFragment::join(" AND ", parts);
        assert_eq!(joined.as_str(), "a = 1 AND b = 2");
    }

    #[test]
    fn test_join_empty() {
        let joined = QlFragment::join(" AND ", Vec::<QlFragment>::new());
        assert_eq!(joined.as_str(), "");
    }
}
