//! Typed builder for Drive `q` search expressions.
//!
//! ```rust
//! use gdrive_sheets::query::{Field, Operator, Query};
//!
//! let q = Query::name_eq("Budget 2024")
//!     .and(Query::in_parents("folder123"))
//!     .and(Query::trashed(false));
//! assert_eq!(
//!     q.to_string(),
//!     "name = 'Budget 2024' and 'folder123' in parents and trashed = false"
//! );
//!
//! let q = Query::term(Field::Name, Operator::Contains, "it's").not();
//! assert_eq!(q.to_string(), r"not name contains 'it\'s'");
//! ```

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// A searchable file attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    FullText,
    MimeType,
    CreatedTime,
    ModifiedTime,
    ViewedByMeTime,
    Trashed,
    Starred,
    Parents,
    Owners,
    Writers,
    Readers,
    SharedWithMe,
    Properties,
    AppProperties,
    Visibility,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::FullText => "fullText",
            Field::MimeType => "mimeType",
            Field::CreatedTime => "createdTime",
            Field::ModifiedTime => "modifiedTime",
            Field::ViewedByMeTime => "viewedByMeTime",
            Field::Trashed => "trashed",
            Field::Starred => "starred",
            Field::Parents => "parents",
            Field::Owners => "owners",
            Field::Writers => "writers",
            Field::Readers => "readers",
            Field::SharedWithMe => "sharedWithMe",
            Field::Properties => "properties",
            Field::AppProperties => "appProperties",
            Field::Visibility => "visibility",
        }
    }
}

/// Comparison operator of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Contains,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `<literal> in <field>`, for collection fields such as `parents`
    In,
    /// `<field> has <literal>`, for `properties` and `appProperties`
    Has,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Contains => "contains",
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::Has => "has",
        }
    }
}

/// Right-hand side of a term
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Bool(bool),
    Number(i64),
    DateTime(DateTime<Utc>),
    /// `{ key='k' and value='v' }`
    Property { key: String, value: String },
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(n)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(t: DateTime<Utc>) -> Self {
        Literal::DateTime(t)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", escape(s)),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::DateTime(t) => {
                write!(f, "'{}'", t.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Literal::Property { key, value } => {
                write!(f, "{{ key='{}' and value='{}' }}", escape(key), escape(value))
            }
        }
    }
}

/// Escape a string for use between single quotes
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A search expression
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Term {
        field: Field,
        op: Operator,
        value: Literal,
    },
    And(Vec<Query>),
    Or(Vec<Query>),
    Not(Box<Query>),
}

impl Query {
    pub fn term(field: Field, op: Operator, value: impl Into<Literal>) -> Self {
        Query::Term {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn name_eq(name: impl Into<String>) -> Self {
        Self::term(Field::Name, Operator::Eq, Literal::String(name.into()))
    }

    pub fn name_contains(text: impl Into<String>) -> Self {
        Self::term(Field::Name, Operator::Contains, Literal::String(text.into()))
    }

    pub fn full_text_contains(text: impl Into<String>) -> Self {
        Self::term(Field::FullText, Operator::Contains, Literal::String(text.into()))
    }

    pub fn mime_type_eq(mime_type: impl Into<String>) -> Self {
        Self::term(Field::MimeType, Operator::Eq, Literal::String(mime_type.into()))
    }

    /// `'<id>' in parents`
    pub fn in_parents(folder_id: impl Into<String>) -> Self {
        Self::term(Field::Parents, Operator::In, Literal::String(folder_id.into()))
    }

    pub fn trashed(trashed: bool) -> Self {
        Self::term(Field::Trashed, Operator::Eq, trashed)
    }

    /// `properties has { key='k' and value='v' }`
    pub fn has_property(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::term(
            Field::Properties,
            Operator::Has,
            Literal::Property {
                key: key.into(),
                value: value.into(),
            },
        )
    }

    /// Conjunction; nested conjunctions are flattened
    pub fn and(self, other: Query) -> Self {
        match self {
            Query::And(mut terms) => {
                terms.push(other);
                Query::And(terms)
            }
            q => Query::And(vec![q, other]),
        }
    }

    /// Disjunction; nested disjunctions are flattened
    pub fn or(self, other: Query) -> Self {
        match self {
            Query::Or(mut terms) => {
                terms.push(other);
                Query::Or(terms)
            }
            q => Query::Or(vec![q, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Query::Not(Box::new(self))
    }

    fn is_compound(&self) -> bool {
        matches!(self, Query::And(_) | Query::Or(_))
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compound() {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl std::ops::Not for Query {
    type Output = Query;

    fn not(self) -> Query {
        Query::Not(Box::new(self))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term { field, op, value } => match op {
                Operator::In => write!(f, "{} in {}", value, field.as_str()),
                _ => write!(f, "{} {} {}", field.as_str(), op.as_str(), value),
            },
            Query::And(terms) | Query::Or(terms) => {
                let joiner = if matches!(self, Query::And(_)) {
                    " and "
                } else {
                    " or "
                };
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    term.fmt_operand(f)?;
                }
                Ok(())
            }
            Query::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_operand(f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_quotes_and_backslashes() {
        assert_eq!(
            Query::name_eq(r"it's a \path").to_string(),
            r"name = 'it\'s a \\path'"
        );
    }

    #[test]
    fn test_in_parents_puts_literal_first() {
        assert_eq!(Query::in_parents("root").to_string(), "'root' in parents");
    }

    #[test]
    fn test_nested_groups_are_parenthesized() {
        let q = Query::mime_type_eq("text/csv")
            .or(Query::mime_type_eq("text/plain"))
            .and(Query::trashed(false));
        assert_eq!(
            q.to_string(),
            "(mimeType = 'text/csv' or mimeType = 'text/plain') and trashed = false"
        );

        let q = !(Query::name_contains("a").and(Query::name_contains("b")));
        assert_eq!(q.to_string(), "not (name contains 'a' and name contains 'b')");
    }

    #[test]
    fn test_other_literals() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            Query::term(Field::ModifiedTime, Operator::Gt, t).to_string(),
            "modifiedTime > '2024-03-01T12:00:00Z'"
        );
        assert_eq!(
            Query::has_property("team", "o'k").to_string(),
            r"properties has { key='team' and value='o\'k' }"
        );
        assert_eq!(
            Query::term(Field::Starred, Operator::Ne, true).to_string(),
            "starred != true"
        );
    }
}
