//! Cell content as seen through the Sheets API

/// The three observable facets of a cell
///
/// A value written locally and not yet saved has `formatted == input` and no
/// numeric value; the server fills in the real formatted and numeric values
/// on the next reload.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellContent {
    /// Display string (e.g. "8" for a cell containing `=A1+B1`)
    pub formatted: String,
    /// Literal or formula text as entered (e.g. "=A1+B1")
    pub input: String,
    /// Parsed numeric value, if the server reported one
    pub numeric: Option<f64>,
}

impl CellContent {
    /// Content of a freshly written, unsaved cell
    pub fn local(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            formatted: value.clone(),
            input: value,
            numeric: None,
        }
    }

    /// Content as reported by the server
    pub fn remote(formatted: impl Into<String>, input: impl Into<String>, numeric: Option<f64>) -> Self {
        Self {
            formatted: formatted.into(),
            input: input.into(),
            numeric,
        }
    }

    /// True when the input value is empty
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

/// Find the first character that is not allowed in XML 1.0 text.
///
/// Allowed: `#x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`.
/// Surrogates cannot occur in a Rust `str`.
pub fn find_invalid_char(value: &str) -> Option<char> {
    value.chars().find(|&c| {
        !matches!(c,
            '\u{9}' | '\u{A}' | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_content() {
        let content = CellContent::local("=A1+B1");
        assert_eq!(content.formatted, "=A1+B1");
        assert_eq!(content.input, "=A1+B1");
        assert_eq!(content.numeric, None);
        assert!(!content.is_empty());
    }

    #[test]
    fn test_find_invalid_char() {
        assert_eq!(find_invalid_char("hello\tworld\r\n"), None);
        assert_eq!(find_invalid_char("unicode \u{1F600} ok"), None);
        assert_eq!(find_invalid_char("bell\u{7}"), Some('\u{7}'));
        assert_eq!(find_invalid_char("nul\u{0}"), Some('\u{0}'));
        assert_eq!(find_invalid_char("\u{FFFE}"), Some('\u{FFFE}'));
        assert_eq!(find_invalid_char("\u{FFFF}"), Some('\u{FFFF}'));
    }
}
