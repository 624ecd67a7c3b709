//! Classification queries.

/// A single text query, line-terminated for the engine's tokenizer.
///
/// The engine reads input line by line, so a query is only ever handed over
/// with a trailing `'\n'`. The terminator is appended unconditionally, even if
/// the text already ends with one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    line: String,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        let mut line = text.into();
        line.push('\n');
        Self { line }
    }

    /// The line-terminated form passed to the engine.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// The caller's original text, without the appended terminator.
    pub fn text(&self) -> &str {
        &self.line[..self.line.len() - 1]
    }
}
