//! The symbols that drive line classification.
//!
//! A [`Syntax`] is handed to a [`Parser`](crate::Parser) when it is built and is not touched
//! again afterwards, so two parsers with different symbols can live side by side.

pub const DEFAULT_COMMENT: &str = "#";
pub const DEFAULT_SECTION_OPEN: &str = "[";
pub const DEFAULT_SECTION_CLOSE: &str = "]";
pub const DEFAULT_ARRAY_TAG: &str = "[]";
pub const DEFAULT_SEPARATOR: &str = "=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    comment: String,
    section_open: String,
    section_close: String,
    array_tag: String,
    separator: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            comment: DEFAULT_COMMENT.to_owned(),
            section_open: DEFAULT_SECTION_OPEN.to_owned(),
            section_close: DEFAULT_SECTION_CLOSE.to_owned(),
            array_tag: DEFAULT_ARRAY_TAG.to_owned(),
            separator: DEFAULT_SEPARATOR.to_owned(),
        }
    }
}

impl Syntax {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix marking a whole line as a comment.
    #[must_use]
    pub fn comment(mut self, prefix: impl Into<String>) -> Self {
        self.comment = prefix.into();
        self
    }

    #[must_use]
    pub fn section_tags(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.section_open = open.into();
        self.section_close = close.into();
        self
    }

    /// Marker placed after a key to append the value to an array, `[]` by default.
    #[must_use]
    pub fn array_tag(mut self, tag: impl Into<String>) -> Self {
        self.array_tag = tag.into();
        self
    }

    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[must_use]
    pub fn comment_prefix(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn section_open(&self) -> &str {
        &self.section_open
    }

    #[must_use]
    pub fn section_close(&self) -> &str {
        &self.section_close
    }

    #[must_use]
    pub fn array_marker(&self) -> &str {
        &self.array_tag
    }

    #[must_use]
    pub fn key_separator(&self) -> &str {
        &self.separator
    }

    /// Name of the first symbol that is empty, if any.
    pub(crate) fn first_empty(&self) -> Option<&'static str> {
        [
            ("comment", &self.comment),
            ("section open tag", &self.section_open),
            ("section close tag", &self.section_close),
            ("array tag", &self.array_tag),
            ("separator", &self.separator),
        ]
        .into_iter()
        .find_map(|(name, symbol)| symbol.is_empty().then_some(name))
    }
}
