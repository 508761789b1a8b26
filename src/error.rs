use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::{fmt, io};

use thiserror::Error;

use crate::section::Shape;

/// Failure of a path or reader based load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Where in the input a structural error was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: Option<PathBuf>,
    line: usize,
}

impl Location {
    pub(crate) fn new(path: Option<&Path>, line: usize) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            line,
        }
    }

    /// `None` when the text did not come from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 1-based line number.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path {
            Some(ref path) => write!(f, "config file '{}', line {}", path.display(), self.line),
            None => write!(f, "config text, line {}", self.line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{name} symbol cannot be empty")]
    EmptySymbol { name: &'static str },
    #[error("{location}: section header is missing its closing tag")]
    MalformedSection { location: Location },
    #[error("{location}: expected a key and value separated by {separator:?}")]
    MissingSeparator {
        location: Location,
        separator: String,
    },
    #[error("{location}: key {key:?} was already set as {existing}")]
    ShapeConflict {
        location: Location,
        key: String,
        existing: Shape,
    },
}

impl ParseError {
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match *self {
            Self::EmptySymbol { .. } => None,
            Self::MalformedSection { ref location }
            | Self::MissingSeparator { ref location, .. }
            | Self::ShapeConflict { ref location, .. } => Some(location),
        }
    }
}

/// A failed lookup, naming the section and key that were asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("section '{section}'{}: {kind}", key_label(.key.as_deref()))]
pub struct LookupError {
    section: String,
    key: Option<String>,
    #[source]
    kind: LookupErrorKind,
}

fn key_label(key: Option<&str>) -> String {
    key.map(|key| format!(" key '{key}'")).unwrap_or_default()
}

impl LookupError {
    pub(crate) fn section_missing(section: &str) -> Self {
        Self {
            section: section.to_owned(),
            key: None,
            kind: LookupErrorKind::SectionMissing,
        }
    }

    pub(crate) fn new(section: &str, key: &str, kind: LookupErrorKind) -> Self {
        Self {
            section: section.to_owned(),
            key: Some(key.to_owned()),
            kind,
        }
    }

    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &LookupErrorKind {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupErrorKind {
    #[error("section does not exist")]
    SectionMissing,
    #[error("key does not exist")]
    KeyMissing,
    #[error("expected {expected} value, found {found}")]
    WrongShape { expected: Shape, found: Shape },
    #[error("cannot convert {text:?} to an integer")]
    ConversionFailed { text: String, source: ParseIntError },
    #[error("{text:?} is not a bool value (true or false)")]
    NotBoolean { text: String },
}
