#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

mod access;
mod error;
mod parser;
mod section;
mod syntax;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

pub use access::FromValue;
pub use error::{LoadError, Location, LookupError, LookupErrorKind, ParseError};
pub use parser::Parser;
pub use section::{Section, Shape, Value};
pub use syntax::Syntax;

/// Byte Order Mark (BOM) is used to signal the endianness of an encoding. The order `0xFF 0xFE`
/// strongly suggests that the encoding is using little-endian byte order.
///
/// <https://en.wikipedia.org/wiki/Byte_order_mark>
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Sections parsed from one configuration source. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    sections: HashMap<String, Section>,
}

impl Config {
    pub(crate) fn new(sections: HashMap<String, Section>) -> Self {
        Self { sections }
    }

    /// Parse `buffer` with the default [`Syntax`].
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        Parser::new().parse_bytes(buffer)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Parser::new().parse_reader(reader)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Parser::new().parse_path(path)
    }

    /// Sections in arbitrary order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }
}

impl FromStr for Config {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new().parse_str(s)
    }
}

/// Decode raw file contents into text.
///
/// A UTF-16 LE byte order mark switches to UTF-16 decoding and a UTF-8 one is dropped. Anything
/// else is read as UTF-8, with invalid sequences replaced.
#[must_use]
pub fn decode_data(data: &[u8]) -> String {
    if let Some(data) = data.strip_prefix(BOM_UTF16_LE) {
        let utf16 = data
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .collect::<Vec<u16>>();

        char::decode_utf16(utf16)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect::<String>()
    } else {
        let data = data.strip_prefix(BOM_UTF8).unwrap_or(data);
        String::from_utf8_lossy(data).into_owned()
    }
}
