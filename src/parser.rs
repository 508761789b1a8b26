use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::Config;
use crate::error::{LoadError, Location, ParseError};
use crate::section::{Section, Shape, Value};
use crate::syntax::Syntax;

/// Turns configuration text into a [`Config`] using a fixed set of symbols.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_syntax(syntax: Syntax) -> Self {
        Self { syntax }
    }

    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    pub fn parse_str(&self, text: &str) -> Result<Config, ParseError> {
        self.parse_text(text, None)
    }

    /// Decode `buffer` (see [`decode_data`](crate::decode_data)) and parse the result.
    pub fn parse_bytes(&self, buffer: &[u8]) -> Result<Config, ParseError> {
        self.parse_text(&crate::decode_data(buffer), None)
    }

    /// Read `reader` to the end, then parse. Read errors are returned as they are.
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Config, LoadError> {
        let buffer = read_all(&mut reader)?;
        Ok(self.parse_bytes(&buffer)?)
    }

    /// Like [`parse_reader`](Self::parse_reader), but parse errors also name `path`.
    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> Result<Config, LoadError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");

        let mut file = File::open(path)?;
        let buffer = read_all(&mut file)?;
        Ok(self.parse_text(&crate::decode_data(&buffer), Some(path))?)
    }

    fn parse_text(&self, text: &str, path: Option<&Path>) -> Result<Config, ParseError> {
        if let Some(name) = self.syntax.first_empty() {
            return Err(ParseError::EmptySymbol { name });
        }

        let sections = ParseState::new(&self.syntax, path).into_sections(text)?;
        debug!(sections = sections.len(), "parsed configuration");

        Ok(Config::new(sections))
    }
}

fn read_all<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(4096);
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Represents an on-going parse.
struct ParseState<'a> {
    syntax: &'a Syntax,
    path: Option<&'a Path>,
    sections: HashMap<String, Section>,
    // Lines before the first header have nowhere to go and are dropped.
    current: Option<Section>,
}

impl<'a> ParseState<'a> {
    fn new(syntax: &'a Syntax, path: Option<&'a Path>) -> Self {
        Self {
            syntax,
            path,
            sections: HashMap::with_capacity(16),
            current: None,
        }
    }

    fn into_sections(mut self, text: &str) -> Result<HashMap<String, Section>, ParseError> {
        let text = normalize_line_endings(text);

        for (i, line) in text.split('\n').enumerate() {
            let line_no = i + 1;
            let line = line.trim();

            if line.is_empty() || line.starts_with(self.syntax.comment_prefix()) {
                continue;
            }

            if line.starts_with(self.syntax.section_open()) {
                let name = self.parse_section_name(line, line_no)?;
                self.commit();
                trace!(line = line_no, section = %name, "opening section");
                self.current = Some(Section::new(name));
            } else {
                self.parse_entry(line, line_no)?;
            }
        }

        self.commit();
        Ok(self.sections)
    }

    /// Text between the opening tag and the last closing tag on the line.
    fn parse_section_name(&self, line: &str, line_no: usize) -> Result<String, ParseError> {
        // The caller checked that the line starts with the opening tag.
        let start = self.syntax.section_open().len();
        let end = line
            .rfind(self.syntax.section_close())
            .filter(|&end| end >= start)
            .ok_or_else(|| ParseError::MalformedSection {
                location: Location::new(self.path, line_no),
            })?;

        Ok(line[start..end].trim().to_owned())
    }

    fn parse_entry(&mut self, line: &str, line_no: usize) -> Result<(), ParseError> {
        let syntax = self.syntax;
        let path = self.path;

        let Some((raw_key, raw_value)) = line.split_once(syntax.key_separator()) else {
            return Err(ParseError::MissingSeparator {
                location: Location::new(path, line_no),
                separator: syntax.key_separator().to_owned(),
            });
        };
        let value = raw_value.trim().to_owned();

        let Some(section) = self.current.as_mut() else {
            debug!(line = line_no, "discarding entry outside of any section");
            return Ok(());
        };

        let (key, shape) = match raw_key.find(syntax.array_marker()) {
            Some(i) => (raw_key[..i].trim(), Shape::Sequence),
            None => (raw_key.trim(), Shape::Scalar),
        };

        match section.entry(key.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(match shape {
                    Shape::Scalar => Value::from(value),
                    Shape::Sequence => Value::from(vec![value]),
                });
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), shape) {
                (Value::Scalar(existing), Shape::Scalar) => *existing = value,
                (Value::Sequence(values), Shape::Sequence) => values.push(value),
                (existing, _) => {
                    return Err(ParseError::ShapeConflict {
                        location: Location::new(path, line_no),
                        key: key.to_owned(),
                        existing: existing.shape(),
                    });
                }
            },
        }

        Ok(())
    }

    /// Move the open section into the finished set, replacing any earlier one of the same name.
    fn commit(&mut self) {
        let Some(section) = self.current.take() else {
            return;
        };

        if self.sections.contains_key(section.name()) {
            warn!(
                section = section.name(),
                "section appears more than once; keeping the last occurrence"
            );
        }

        trace!(section = section.name(), keys = section.len(), "committing section");
        self.sections.insert(section.name().to_owned(), section);
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<HashMap<String, Section>, ParseError> {
        let syntax = Syntax::default();
        ParseState::new(&syntax, None).into_sections(text)
    }

    fn scalar(s: &str) -> Value {
        Value::Scalar(s.to_owned())
    }

    fn sequence(items: &[&str]) -> Value {
        Value::Sequence(items.iter().map(|&s| s.to_owned()).collect())
    }

    #[test]
    fn keys_and_values_are_trimmed() {
        let sections = parse("[ Section ]\n  key1 =  value1 \nkey2=value2\n")
            .expect("failed to parse hardcoded config");
        let section = &sections["Section"];

        assert_eq!(section.get("key1"), Some(&scalar("value1")));
        assert_eq!(section.get("key2"), Some(&scalar("value2")));
    }

    #[test]
    fn value_keeps_later_separators() {
        let sections =
            parse("[db]\nurl = postgres://h/db?sslmode=require\n").expect("failed to parse");

        assert_eq!(
            sections["db"].get("url"),
            Some(&scalar("postgres://h/db?sslmode=require"))
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let sections = parse("# leading comment\n\n[s]\n   # indented comment\nk = v\n\n")
            .expect("failed to parse");

        assert_eq!(sections.len(), 1);
        assert_eq!(sections["s"].len(), 1);
    }

    #[test]
    fn array_elements_accumulate_in_order() {
        let sections = parse("[s]\ne[] = 1\ne [] = 2\n f = 9\n e [] = 4\n").expect("failed to parse");

        assert_eq!(sections["s"].get("e"), Some(&sequence(&["1", "2", "4"])));
        assert_eq!(sections["s"].get("f"), Some(&scalar("9")));
    }

    #[test]
    fn scalar_is_overwritten_by_later_scalar() {
        let sections = parse("[s]\nk = first\nk = second\n").expect("failed to parse");

        assert_eq!(sections["s"].get("k"), Some(&scalar("second")));
    }

    #[test]
    fn all_line_endings_are_accepted() {
        let sections = parse("[s]\r\na = 1\rb = 2\nc = 3").expect("failed to parse");
        let section = &sections["s"];

        assert_eq!(section.get("a"), Some(&scalar("1")));
        assert_eq!(section.get("b"), Some(&scalar("2")));
        assert_eq!(section.get("c"), Some(&scalar("3")));
    }

    #[test]
    fn reopened_section_replaces_earlier_one() {
        let sections =
            parse("[a]\nx = 1\ny = 2\n[b]\nz = 3\n[a]\nw = 4\n").expect("failed to parse");

        assert_eq!(sections.len(), 2);
        assert_eq!(sections["a"].len(), 1);
        assert_eq!(sections["a"].get("w"), Some(&scalar("4")));
        assert!(!sections["a"].contains_key("x"));
    }

    #[test]
    fn entries_before_first_section_are_dropped() {
        let sections = parse("orphan = 1\n[s]\nk = v\n").expect("failed to parse");

        assert_eq!(sections.len(), 1);
        assert!(!sections["s"].contains_key("orphan"));
    }

    #[test]
    fn entry_before_first_section_still_needs_separator() {
        let err = parse("junk\n[s]\nk = v\n").unwrap_err();

        assert!(matches!(err, ParseError::MissingSeparator { .. }));
        assert_eq!(err.location().map(Location::line), Some(1));
    }

    #[test]
    fn empty_section_name_is_allowed() {
        let sections = parse("[   ]\nk = v\n").expect("failed to parse");

        assert_eq!(sections[""].get("k"), Some(&scalar("v")));
    }

    #[test]
    fn header_uses_last_closing_tag() {
        let sections = parse("[a]b]\nk = v\n").expect("failed to parse");

        assert!(sections.contains_key("a]b"));
    }

    #[test]
    fn text_after_closing_tag_is_ignored() {
        let sections = parse("[a] trailing\nk = v\n").expect("failed to parse");

        assert_eq!(sections["a"].get("k"), Some(&scalar("v")));
    }

    #[test]
    fn closing_tag_inside_opening_tag_is_malformed() {
        for (open, close, line) in [("|", "|", "|"), ("[[", "[[", "[[")] {
            let syntax = Syntax::new().section_tags(open, close);
            let err = ParseState::new(&syntax, None)
                .into_sections(&format!("{line}\nk = v\n"))
                .unwrap_err();

            assert!(matches!(err, ParseError::MalformedSection { .. }));
            assert_eq!(err.location().map(Location::line), Some(1));
        }
    }

    #[test]
    fn unterminated_section_reports_line() {
        let err = parse("# header\n[ok]\nk = v\n[unterminated\n").unwrap_err();

        assert!(matches!(err, ParseError::MalformedSection { .. }));
        assert_eq!(err.location().map(Location::line), Some(4));
    }

    #[test]
    fn missing_separator_reports_line() {
        let err = parse("[s]\r\nk = v\r\njust some words\r\n").unwrap_err();

        assert!(matches!(err, ParseError::MissingSeparator { .. }));
        assert_eq!(err.location().map(Location::line), Some(3));
    }

    #[test]
    fn array_after_scalar_conflicts() {
        let err = parse("[s]\nk = v\nk[] = w\n").unwrap_err();

        assert_eq!(
            err,
            ParseError::ShapeConflict {
                location: Location::new(None, 3),
                key: "k".to_owned(),
                existing: Shape::Scalar,
            }
        );
    }

    #[test]
    fn scalar_after_array_conflicts() {
        let err = parse("[s]\nk[] = v\nk = w\n").unwrap_err();

        assert!(matches!(
            err,
            ParseError::ShapeConflict {
                existing: Shape::Sequence,
                ..
            }
        ));
    }

    #[test]
    fn same_key_in_new_block_starts_fresh() {
        let sections = parse("[s]\nk = v\n[t]\nx = 1\n[s]\nk[] = w\n").expect("failed to parse");

        assert_eq!(sections["s"].get("k"), Some(&sequence(&["w"])));
    }

    #[test]
    fn custom_syntax() {
        let syntax = Syntax::new()
            .comment(";")
            .section_tags("<", ">")
            .array_tag("+")
            .separator(":");
        let sections = ParseState::new(&syntax, None)
            .into_sections("; note\n<net>\nhost: example.org:80\nports+: 80\nports +: 443\n")
            .expect("failed to parse");
        let section = &sections["net"];

        assert_eq!(section.get("host"), Some(&scalar("example.org:80")));
        assert_eq!(section.get("ports"), Some(&sequence(&["80", "443"])));
    }

    #[test]
    fn parser_rejects_empty_symbol() {
        let parser = Parser::with_syntax(Syntax::new().separator(""));

        assert_eq!(
            parser.parse_str("[s]\nk = v\n").unwrap_err(),
            ParseError::EmptySymbol { name: "separator" }
        );
    }

    #[test]
    fn path_is_reported_in_errors() {
        let syntax = Syntax::default();
        let err = ParseState::new(&syntax, Some(Path::new("/etc/app.conf")))
            .into_sections("[s")
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "config file '/etc/app.conf', line 1: section header is missing its closing tag"
        );
    }
}
