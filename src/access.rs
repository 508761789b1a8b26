//! Typed lookups on a parsed [`Config`].
//!
//! Every accessor comes in two flavours. The plain one (`int`, `string`, ...) returns a
//! [`LookupError`] the caller can handle. The `must_*` one takes an optional default and panics
//! when the lookup fails and no default was given; it is meant for settings a program cannot
//! start without.

use std::collections::BTreeSet;

use crate::Config;
use crate::error::{LookupError, LookupErrorKind};
use crate::section::{Shape, Value};

/// Conversion from a stored [`Value`] to a caller-facing type.
pub trait FromValue<'a>: Sized {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind>;
}

fn scalar(value: &Value) -> Result<&str, LookupErrorKind> {
    match value {
        Value::Scalar(text) => Ok(text),
        Value::Sequence(..) => Err(LookupErrorKind::WrongShape {
            expected: Shape::Scalar,
            found: Shape::Sequence,
        }),
    }
}

fn sequence(value: &Value) -> Result<&[String], LookupErrorKind> {
    match value {
        Value::Sequence(items) => Ok(items),
        Value::Scalar(..) => Err(LookupErrorKind::WrongShape {
            expected: Shape::Sequence,
            found: Shape::Scalar,
        }),
    }
}

fn parse_int(text: &str) -> Result<i64, LookupErrorKind> {
    text.parse::<i64>()
        .map_err(|source| LookupErrorKind::ConversionFailed {
            text: text.to_owned(),
            source,
        })
}

impl<'a> FromValue<'a> for &'a str {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind> {
        scalar(value)
    }
}

impl<'a> FromValue<'a> for String {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind> {
        scalar(value).map(str::to_owned)
    }
}

impl<'a> FromValue<'a> for i64 {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind> {
        scalar(value).and_then(parse_int)
    }
}

impl<'a> FromValue<'a> for bool {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind> {
        match scalar(value)? {
            "true" => Ok(true),
            "false" => Ok(false),
            text => Err(LookupErrorKind::NotBoolean {
                text: text.to_owned(),
            }),
        }
    }
}

impl<'a> FromValue<'a> for &'a [String] {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind> {
        sequence(value)
    }
}

impl<'a> FromValue<'a> for Vec<String> {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind> {
        sequence(value).map(<[String]>::to_vec)
    }
}

impl<'a> FromValue<'a> for Vec<i64> {
    fn from_value(value: &'a Value) -> Result<Self, LookupErrorKind> {
        sequence(value)?
            .iter()
            .map(|text| parse_int(text))
            .collect()
    }
}

impl Config {
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Names of the keys in section `name`.
    pub fn section_options(&self, name: &str) -> Result<BTreeSet<&str>, LookupError> {
        self.section(name)
            .map(|section| section.keys().collect())
            .ok_or_else(|| LookupError::section_missing(name))
    }

    /// Look up `key` in `section` and convert it to `T`.
    pub fn get<'a, T>(&'a self, section: &str, key: &str) -> Result<T, LookupError>
    where
        T: FromValue<'a>,
    {
        let value = self
            .section(section)
            .ok_or_else(|| LookupError::section_missing(section))?
            .get(key)
            .ok_or_else(|| LookupError::new(section, key, LookupErrorKind::KeyMissing))?;

        T::from_value(value).map_err(|kind| LookupError::new(section, key, kind))
    }

    pub fn int(&self, section: &str, key: &str) -> Result<i64, LookupError> {
        self.get(section, key)
    }

    pub fn string(&self, section: &str, key: &str) -> Result<&str, LookupError> {
        self.get(section, key)
    }

    /// Only the exact strings `true` and `false` are accepted.
    pub fn bool(&self, section: &str, key: &str) -> Result<bool, LookupError> {
        self.get(section, key)
    }

    pub fn array_int(&self, section: &str, key: &str) -> Result<Vec<i64>, LookupError> {
        self.get(section, key)
    }

    pub fn array_string(&self, section: &str, key: &str) -> Result<&[String], LookupError> {
        self.get(section, key)
    }

    /// Like [`get`](Self::get), but falls back to `default` on any lookup error.
    ///
    /// # Panics
    ///
    /// Panics if the lookup fails and `default` is `None`.
    #[track_caller]
    pub fn must<'a, T>(&'a self, section: &str, key: &str, default: impl Into<Option<T>>) -> T
    where
        T: FromValue<'a>,
    {
        match self.get(section, key) {
            Ok(value) => value,
            Err(err) => match default.into() {
                Some(default) => default,
                None => panic!("required configuration value unavailable: {err}"),
            },
        }
    }

    /// # Panics
    ///
    /// Panics if the lookup fails and `default` is `None`.
    #[track_caller]
    pub fn must_int(&self, section: &str, key: &str, default: impl Into<Option<i64>>) -> i64 {
        self.must(section, key, default)
    }

    /// # Panics
    ///
    /// Panics if the lookup fails and `default` is `None`.
    #[track_caller]
    pub fn must_string<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: impl Into<Option<&'a str>>,
    ) -> &'a str {
        self.must(section, key, default)
    }

    /// # Panics
    ///
    /// Panics if the lookup fails and `default` is `None`.
    #[track_caller]
    pub fn must_bool(&self, section: &str, key: &str, default: impl Into<Option<bool>>) -> bool {
        self.must(section, key, default)
    }

    /// # Panics
    ///
    /// Panics if the lookup fails and `default` is `None`.
    #[track_caller]
    pub fn must_array_int(
        &self,
        section: &str,
        key: &str,
        default: impl Into<Option<Vec<i64>>>,
    ) -> Vec<i64> {
        self.must(section, key, default)
    }

    /// # Panics
    ///
    /// Panics if the lookup fails and `default` is `None`.
    #[track_caller]
    pub fn must_array_string(
        &self,
        section: &str,
        key: &str,
        default: impl Into<Option<Vec<String>>>,
    ) -> Vec<String> {
        self.must(section, key, default)
    }
}
