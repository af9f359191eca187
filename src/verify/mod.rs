//! Collection and object verification. Every miss becomes a
//! [`Failure::Validation`](crate::failure::Failure::Validation) whose message
//! explains what was expected and, for collections, what came closest.

pub mod options;
pub mod table;

pub use options::{TableVerifyOptions, VerifyOptions};

use crate::assertion::{fail, with_prefix};
use crate::coerce::FormatOptions;
use crate::context::TestContext;
use crate::failure::Result;
use crate::format::Formatter;
use crate::matcher::{
    MatchOptions, SubsetOptions, closest_match_explanation, field, is_subset_of, matches,
    prune_nulls,
};
use crate::resolve::EntityResolverRegistry;
use crate::value::{Map, Value, get_path};

const LINK_FIELDS: [&str; 2] = ["link", "LINK"];

/// Verifies actual data against expected entries, resolving references
/// through the registry it was built with.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'r> {
    formatter: Formatter<'r>,
}

impl<'r> Verifier<'r> {
    pub fn new(registry: &'r EntityResolverRegistry) -> Self {
        Self {
            formatter: Formatter::new(registry),
        }
    }

    pub fn formatter(&self) -> &Formatter<'r> {
        &self.formatter
    }

    /// Find a matching actual entry for `expected`, or for each element when
    /// `expected` is an array. Returns the matched entries; with
    /// `save_links`, `{link: entry}` (null for entries without a link).
    pub fn verify_set_includes(
        &self,
        actual: Option<&Value>,
        expected: &Value,
        context: &mut TestContext,
        options: &VerifyOptions,
    ) -> Result<Value> {
        let source = require_collection(actual)?;

        match expected {
            Value::Array(entries) => {
                let mut found = Vec::with_capacity(entries.len());
                for (index, entry) in entries.iter().enumerate() {
                    found.push(self.verify_exists(source, entry, Some(index), context, options)?);
                }
                Ok(Value::Array(found))
            }
            entry => self.verify_exists(source, entry, None, context, options),
        }
    }

    fn verify_exists(
        &self,
        source: &[Value],
        entry: &Value,
        index: Option<usize>,
        context: &mut TestContext,
        options: &VerifyOptions,
    ) -> Result<Value> {
        let link = link_name(entry);
        let mut expected = entry.clone();
        if options.save_links
            && let Some(fields) = expected.as_object_mut()
        {
            for field in LINK_FIELDS {
                fields.shift_remove(field);
            }
        }

        if options.format_subset {
            expected = self.format_subset(&expected, context)?;
        }
        if options.ignore_nulls {
            prune_nulls(&mut expected);
        }

        let message = options.message.as_deref();
        let match_options = MatchOptions {
            ignore_nulls: options.ignore_nulls,
        };
        let view: &TestContext = context;
        let Some(position) = source
            .iter()
            .position(|candidate| matches(candidate, &expected, view, match_options))
        else {
            return Err(fail(with_prefix(
                message,
                &format!(
                    "No entry matched: {}.{}",
                    expected.to_json_string(),
                    closest_match_explanation(source, &expected, view)
                ),
            )));
        };

        if options.strict_order
            && let Some(index) = index
            && index != position
        {
            return Err(fail(with_prefix(
                message,
                &format!(
                    "Entry is not in the expected position in the array. Expected: {index}, actual {position}: {}",
                    expected.to_json_string()
                ),
            )));
        }

        let matched = source[position].clone();
        if !options.save_links {
            return Ok(matched);
        }

        match link {
            Some(link) => {
                tracing::debug!(link = %link, position, "saved link");
                context.save_link(link.clone(), matched.clone());
                Ok(Value::Object(Map::from_iter([(link, matched)])))
            }
            None => Ok(Value::Null),
        }
    }

    /// Expected entries as the set verifier sees them: `-` means null and
    /// references and expressions are resolved; other text stays as written.
    pub fn format_subset(&self, expected: &Value, context: &TestContext) -> Result<Value> {
        self.formatter.format(expected, Some(context), &subset_format_options())
    }

    /// Fail when any expected entry matches some actual entry.
    pub fn verify_set_does_not_include(
        &self,
        actual: Option<&Value>,
        expected: &Value,
        context: &TestContext,
    ) -> Result<()> {
        let source = require_collection(actual)?;
        for entry in entries_of(expected) {
            if source
                .iter()
                .any(|candidate| matches(candidate, entry, context, MatchOptions::default()))
            {
                return Err(fail(format!("expected \"{}\" to not exist.", entry.to_json_string())));
            }
        }
        Ok(())
    }

    /// Pick the actual entry for each expected entry with `match_factory`
    /// (which builds a partial object to look up), then assert every
    /// expected field on it.
    pub fn verify_set_includes_by<F>(
        &self,
        actual: Option<&Value>,
        expected: &Value,
        match_factory: F,
        context: &TestContext,
        message: Option<&str>,
    ) -> Result<Vec<Value>>
    where
        F: Fn(&Value) -> Value,
    {
        let source = require_collection(actual)?;
        let mut found = Vec::new();

        for entry in entries_of(expected) {
            let lookup = match_factory(entry);
            let Some(candidate) = source
                .iter()
                .find(|candidate| is_subset_of(&lookup, candidate, SubsetOptions::default()))
            else {
                return Err(fail(format!(
                    "no entry found matching {}.{}",
                    lookup.to_json_string(),
                    closest_match_explanation(source, entry, context)
                )));
            };

            let entry_message = match message {
                Some(message) => format!("for entry: {} -- {message}", lookup.to_json_string()),
                None => format!("for entry: {}", lookup.to_json_string()),
            };
            self.verify_object_includes(Some(candidate), entry, context, Some(&entry_message))?;
            found.push(candidate.clone());
        }

        Ok(found)
    }

    /// Assert every field of `expected` (keys may be paths) on `source`.
    pub fn verify_object_includes(
        &self,
        source: Option<&Value>,
        expected: &Value,
        context: &TestContext,
        message: Option<&str>,
    ) -> Result<Value> {
        for (key, expected_value) in expected.entries() {
            self.assert_value_matches(source, &key, expected_value, context, message)?;
        }
        Ok(source.cloned().unwrap_or(Value::Null))
    }

    /// Strict assertion of one field. Expected text is coerced with minus as
    /// null and booleans parsed; regexes, dates and numbers follow the
    /// matcher's field rules.
    pub fn assert_value_matches(
        &self,
        source: Option<&Value>,
        key: &str,
        expected: &Value,
        context: &TestContext,
        message: Option<&str>,
    ) -> Result<()> {
        if field::is_wildcard(expected) {
            return Ok(());
        }

        let actual = source.and_then(|source| get_path(source, key));
        if expected.is_structured() {
            return self
                .verify_object_includes(actual, expected, context, message)
                .map(drop);
        }

        let expected = match expected {
            Value::String(_) => self
                .formatter
                .coercer()
                .coerce(
                    expected,
                    Some(key),
                    Some(&Value::object()),
                    Some(context),
                    &assertion_format_options(),
                )?
                .unwrap_or(Value::Null),
            other => other.clone(),
        };

        field::scalar_verdict(actual, &expected, context, key, message)
            .map_err(|explanation| fail(explanation))
    }
}

/// Fail unless `existing` already contains everything in `new`.
pub fn verify_equal(existing: &Value, new: &Value) -> Result<Value> {
    if is_subset_of(new, existing, SubsetOptions::default()) {
        return Ok(existing.clone());
    }
    Err(fail(format!(
        "new entity conflicts with existing one.\r\nExisting: {}\r\nNew: {}",
        existing.to_json_string(),
        new.to_json_string()
    )))
}

/// Every top-level pair of `subset` must appear, deeply equal, in `full`.
pub fn assert_object_includes(full: &Value, subset: &Value, message: Option<&str>) -> Result<()> {
    let included = subset
        .entries()
        .into_iter()
        .all(|(key, expected)| full.child(&key) == Some(expected));
    if included {
        return Ok(());
    }
    Err(fail(message.map_or_else(
        || format!("{} do not include {}", full.to_json_string(), subset.to_json_string()),
        str::to_owned,
    )))
}

/// Factory for [`Verifier::verify_set_includes_by`] that looks entries up by one property.
pub fn by_property(name: impl Into<String>) -> impl Fn(&Value) -> Value {
    let name = name.into();
    move |expected| {
        let value = expected.child(&name).cloned().unwrap_or(Value::Null);
        Value::Object(Map::from_iter([(name.clone(), value)]))
    }
}

fn require_collection(actual: Option<&Value>) -> Result<&[Value]> {
    let actual = actual
        .filter(|actual| !actual.is_null())
        .ok_or_else(|| fail("No data found!"))?;
    actual
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| fail(format!("Expected array but found {}!", actual.type_name())))
}

fn entries_of(expected: &Value) -> Vec<&Value> {
    match expected {
        Value::Array(entries) => entries.iter().collect(),
        entry => vec![entry],
    }
}

fn link_name(entry: &Value) -> Option<String> {
    LINK_FIELDS
        .iter()
        .find_map(|field| entry.child(field))
        .filter(|link| link.is_truthy())
        .map(Value::to_display_string)
}

fn subset_format_options() -> FormatOptions {
    FormatOptions {
        minus_as_null: Some(true),
        ..FormatOptions::none()
    }
}

fn assertion_format_options() -> FormatOptions {
    FormatOptions {
        minus_as_null: Some(true),
        parse_booleans: Some(true),
        ..FormatOptions::none()
    }
}
