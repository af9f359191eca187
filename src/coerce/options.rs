use crate::value::Value;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// User hook run before every other coercion rule; `Some` wins.
/// Arguments: raw value, key, containing object.
pub type CustomCoercion = dyn Fn(&Value, &str, &Value) -> Option<Value> + Send + Sync;

/// Whole-key rename hook; `None` falls back to the default renaming.
pub type KeyFormatter = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Per path-segment rename hook (defaults to lower camel case).
pub type KeyPartFormatter = dyn Fn(&str) -> String + Send + Sync;

/// Shared callback that keeps `FormatOptions` cloneable and printable.
pub struct Hook<F: ?Sized>(pub Arc<F>);

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Hook(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// Number parsing switch, or an allow-list of keys whose values are numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NumberParsing {
    Enabled(bool),
    Keys(Vec<String>),
}

/// Which coercion rules run and how keys are renamed.
///
/// Rules with an `Option<bool>` switch follow `parse_all` unless set
/// explicitly; an explicit `false` always disables the rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub parse_all: bool,
    pub parse_numbers: Option<NumberParsing>,
    pub parse_dates: Option<bool>,
    pub parse_booleans: Option<bool>,
    pub parse_json: Option<bool>,
    pub parse_currency: Option<bool>,
    pub minus_as_null: Option<bool>,
    pub plus_as_exists: Option<bool>,
    pub parse_integer_dates: bool,
    pub numbers_to_cents: bool,
    pub currency_to_cents: bool,
    pub exclude_minuses: bool,
    pub exclude_falsey: bool,
    pub exclude_empty: bool,
    pub camel_case: bool,
    pub capitalize: bool,
    pub merge_headless: bool,
    #[serde(skip)]
    pub custom: Option<Hook<CustomCoercion>>,
    #[serde(skip)]
    pub key_formatter: Option<Hook<KeyFormatter>>,
    #[serde(skip)]
    pub key_part_formatter: Option<Hook<KeyPartFormatter>>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            parse_all: true,
            parse_numbers: None,
            parse_dates: None,
            parse_booleans: None,
            parse_json: None,
            parse_currency: None,
            minus_as_null: None,
            plus_as_exists: None,
            parse_integer_dates: false,
            numbers_to_cents: false,
            currency_to_cents: true,
            exclude_minuses: false,
            exclude_falsey: false,
            exclude_empty: false,
            camel_case: false,
            capitalize: false,
            merge_headless: false,
            custom: None,
            key_formatter: None,
            key_part_formatter: None,
        }
    }
}

impl FormatOptions {
    /// Every optional rule off unless switched on explicitly.
    pub fn none() -> Self {
        Self {
            parse_all: false,
            ..Self::default()
        }
    }

    pub fn camel_case(mut self) -> Self {
        self.camel_case = true;
        self
    }

    pub fn custom(
        mut self,
        hook: impl Fn(&Value, &str, &Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.custom = Some(Hook(Arc::new(hook)));
        self
    }

    pub fn key_formatter(
        mut self,
        hook: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.key_formatter = Some(Hook(Arc::new(hook)));
        self
    }

    pub fn key_part_formatter(
        mut self,
        hook: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.key_part_formatter = Some(Hook(Arc::new(hook)));
        self
    }

    pub(crate) fn active(&self, specific: Option<bool>) -> bool {
        match specific {
            Some(false) => false,
            Some(true) => true,
            None => self.parse_all,
        }
    }

    pub(crate) fn numbers(&self) -> NumberRule<'_> {
        match &self.parse_numbers {
            Some(NumberParsing::Keys(keys)) => NumberRule::Keys(keys),
            Some(NumberParsing::Enabled(false)) => NumberRule::Off,
            Some(NumberParsing::Enabled(true)) => NumberRule::Pattern,
            None if self.parse_all => NumberRule::Pattern,
            None => NumberRule::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberRule<'a> {
    Off,
    Pattern,
    Keys(&'a [String]),
}
