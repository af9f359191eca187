pub mod headless;
pub mod helpers;
pub mod keys;

pub use crate::coerce::{FormatOptions, NumberParsing, parse_boolean};
pub use headless::merge_headless;
pub use helpers::{
    build_paths, diff_keys, drop_internal_ids, map_amount_properties_to_cents,
    parse_json_properties,
};
pub use keys::{RenamedKey, rename_key};

use crate::coerce::Coercer;
use crate::context::TestContext;
use crate::failure::Result;
use crate::resolve::EntityResolverRegistry;
use crate::value::{Map, Value, set_path};

/// Coerced first so resolvers for the remaining fields can see it.
pub const ORGANIZATION_KEY: &str = "organization";

/// Walks table data, renaming keys and coercing every leaf.
#[derive(Debug, Clone, Copy)]
pub struct Formatter<'r> {
    coercer: Coercer<'r>,
}

impl<'r> Formatter<'r> {
    pub fn new(registry: &'r EntityResolverRegistry) -> Self {
        Self {
            coercer: Coercer::new(registry),
        }
    }

    pub fn coercer(&self) -> &Coercer<'r> {
        &self.coercer
    }

    /// Format one row or a sequence of rows. Headless rows are merged
    /// afterwards when `merge_headless` is on.
    pub fn format(
        &self,
        value: &Value,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Value> {
        let formatted = match value {
            Value::Array(rows) => {
                let mut formatted = Vec::with_capacity(rows.len());
                for row in rows {
                    if let Some(row) = self.format_row(row, context, options)? {
                        formatted.push(row);
                    }
                }
                Value::Array(formatted)
            }
            other => self.format_row(other, context, options)?.unwrap_or(Value::Null),
        };

        if options.merge_headless {
            return merge_headless(formatted);
        }
        Ok(formatted)
    }

    /// [`format`](Self::format) with camel-cased keys.
    pub fn format_and_camel_case(
        &self,
        value: &Value,
        context: &TestContext,
        options: &FormatOptions,
    ) -> Result<Value> {
        let options = FormatOptions {
            camel_case: true,
            ..options.clone()
        };
        self.format(value, Some(context), &options)
    }

    /// Coerce a lone value with no key or containing object.
    pub fn format_value(
        &self,
        value: &Value,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Option<Value>> {
        self.coercer.coerce(value, None, None, context, options)
    }

    fn format_row(
        &self,
        row: &Value,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Option<Value>> {
        match row {
            Value::Object(fields) => self.format_object(fields, context, options).map(Some),
            other => self.coercer.coerce(other, None, None, context, options),
        }
    }

    fn format_object(
        &self,
        fields: &Map,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Value> {
        let mut object = Value::Object(fields.clone());

        let organization_done = match fields.get(ORGANIZATION_KEY) {
            Some(raw) if raw.is_truthy() => {
                let formatted =
                    self.format_field(raw, ORGANIZATION_KEY, &object, context, options)?;
                if let Some(working) = object.as_object_mut() {
                    match formatted {
                        Some(organization) => {
                            working.insert(ORGANIZATION_KEY.to_owned(), organization);
                        }
                        None => {
                            working.shift_remove(ORGANIZATION_KEY);
                        }
                    }
                }
                true
            }
            _ => false,
        };

        for key in fields.keys() {
            let Some(raw) = object
                .as_object_mut()
                .and_then(|working| working.shift_remove(key))
            else {
                continue;
            };

            let renamed = rename_key(key, options);
            let value = if organization_done && key == ORGANIZATION_KEY {
                Some(raw)
            } else {
                self.format_field(&raw, renamed.as_str(), &object, context, options)?
            };

            let Some(value) = value else {
                continue;
            };
            match renamed {
                RenamedKey::Literal(literal) => {
                    if let Some(working) = object.as_object_mut() {
                        working.insert(literal, value);
                    }
                }
                RenamedKey::Path(path) => set_path(&mut object, &path, value),
            }
        }

        Ok(object)
    }

    fn format_field(
        &self,
        raw: &Value,
        key: &str,
        containing: &Value,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Option<Value>> {
        if let Some(custom) = self.coercer.custom(raw, Some(key), Some(containing), options) {
            return Ok(Some(custom));
        }

        match raw {
            Value::Object(fields) => self.format_object(fields, context, options).map(Some),
            Value::Array(items) if items.iter().any(Value::is_structured) => {
                let mut formatted = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(item) =
                        self.format_field(item, key, containing, context, options)?
                    {
                        formatted.push(item);
                    }
                }
                Ok(Some(Value::Array(formatted)))
            }
            other => self
                .coercer
                .coerce(other, Some(key), Some(containing), context, options),
        }
    }
}
