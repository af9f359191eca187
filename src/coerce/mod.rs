pub mod options;
pub mod syntax;

pub use options::{FormatOptions, Hook, NumberParsing};
pub use syntax::{Capabilities, Syntax, classify, js_parse_float};

use crate::context::TestContext;
use crate::expr;
use crate::failure::{Failure, Result};
use crate::resolve::{EntityReference, EntityResolverRegistry};
use crate::time;
use crate::value::{Value, stringify};

/// Turns one raw cell into a typed value. `Ok(None)` means the key is
/// dropped from the formatted result.
#[derive(Debug, Clone, Copy)]
pub struct Coercer<'r> {
    registry: &'r EntityResolverRegistry,
}

impl<'r> Coercer<'r> {
    pub fn new(registry: &'r EntityResolverRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r EntityResolverRegistry {
        self.registry
    }

    pub fn coerce(
        &self,
        raw: &Value,
        key: Option<&str>,
        containing: Option<&Value>,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Option<Value>> {
        if let Some(custom) = self.custom(raw, key, containing, options) {
            return Ok(Some(custom));
        }

        match raw {
            Value::Array(items) => {
                let mut coerced = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(item) = self.coerce(item, key, containing, context, options)? {
                        coerced.push(item);
                    }
                }
                Ok(Some(Value::Array(coerced)))
            }
            Value::String(text) => self.coerce_text(text, key, containing, context, options),
            other if options.exclude_falsey && !other.is_truthy() => Ok(None),
            other => Ok(Some(other.clone())),
        }
    }

    pub(crate) fn custom(
        &self,
        raw: &Value,
        key: Option<&str>,
        containing: Option<&Value>,
        options: &FormatOptions,
    ) -> Option<Value> {
        let hook = options.custom.as_ref()?;
        let empty = Value::object();
        (hook.0)(raw, key.unwrap_or_default(), containing.unwrap_or(&empty))
    }

    fn coerce_text(
        &self,
        text: &str,
        key: Option<&str>,
        containing: Option<&Value>,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Option<Value>> {
        let capabilities = Capabilities {
            has_context: context.is_some(),
            can_resolve_entities: key.is_some() && containing.is_some() && context.is_some(),
        };

        let syntax = classify(text, key, options, capabilities);
        tracing::trace!(key = key.unwrap_or_default(), input = text, ?syntax, "classified value");

        let coerced = match syntax {
            Syntax::Currency(amount) | Syntax::Number(amount) => Value::Number(amount),
            Syntax::IntegerDate(instant) => Value::Date(instant),
            Syntax::Date => time::coerce_date(text, context)
                .map_or_else(|| Value::String(text.to_owned()), Value::Date),
            Syntax::Boolean(flag) => Value::Bool(flag),
            Syntax::Expression => {
                let Some(context) = context else {
                    return Ok(Some(Value::String(text.to_owned())));
                };
                return interpolate_expressions(text, context);
            }
            Syntax::Json => return self.coerce_json(text, key, containing, context, options),
            Syntax::EntityReference => {
                let (Some(key), Some(containing), Some(context)) = (key, containing, context) else {
                    return Ok(Some(Value::String(text.to_owned())));
                };
                self.resolve_references(text, key, containing, context)?
            }
            Syntax::ExcludedMinus => return Ok(None),
            Syntax::Plus => Value::object(),
            Syntax::NullMinus => Value::Null,
            Syntax::Quoted(inner) => Value::String(inner.to_owned()),
            Syntax::Plain => {
                if (options.exclude_falsey && text.is_empty())
                    || (options.exclude_empty && text.is_empty())
                {
                    return Ok(None);
                }
                Value::String(text.to_owned())
            }
        };

        Ok(Some(coerced))
    }

    fn coerce_json(
        &self,
        text: &str,
        key: Option<&str>,
        containing: Option<&Value>,
        context: Option<&TestContext>,
        options: &FormatOptions,
    ) -> Result<Option<Value>> {
        let parsed = match json5::from_str::<serde_json::Value>(text) {
            Ok(parsed) => Value::from(parsed),
            Err(error) => {
                tracing::warn!(
                    key = key.unwrap_or_default(),
                    input = text,
                    "could not parse JSON value: {error}"
                );
                return Ok(Some(Value::String(text.to_owned())));
            }
        };

        match parsed {
            Value::Array(_) => self.coerce(&parsed, key, containing, context, options),
            other => Ok(Some(other)),
        }
    }

    /// A whole-string reference yields the resolved value itself; keyed
    /// references inside longer text are substituted as text.
    pub fn resolve_references(
        &self,
        text: &str,
        key: &str,
        containing: &Value,
        context: &TestContext,
    ) -> Result<Value> {
        if let Some(reference) = EntityReference::parse(text) {
            return self.registry.resolve(key, &reference, context, containing);
        }

        let mut substituted = String::with_capacity(text.len());
        let mut cursor = 0;
        for (range, reference) in EntityReference::find_embedded(text) {
            let resolved = self.registry.resolve(key, &reference, context, containing)?;
            substituted.push_str(&text[cursor..range.start]);
            substituted.push_str(&resolved.to_display_string());
            cursor = range.end;
        }
        substituted.push_str(&text[cursor..]);

        Ok(Value::String(substituted))
    }
}

/// `{{expr}}` spanning the whole text keeps the expression's type; spans
/// inside longer text are rendered and spliced in.
fn interpolate_expressions(text: &str, context: &TestContext) -> Result<Option<Value>> {
    let scope = context.scope();
    let spans = syntax::expression_spans(text);

    if let [(range, source)] = spans.as_slice()
        && range.start == 0
        && range.end == text.len()
    {
        return evaluate(source, &scope);
    }

    let mut rendered = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, source) in spans {
        rendered.push_str(&text[cursor..range.start]);
        let result = evaluate(source, &scope)?;
        rendered.push_str(
            &result.map_or_else(|| "undefined".to_owned(), |value| value.to_display_string()),
        );
        cursor = range.end;
    }
    rendered.push_str(&text[cursor..]);

    Ok(Some(Value::String(rendered)))
}

fn evaluate(source: &str, scope: &Value) -> Result<Option<Value>> {
    let result = expr::evaluate(source, scope)?;
    tracing::debug!(
        expression = source,
        result = %stringify(result.as_ref()),
        "evaluated expression"
    );
    Ok(result)
}

/// Coerce a standalone value: no key, no context, no resolvers.
pub fn coerce_value(raw: &Value, options: &FormatOptions) -> Result<Option<Value>> {
    let registry = EntityResolverRegistry::empty();
    Coercer::new(&registry).coerce(raw, None, None, None, options)
}

/// Strict boolean reading of a table cell.
pub fn parse_boolean(text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        other => Err(Failure::validation(format!("\"{other}\" is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use chrono::{TimeZone, Utc};

    fn coerce(raw: &str, options: &FormatOptions) -> Option<Value> {
        coerce_value(&Value::from(raw), options).expect("coerce")
    }

    fn colors() -> EntityResolverRegistry {
        let mut registry = EntityResolverRegistry::new();
        registry.register(["color", "colors"], |name, context, _containing| {
            context.data.get("colors").and_then(|colors| colors.child(name)).cloned()
        });
        registry
    }

    fn context() -> TestContext {
        TestContext::new()
            .with_data("colors", value!({"blue": {"_id": "B"}, "red": {"_id": "R", "hex": "f00"}}))
            .with_data("answer", Value::Number(42.0))
    }

    #[test]
    fn currency_becomes_cents_by_default() {
        assert_eq!(coerce("$12.34", &FormatOptions::default()), Some(Value::Number(1234.0)));
        let dollars = FormatOptions {
            currency_to_cents: false,
            ..FormatOptions::default()
        };
        assert_eq!(coerce("$12.34", &dollars), Some(Value::Number(12.34)));
    }

    #[test]
    fn scalar_rules_follow_parse_all() {
        let options = FormatOptions::default();
        assert_eq!(coerce("-3.5", &options), Some(Value::Number(-3.5)));
        assert_eq!(coerce("true", &options), Some(Value::Bool(true)));
        assert_eq!(coerce("-", &options), Some(Value::Null));
        assert_eq!(coerce("+", &options), Some(Value::object()));
        assert_eq!(coerce(r#""42""#, &options), Some(Value::from("42")));
        assert_eq!(coerce("42", &FormatOptions::none()), Some(Value::from("42")));
    }

    #[test]
    fn dates_are_parsed_in_their_zone() {
        let expected = Utc.with_ymd_and_hms(2017, 1, 1, 8, 0, 0).single().expect("instant");
        assert_eq!(
            coerce("[Asia/Jerusalem] 2017-01-01 10:00", &FormatOptions::default()),
            Some(Value::Date(expected))
        );
        let utc = Utc.with_ymd_and_hms(2017, 1, 1, 10, 0, 0).single().expect("instant");
        assert_eq!(
            coerce("2017-01-01T10:00:00Z", &FormatOptions::default()),
            Some(Value::Date(utc))
        );
    }

    #[test]
    fn exclusions_drop_the_key() {
        let options = FormatOptions {
            exclude_minuses: true,
            exclude_empty: true,
            ..FormatOptions::default()
        };
        assert_eq!(coerce("-", &options), None);
        assert_eq!(coerce("", &options), None);

        let falsey = FormatOptions {
            exclude_falsey: true,
            ..FormatOptions::default()
        };
        assert_eq!(coerce_value(&Value::Bool(false), &falsey).expect("coerce"), None);
        assert_eq!(coerce_value(&Value::Number(0.0), &falsey).expect("coerce"), None);
    }

    #[test]
    fn non_strings_pass_through() {
        let options = FormatOptions::default();
        assert_eq!(
            coerce_value(&Value::Number(12.0), &options).expect("coerce"),
            Some(Value::Number(12.0))
        );
        let nested = value!({"a": "1"});
        assert_eq!(coerce_value(&nested, &options).expect("coerce"), Some(nested.clone()));
    }

    #[test]
    fn json_arrays_are_coerced_element_wise() {
        let registry = colors();
        let context = context();
        let coerced = Coercer::new(&registry)
            .coerce(
                &Value::from(r#"["(blue)._id", "(red)._id", 7]"#),
                Some("colors"),
                Some(&Value::object()),
                Some(&context),
                &FormatOptions::default(),
            )
            .expect("coerce");
        assert_eq!(coerced, Some(value!(["B", "R", 7])));
    }

    #[test]
    fn broken_json_is_kept_as_text() {
        assert_eq!(
            coerce("{not: json,,}", &FormatOptions::default()),
            Some(Value::from("{not: json,,}"))
        );
    }

    #[test]
    fn expressions_keep_their_type_or_interpolate() {
        let registry = colors();
        let context = context();
        let coercer = Coercer::new(&registry);
        let options = FormatOptions::default();

        let whole = coercer
            .coerce(&Value::from("{{this.answer + 1}}"), Some("n"), None, Some(&context), &options)
            .expect("coerce");
        assert_eq!(whole, Some(Value::Number(43.0)));

        let template = Value::from("answer={{this.answer}}!");
        let embedded = coercer
            .coerce(&template, Some("n"), None, Some(&context), &options)
            .expect("coerce");
        assert_eq!(embedded, Some(Value::from("answer=42!")));
    }

    #[test]
    fn resolves_whole_and_embedded_references() {
        let registry = colors();
        let context = context();
        let coercer = Coercer::new(&registry);
        let containing = Value::object();

        assert_eq!(
            coercer
                .resolve_references(r#""red".hex"#, "color", &containing, &context)
                .expect("resolve"),
            Value::from("f00")
        );
        assert_eq!(
            coercer
                .resolve_references("/^#[color](red).hex$/", "other", &containing, &context)
                .expect("resolve"),
            Value::from("/^#f00$/")
        );
    }

    #[test]
    fn unresolvable_reference_fails() {
        let registry = colors();
        let context = context();
        let error = Coercer::new(&registry)
            .coerce(
                &Value::from("(green)._id"),
                Some("color"),
                Some(&Value::object()),
                Some(&context),
                &FormatOptions::default(),
            )
            .expect_err("green is unknown");
        assert!(error.to_string().contains("green"));
    }

    #[test]
    fn custom_hook_wins() {
        let options = FormatOptions::default().custom(|raw, key, _containing| {
            (key == "secret").then(|| Value::from(format!("<{}>", raw.to_display_string())))
        });
        let registry = EntityResolverRegistry::empty();
        let coercer = Coercer::new(&registry);
        assert_eq!(
            coercer
                .coerce(&Value::from("12"), Some("secret"), None, None, &options)
                .expect("coerce"),
            Some(Value::from("<12>"))
        );
        assert_eq!(
            coercer
                .coerce(&Value::from("12"), Some("plain"), None, None, &options)
                .expect("coerce"),
            Some(Value::Number(12.0))
        );
    }

    #[test]
    fn parses_boolean_cells() {
        assert!(parse_boolean(" Yes ").expect("bool"));
        assert!(!parse_boolean("false").expect("bool"));
        assert!(parse_boolean("maybe").is_err());
    }
}
