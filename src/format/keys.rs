use crate::coerce::FormatOptions;
use heck::ToLowerCamelCase;
use regex::Regex;
use std::sync::LazyLock;

static BRACKET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*\]$").expect("valid bracket-suffix regex"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(.*)"$"#).expect("valid quoted-key regex"));

/// Where a renamed key lands in the formatted object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenamedKey {
    /// Set as one key, dots and brackets included.
    Literal(String),
    /// Set as a path: `a.b` nests, `items.0` builds arrays.
    Path(String),
}

impl RenamedKey {
    pub fn as_str(&self) -> &str {
        match self {
            RenamedKey::Literal(key) | RenamedKey::Path(key) => key,
        }
    }
}

pub fn rename_key(key: &str, options: &FormatOptions) -> RenamedKey {
    if let Some(hook) = &options.key_formatter
        && let Some(formatted) = (hook.0)(key).filter(|formatted| !formatted.is_empty())
    {
        return RenamedKey::Path(formatted);
    }

    if let Some(inner) = unquote(key) {
        return RenamedKey::Literal(inner.to_owned());
    }

    if !options.camel_case && options.key_part_formatter.is_none() {
        return RenamedKey::Path(key.to_owned());
    }

    let renamed = key
        .split('.')
        .map(|part| rename_part(part, options))
        .collect::<Vec<_>>()
        .join(".");
    RenamedKey::Path(renamed)
}

fn rename_part(part: &str, options: &FormatOptions) -> String {
    let (base, suffix) = match BRACKET_SUFFIX.find(part) {
        Some(found) => part.split_at(found.start()),
        None => (part, ""),
    };

    if let Some(inner) = unquote(base) {
        return inner.to_owned();
    }

    let mut renamed = match &options.key_part_formatter {
        Some(hook) => (hook.0)(base),
        None => {
            let camel = base.to_lower_camel_case();
            if base.starts_with('_') {
                format!("_{camel}")
            } else {
                camel
            }
        }
    };
    renamed.push_str(suffix);

    if options.capitalize {
        capitalize(&renamed)
    } else {
        renamed
    }
}

fn unquote(text: &str) -> Option<&str> {
    QUOTED
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
}

/// First character upper case, the rest lower case.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
