use crate::coerce::FormatOptions;
use serde::Deserialize;

/// How [`Verifier::verify_set_includes`](super::Verifier::verify_set_includes) searches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    /// Coerce expected entries (minus as null, references, expressions) before matching.
    pub format_subset: bool,
    /// Expected arrays must match actual entries at the same positions.
    pub strict_order: bool,
    /// Strip `link`/`LINK` from expected entries and save the matches under that name.
    pub save_links: bool,
    /// Drop null fields from expected entries before matching.
    pub ignore_nulls: bool,
    /// Prefixed to every failure as `message -- ...`.
    pub message: Option<String>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            format_subset: true,
            strict_order: false,
            save_links: false,
            ignore_nulls: false,
            message: None,
        }
    }
}

impl VerifyOptions {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

impl From<&str> for VerifyOptions {
    fn from(message: &str) -> Self {
        Self::with_message(message)
    }
}

/// Options for the table-driven verifiers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableVerifyOptions {
    /// Failure message when the actual collection is missing.
    pub expected_collection_name: Option<String>,
    /// Require as many actual entries as table rows.
    pub validate_count: bool,
    pub message: Option<String>,
    pub format: FormatOptions,
    pub verify: VerifyOptions,
}
