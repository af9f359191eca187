use serde::Serialize;

/// Stable failure codes, one per error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureCode {
    /// Expected/actual mismatch raised through the assertion sink.
    #[serde(rename = "E_VALIDATION")]
    Validation,
    /// Missing resolver, unresolved entity, or missing path inside an entity.
    #[serde(rename = "E_RESOLUTION")]
    Resolution,
    /// Malformed fixture shape (headless merge over bad input, ragged tables).
    #[serde(rename = "E_STRUCTURAL")]
    Structural,
    /// `{{...}}` expression failed to parse or evaluate.
    #[serde(rename = "E_EXPRESSION")]
    Expression,
    /// Profile could not be read or deserialized.
    #[serde(rename = "E_CONFIG")]
    Config,
    /// Reading a table or stream failed.
    #[serde(rename = "E_IO")]
    Io,
}

impl FailureCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCode::Validation => "E_VALIDATION",
            FailureCode::Resolution => "E_RESOLUTION",
            FailureCode::Structural => "E_STRUCTURAL",
            FailureCode::Expression => "E_EXPRESSION",
            FailureCode::Config => "E_CONFIG",
            FailureCode::Io => "E_IO",
        }
    }

    /// Validation failures mark one test as failed; everything else aborts the step.
    pub fn is_recoverable(self) -> bool {
        matches!(self, FailureCode::Validation)
    }
}
