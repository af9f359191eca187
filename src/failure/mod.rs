pub mod codes;

pub use codes::FailureCode;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Failure>;

/// Everything the engine can raise.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("{message}")]
    Validation { message: String },

    #[error("Could not find value-resolver for key \"{key}\"")]
    MissingResolver { key: String },

    #[error("{key} value-resolver: Could not resolve entity \"{entity}\"")]
    UnresolvedEntity { key: String, entity: String },

    #[error("\"{entity}\": Path \"{path}\" not found in entity {rendered}")]
    MissingPath {
        entity: String,
        path: String,
        rendered: String,
    },

    #[error("mergeHeadless only supports sequences, found {found}")]
    NotASequence { found: String },

    #[error("mergeHeadless: found orphaned headless row: {row}")]
    OrphanedHeadlessRow { row: String },

    #[error("malformed table: {0}")]
    Table(String),

    #[error("expression `{expression}`: {message}")]
    Expression { expression: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Failure {
    pub fn validation(message: impl Into<String>) -> Self {
        Failure::Validation {
            message: message.into(),
        }
    }

    pub fn code(&self) -> FailureCode {
        match self {
            Failure::Validation { .. } => FailureCode::Validation,
            Failure::MissingResolver { .. }
            | Failure::UnresolvedEntity { .. }
            | Failure::MissingPath { .. } => FailureCode::Resolution,
            Failure::NotASequence { .. }
            | Failure::OrphanedHeadlessRow { .. }
            | Failure::Table(_) => FailureCode::Structural,
            Failure::Expression { .. } => FailureCode::Expression,
            Failure::Config(_) => FailureCode::Config,
            Failure::Io(_) => FailureCode::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_as_stable_strings() {
        let failure = Failure::MissingResolver {
            key: "data".to_owned(),
        };
        assert_eq!(failure.code(), FailureCode::Resolution);
        assert_eq!(
            serde_json::to_value(failure.code()).expect("serialize code"),
            serde_json::json!("E_RESOLUTION")
        );
        assert_eq!(failure.to_string(), "Could not find value-resolver for key \"data\"");
    }

    #[test]
    fn only_validation_is_recoverable() {
        assert!(Failure::validation("x").code().is_recoverable());
        assert!(!Failure::Config("bad".to_owned()).code().is_recoverable());
    }
}
