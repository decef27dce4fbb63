use thiserror::Error;

/// Errors produced when constructing or parsing foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid archetype id `{0}`: expected `profile/name`")]
    InvalidArchetypeId(String),

    #[error("invalid class tag `{0}`")]
    InvalidClassTag(String),

    #[error("invalid trace type `{0}`: must be non-empty and contain no whitespace")]
    InvalidTraceType(String),

    #[error("value `{value}` is not one of the labels {labels:?}")]
    InvalidEnumValue { value: String, labels: Vec<String> },

    #[error("invalid asset path `{0}`: must be relative and stay inside the asset store")]
    InvalidAssetPath(String),
}
