//! Error taxonomy for the unfolder
//!
//! Every fatal condition of a single unfold/translate request is one of these
//! variants. Missing evidence for a vulnerability template is *not* an error:
//! the property compiler answers it with a vacuous or falsified property.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, compiling or merging nets
#[derive(Debug, Error)]
pub enum Error {
    /// The property request names a template outside the supported set
    #[error("template `{name}` is not handled by the property compiler")]
    UnsupportedTemplate { name: String },

    /// A required key is absent from one of the JSON inputs
    #[error("missing field `{field}` in {context}")]
    MissingField { field: String, context: String },

    /// Checked access past the end of a net container
    #[error("index {index} out of range for {collection} (len {len})")]
    StructuralIndex {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    /// A field is present but its value cannot be used
    #[error("invalid value `{value}` for `{field}`: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// LNA text could not be turned into a net
    #[error("LNA parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Malformed JSON input
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A text pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Build a `MissingField` error
    pub fn missing(field: impl Into<String>, context: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Decode a JSON document, surfacing serde's "missing field" failures as
    /// `MissingField` so callers see one taxonomy at the JSON boundary.
    pub fn from_json<T>(text: &str, context: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str(text).map_err(|e| {
            let message = e.to_string();
            match missing_field_name(&message) {
                Some(field) => Error::missing(field, context),
                None => Error::Json(e),
            }
        })
    }
}

/// Extract the field name from serde's "missing field `name`" message
fn missing_field_name(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
