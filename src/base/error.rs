//! Typed failures of the extraction pipeline.

use thiserror::Error;

/// Why an extraction failed.
///
/// `Template` is also what startup reports when a template cannot be loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    /// A template was missing, malformed, or failed to render.
    #[error("template error: {0}")]
    Template(String),

    /// The completion service call failed or timed out.
    #[error("completion error: {0}")]
    Completion(String),

    /// The model returned a date that is not RFC3339.
    #[error("could not parse date `{date}`: {source}")]
    DateParse {
        /// The offending value, verbatim.
        date: String,
        /// The underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// The payload could not be decoded at all (strict decoding only).
    #[error("could not decode event payload: {0}")]
    Decode(String),
}

impl From<tera::Error> for ExtractError {
    fn from(err: tera::Error) -> Self {
        // Tera hides the useful part of the message in the source chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);

        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }

        Self::Template(message)
    }
}
