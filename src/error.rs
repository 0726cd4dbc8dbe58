//! Crate-wide error taxonomy for definition parsing and resolution.

use thiserror::Error;

/// Errors surfaced by the definition resolution engine.
///
/// `NotFound` is an expected outcome: lookups return `None` internally and
/// only the query layer upgrades absence to this variant.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Malformed or incomplete document: a required field or block is missing.
    #[error("parse error: {0}")]
    Parse(String),

    /// A required document could not be read. Propagated unmodified.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Variable resolution exceeded the recursion depth bound. Always fatal:
    /// it signals an authoring bug such as a circular configuration reference.
    #[error("variable resolution depth exceeded while resolving '{input}'")]
    Resolution { input: String },

    /// A named agent or workflow does not exist under the definitions root.
    #[error("{0}")]
    NotFound(String),
}

impl DefinitionError {
    /// Shorthand for a `Parse` error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
