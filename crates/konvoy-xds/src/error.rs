//! Generator error types
//!
//! Error text is part of the operator-facing contract: the
//! `raw.resources[<i>]{name="<name>"}.resource:` and
//! `sources[<i>]{name="<name>"}:` prefixes are rendered verbatim by the CLI
//! and API server, so their shape must stay stable.

use thiserror::Error;

/// Errors produced while generating resources for a proxy
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A template referenced a profile that is not registered
    #[error("unknown profile: {name}")]
    UnknownProfile {
        /// Requested profile name
        name: String,
    },

    /// A literal resource could not be decoded or failed validation
    #[error("raw.resources[{index}]{{name=\"{name}\"}}.resource: {cause}")]
    RawResource {
        /// Position of the resource in the raw source
        index: usize,
        /// Name declared for the resource
        name: String,
        /// What was wrong with it
        cause: String,
    },

    /// A template source failed; wraps the source's own error
    #[error("sources[{index}]{{name=\"{name}\"}}: {source}")]
    Source {
        /// Position of the source in the template
        index: usize,
        /// Name declared for the source
        name: String,
        /// Underlying failure
        source: Box<GenerateError>,
    },

    /// A template source set neither or both of `profile` and `raw`
    #[error("source must set exactly one of `profile` or `raw`")]
    InvalidSource,

    /// A TrafficPermission selector lacks the service identity tag
    #[error(
        "traffic permission {permission}: rules[{rule}].sources[{selector}] is missing the {key:?} tag"
    )]
    MissingTag {
        /// Qualified name of the permission
        permission: String,
        /// Rule index within the permission
        rule: usize,
        /// Selector index within the rule's sources
        selector: usize,
        /// Tag key that was expected
        key: String,
    },

    /// The dataplane itself is malformed
    #[error("dataplane {dataplane}: {source}")]
    Dataplane {
        /// Qualified name of the dataplane
        dataplane: String,
        /// Validation failure
        source: konvoy_common::Error,
    },

    /// A generator in a composite pipeline failed
    #[error("generator[{position}] {generator}: {source}")]
    Generator {
        /// Position of the generator in the pipeline
        position: usize,
        /// Name of the failing generator
        generator: String,
        /// Underlying failure
        source: Box<GenerateError>,
    },

    /// Any other generator failure
    #[error("{message}")]
    Internal {
        /// Description of what failed
        message: String,
    },
}

impl GenerateError {
    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
        }
    }

    /// Whether the user's declarative input caused this error.
    ///
    /// Configuration errors are surfaced verbatim and never retried; wrapped
    /// errors are classified by their innermost cause.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::UnknownProfile { .. }
            | Self::RawResource { .. }
            | Self::InvalidSource
            | Self::MissingTag { .. }
            | Self::Dataplane { .. } => true,
            Self::Source { source, .. } | Self::Generator { source, .. } => {
                source.is_configuration_error()
            }
            Self::Internal { .. } => false,
        }
    }
}

impl From<GenerateError> for konvoy_common::Error {
    fn from(err: GenerateError) -> Self {
        if err.is_configuration_error() {
            konvoy_common::Error::validation(err.to_string())
        } else {
            konvoy_common::Error::internal_with_context("generator", err.to_string())
        }
    }
}
