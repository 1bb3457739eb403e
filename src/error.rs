//! Error kinds raised by the cost and model assembly pipeline.
//!
//! All of these indicate bad input data rather than transient conditions, so none are retried.
//! They are raised by the stage which first detects the problem and usually travel inside an
//! [`anyhow::Error`], from which they can be recovered with `downcast_ref`.
use thiserror::Error;

/// An error detected while preparing or solving a model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A named cross-reference (e.g. a fuel technology) could not be found
    #[error("Missing reference: {kind} {name} not found")]
    MissingReference {
        /// What sort of thing was referenced (e.g. "fuel technology")
        kind: &'static str,
        /// The name which could not be resolved
        name: String,
    },
    /// Units for a single technology disagree after normalisation
    #[error("Inconsistent units for technology {technology}: {message}")]
    InconsistentUnit {
        /// The offending technology
        technology: String,
        /// Description of the conflict
        message: String,
    },
    /// A time series does not line up with the model's snapshots
    #[error("Time series {profile} does not match snapshots: {message}")]
    ProfileLengthMismatch {
        /// The name of the profile
        profile: String,
        /// Description of the mismatch
        message: String,
    },
    /// A value lies outside its permitted domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The external solver did not return an optimal solution
    #[error("Solve failed with status: {0}")]
    SolveFailed(String),
}

impl PipelineError {
    /// Shorthand for a [`PipelineError::MissingReference`]
    pub fn missing(kind: &'static str, name: impl Into<String>) -> Self {
        Self::MissingReference {
            kind,
            name: name.into(),
        }
    }
}
