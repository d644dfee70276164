//! Shotline Error Definitions
//!
//! Defines error types used throughout the pipeline.

use thiserror::Error;

use super::ClipIndex;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error(
        "You must be in an active timeline to create the publishable clips. \
         Go into a timeline and then reset the publisher."
    )]
    NoActiveTimeline,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No matching clips: {0}")]
    NoMatchingClips(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // =========================================================================
    // Naming Errors
    // =========================================================================
    #[error("Unknown token `{{{token}}}` in template `{template}`")]
    UnknownToken { token: String, template: String },

    // =========================================================================
    // Per-Item Errors
    // =========================================================================
    #[error("Could not retrieve resolution metadata for clip {clip_index}")]
    MissingResolution { clip_index: ClipIndex },

    #[error("Could not retrieve interchange clip for clip {0}")]
    InterchangeClipNotFound(ClipIndex),

    #[error("Corrupt annotation: {0}")]
    CorruptAnnotation(String),

    #[error("Clip not found: {0}")]
    ClipNotFound(ClipIndex),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Required precondition absent; fatal to the current run.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CoreError::NoActiveTimeline
                | CoreError::Configuration(_)
                | CoreError::NoMatchingClips(_)
                | CoreError::InvalidSettings(_)
        )
    }

    /// Data error scoped to one item; the rest of the batch keeps going.
    pub fn is_item_error(&self) -> bool {
        matches!(
            self,
            CoreError::MissingResolution { .. }
                | CoreError::InterchangeClipNotFound(_)
                | CoreError::CorruptAnnotation(_)
                | CoreError::ClipNotFound(_)
        )
    }

    /// Convert to a user-facing message for the invoking orchestrator
    pub fn to_user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(CoreError::NoActiveTimeline.is_configuration_error());
        assert!(CoreError::NoMatchingClips("x".into()).is_configuration_error());
        assert!(!CoreError::NoMatchingClips("x".into()).is_item_error());

        let missing = CoreError::MissingResolution { clip_index: 3 };
        assert!(missing.is_item_error());
        assert!(!missing.is_configuration_error());

        let token = CoreError::UnknownToken {
            token: "foo".into(),
            template: "{foo}".into(),
        };
        assert!(!token.is_item_error());
        assert!(!token.is_configuration_error());
    }

    #[test]
    fn test_unknown_token_message() {
        let err = CoreError::UnknownToken {
            token: "episode".into(),
            template: "{folder}/{episode}".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown token `{episode}` in template `{folder}/{episode}`"
        );
    }
}
