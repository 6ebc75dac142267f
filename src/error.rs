//! Migration-specific error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("failed to apply {object}: {detail}")]
    ApplyFailed { object: String, detail: String },

    #[error("timeout waiting for claim {claim} to be bound after {timeout:?}")]
    BindTimeout { claim: String, timeout: Duration },

    #[error("claim {claim} reported Failed phase")]
    ClaimFailed { claim: String },

    #[error("migration pod failed: {pod}")]
    PodFailed { pod: String },

    #[error("timeout waiting for pod {pod} to complete after {timeout:?}")]
    PodTimeout { pod: String, timeout: Duration },

    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    #[error("control plane transport error: {message}")]
    Transport { message: String },

    #[error("no cluster nodes available")]
    NoNodes,

    #[error("no manifest file declares claim {claim}")]
    ManifestMissing { claim: String },

    #[error("invalid quantity: {input}")]
    InvalidQuantity { input: String },

    #[error("invalid size string: {input}")]
    InvalidSize { input: String },

    #[error("failed to read operator input: {message}")]
    PromptFailed { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    pub fn transport(message: impl Into<String>) -> Self {
        MigrateError::Transport {
            message: message.into(),
        }
    }

    /// Whether the engine may retry the operation on the next poll tick.
    /// Explicit failed phases and deadline expiry are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, MigrateError::Transport { .. } | MigrateError::NotFound { .. })
    }
}

pub type MigrateResult<T> = Result<T, MigrateError>;
