// Licensed under the Apache-2.0 license

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort device provisioning
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Operator supplied input is malformed or out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// The manufacturer key is missing, unreadable, or not a P-256 private key
    #[error("Failed to load private key {}: {cause:#}", .path.display())]
    KeyLoad { path: PathBuf, cause: anyhow::Error },

    /// The signing operation or its self-check failed
    #[error("Signing failed: {0:#}")]
    Signing(anyhow::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ProvisionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;
