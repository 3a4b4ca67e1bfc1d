// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for protocol parsing.

use thiserror::Error;

/// Violations of the wire protocol found in server frames.
///
/// Every variant is terminal for the session that received it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Received invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Received invalid object")]
    InvalidObject,

    #[error("Received invalid name")]
    InvalidName,

    #[error("Received invalid value")]
    InvalidValue,
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
