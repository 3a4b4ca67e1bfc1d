// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for configuration and sessions.
//!
//! Errors are cloneable so a terminal failure can be both delivered to the
//! session listener and returned to the caller.

use thiserror::Error;

use cv_core::{CloseReason, ProtocolError};

/// Errors found while building a session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no server endpoints configured\n  hint: pass at least one ws:// or wss:// URL")]
    NoEndpoints,

    #[error("invalid endpoint '{0}'\n  hint: endpoints must start with ws:// or wss://")]
    InvalidEndpoint(String),

    #[error("malformed endpoint '{url}': {message}")]
    MalformedEndpoint { url: String, message: String },

    #[error("project id is required")]
    MissingProjectId,

    #[error("project id must not be empty")]
    EmptyProjectId,

    #[error("project id must be a string or number, got {0}")]
    InvalidProjectId(&'static str),

    #[error("username must be a string, got {0}")]
    InvalidUsername(&'static str),

    #[error("user agent must be a string, got {0}")]
    InvalidUserAgent(&'static str),

    #[error("a user agent is required outside the browser\n  hint: set user_agent to something that identifies your project and a way to contact you")]
    MissingUserAgent,

    #[error("user agent {0:?} cannot be sent as a header\n  hint: use visible ASCII without line breaks")]
    UnsendableUserAgent(String),

    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Errors that end a session, or that are returned by its methods.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("server closed the connection: {0}")]
    Rejected(CloseReason),

    #[error("invalid value for variable '{name}': {reason}")]
    Validation { name: String, reason: String },

    #[error("session is closed")]
    Closed,

    #[error("no tokio runtime available: {0}")]
    Runtime(String),

    #[error("session task failed: {0}")]
    Driver(String),
}

impl SessionError {
    /// Returns true if this error ended the session.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionError::Closed)
    }
}

/// A specialized Result type for configuration.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A specialized Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
