// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is line-delimited JSON:
//! - Client sends a handshake once per connection, then `set` writes
//! - Server pushes `set` updates made by any client of the project
//!
//! A single text frame may carry several messages separated by `\n`.

use std::fmt;

use serde::Serialize;

use crate::error::{ProtocolError, Result};
use crate::value::Value;

/// Close code used when the connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code: the username was rejected.
pub const CLOSE_INVALID_USERNAME: u16 = 4002;

/// Close code: cloud variables are disabled for this project.
pub const CLOSE_PROJECT_UNAVAILABLE: u16 = 4004;

/// Close code: the user-agent was missing or rejected.
pub const CLOSE_INVALID_USER_AGENT: u16 = 4006;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message on every connection, identifying project and user.
    Handshake { project_id: String, user: String },

    /// Write a variable. The server relays it to the other clients.
    Set {
        project_id: String,
        user: String,
        name: String,
        value: Value,
    },
}

impl ClientMessage {
    /// Creates a Handshake message.
    pub fn handshake(project_id: impl Into<String>, user: impl Into<String>) -> Self {
        ClientMessage::Handshake {
            project_id: project_id.into(),
            user: user.into(),
        }
    }

    /// Creates a Set message.
    pub fn set(
        project_id: impl Into<String>,
        user: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        ClientMessage::Set {
            project_id: project_id.into(),
            user: user.into(),
            name: name.into(),
            value,
        }
    }

    /// Serializes the message to a single JSON line (without the newline).
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// A variable was updated.
    Set { name: String, value: Value },

    /// A message with a method this client does not understand.
    ///
    /// Kept rather than rejected so newer servers can add methods.
    Other { method: Option<String> },
}

impl ServerMessage {
    /// Parses and validates one line of a server frame.
    pub fn from_line(line: &str) -> Result<Self> {
        let parsed: serde_json::Value =
            serde_json::from_str(line).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        let object = parsed.as_object().ok_or(ProtocolError::InvalidObject)?;

        match object.get("method").and_then(serde_json::Value::as_str) {
            Some("set") => {
                let name = object
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .ok_or(ProtocolError::InvalidName)?;
                let value = object
                    .get("value")
                    .ok_or(ProtocolError::InvalidValue)
                    .and_then(Value::try_from)?;
                Ok(ServerMessage::Set {
                    name: name.to_string(),
                    value,
                })
            }
            method => Ok(ServerMessage::Other {
                method: method.map(str::to_string),
            }),
        }
    }
}

/// Parses every message in a text frame.
///
/// Blank lines are skipped so trailing newlines are harmless. The first
/// invalid line fails the whole frame; no partial result is returned.
pub fn parse_frame(text: &str) -> Result<Vec<ServerMessage>> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(ServerMessage::from_line)
        .collect()
}

/// Close codes that end a session permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    InvalidUsername,
    ProjectUnavailable,
    InvalidUserAgent,
}

impl CloseReason {
    /// Classifies a close code. `None` means the close is transient.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            CLOSE_INVALID_USERNAME => Some(CloseReason::InvalidUsername),
            CLOSE_PROJECT_UNAVAILABLE => Some(CloseReason::ProjectUnavailable),
            CLOSE_INVALID_USER_AGENT => Some(CloseReason::InvalidUserAgent),
            _ => None,
        }
    }

    /// The close code the server sends for this reason.
    pub fn code(self) -> u16 {
        match self {
            CloseReason::InvalidUsername => CLOSE_INVALID_USERNAME,
            CloseReason::ProjectUnavailable => CLOSE_PROJECT_UNAVAILABLE,
            CloseReason::InvalidUserAgent => CLOSE_INVALID_USER_AGENT,
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::InvalidUsername => f.write_str("username is invalid"),
            CloseReason::ProjectUnavailable => {
                f.write_str("cloud variables are disabled for this project")
            }
            CloseReason::InvalidUserAgent => f.write_str("user-agent is invalid"),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
