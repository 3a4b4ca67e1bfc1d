// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session configuration.
//!
//! A [`SessionConfig`] is immutable once built. It can be assembled in code
//! with [`SessionConfig::builder`] or loaded from a TOML file:
//!
//! ```toml
//! endpoints = ["wss://clouddata.example.org"]
//! project_id = 12345
//! username = "player0042"
//! user_agent = "my-bot/1.0 contact@example.org"
//! platform = "native"
//! ```
//!
//! Loosely typed fields in the file are checked when the builder is created,
//! so a boolean project id is reported as a configuration error rather than
//! a parse failure.

use std::fs;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use cv_core::Value;

use crate::error::{ConfigError, ConfigResult};

/// Where the client runs.
///
/// Native clients must identify themselves with a user agent. Browser
/// clients cannot set that header, so any configured value is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Native,
    Browser,
}

/// A project identifier, always held in string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        ProjectId(id.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        ProjectId(id)
    }
}

impl From<i32> for ProjectId {
    fn from(id: i32) -> Self {
        ProjectId(id.to_string())
    }
}

impl From<u32> for ProjectId {
    fn from(id: u32) -> Self {
        ProjectId(id.to_string())
    }
}

impl From<i64> for ProjectId {
    fn from(id: i64) -> Self {
        ProjectId(id.to_string())
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        ProjectId(id.to_string())
    }
}

impl TryFrom<&serde_json::Value> for ProjectId {
    type Error = ConfigError;

    fn try_from(value: &serde_json::Value) -> ConfigResult<Self> {
        match value {
            serde_json::Value::String(s) => Ok(ProjectId(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ProjectId(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Ok(ProjectId(u.to_string()))
                } else {
                    // Format fractional ids the same way values are formatted
                    let f = n.as_f64().ok_or(ConfigError::InvalidProjectId("number"))?;
                    Ok(ProjectId(Value::Number(f).to_string()))
                }
            }
            other => Err(ConfigError::InvalidProjectId(json_kind(other))),
        }
    }
}

/// Validated, immutable session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    endpoints: Vec<String>,
    project_id: String,
    username: String,
    user_agent: Option<String>,
    platform: Platform,
}

impl SessionConfig {
    /// Start building a configuration.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Candidate endpoints, tried round-robin. Never empty.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The user agent to send, or `None` on the browser platform.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    endpoints: Vec<String>,
    project_id: Option<ProjectId>,
    username: Option<String>,
    user_agent: Option<String>,
    platform: Platform,
}

impl SessionConfigBuilder {
    /// Add a candidate endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoints.push(url.into());
        self
    }

    /// Replace the candidate endpoints.
    pub fn endpoints<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn project_id(mut self, id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// A username is generated when none was given.
    pub fn build(self) -> ConfigResult<SessionConfig> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        if let Some(bad) = self
            .endpoints
            .iter()
            .find(|url| !url.starts_with("ws://") && !url.starts_with("wss://"))
        {
            return Err(ConfigError::InvalidEndpoint(bad.clone()));
        }
        for url in &self.endpoints {
            url.as_str()
                .into_client_request()
                .map_err(|e| ConfigError::MalformedEndpoint {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
        }

        let project_id = self.project_id.ok_or(ConfigError::MissingProjectId)?;
        if project_id.as_str().is_empty() {
            return Err(ConfigError::EmptyProjectId);
        }

        let user_agent = match self.platform {
            Platform::Native => match self.user_agent {
                Some(ua) if !ua.trim().is_empty() => {
                    HeaderValue::from_str(&ua)
                        .map_err(|_| ConfigError::UnsendableUserAgent(ua.clone()))?;
                    Some(ua)
                }
                _ => return Err(ConfigError::MissingUserAgent),
            },
            Platform::Browser => None,
        };

        Ok(SessionConfig {
            endpoints: self.endpoints,
            project_id: project_id.0,
            username: self.username.unwrap_or_else(generate_username),
            user_agent,
            platform: self.platform,
        })
    }
}

/// Returns a default username of the form `player` + 4 digits.
pub fn generate_username() -> String {
    format!("player{:04}", rand::thread_rng().gen_range(0..10_000))
}

/// Configuration as written in a file, before type checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub project_id: Option<serde_json::Value>,
    #[serde(default)]
    pub username: Option<serde_json::Value>,
    #[serde(default)]
    pub user_agent: Option<serde_json::Value>,
    #[serde(default)]
    pub platform: Platform,
}

impl ConfigFile {
    /// Loads a configuration file from disk.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Type-checks the loose fields and returns a builder seeded with them.
    pub fn into_builder(self) -> ConfigResult<SessionConfigBuilder> {
        let mut builder = SessionConfig::builder()
            .endpoints(self.endpoints)
            .platform(self.platform);

        if let Some(id) = &self.project_id {
            builder = builder.project_id(ProjectId::try_from(id)?);
        }
        if let Some(username) = self.username {
            match username {
                serde_json::Value::String(s) => builder = builder.username(s),
                other => return Err(ConfigError::InvalidUsername(json_kind(&other))),
            }
        }
        if let Some(user_agent) = self.user_agent {
            match user_agent {
                serde_json::Value::String(s) => builder = builder.user_agent(s),
                other => return Err(ConfigError::InvalidUserAgent(json_kind(&other))),
            }
        }

        Ok(builder)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
