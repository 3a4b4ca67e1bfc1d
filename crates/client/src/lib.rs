// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client for cloud variables shared over line-delimited JSON on WebSocket.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use cloudvar::{CloudSession, NoopListener, SessionConfig};
//!
//! let config = SessionConfig::builder()
//!     .endpoint("wss://clouddata.example.org")
//!     .project_id(12345)
//!     .user_agent("my-bot/1.0 contact@example.org")
//!     .build()?;
//! let session = CloudSession::connect(config, NoopListener)?;
//! session.set("score", 10)?;
//! session.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod session;

pub use config::{ConfigFile, Platform, ProjectId, SessionConfig, SessionConfigBuilder};
pub use cv_core::{normalize_name, CloseReason, ProtocolError, Value, CLOUD_PREFIX};
pub use error::{ConfigError, ConfigResult, SessionError, SessionResult};
pub use session::{
    ChannelListener, CloudSession, NoopListener, SessionEvent, SessionListener, SessionStatus,
};
