// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cv-core: Shared types for the cloud variable protocol.
//!
//! This crate provides the scalar value type, variable naming rules, and the
//! line-delimited JSON wire protocol used by the `cloudvar` client.

pub mod error;
pub mod protocol;
pub mod value;
pub mod variable;

pub use error::ProtocolError;
pub use protocol::{ClientMessage, CloseReason, ServerMessage};
pub use value::Value;
pub use variable::{normalize_name, strip_prefix, CLOUD_PREFIX};
