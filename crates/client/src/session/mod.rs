// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud variable sessions.
//!
//! A session keeps one project's variables in sync with a cloud server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Session    │────►│  Transport  │────►│   Cloud     │
//! │(CloudSession)│◄────│   (trait)   │◄────│   Server    │
//! └──────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ├──────────────────┐
//!        ▼                  ▼
//! ┌─────────────┐    ┌─────────────┐
//! │   Queue     │    │   Store     │
//! │ (outbound)  │    │ (values)    │
//! └─────────────┘    └─────────────┘
//! ```
//!
//! # Features
//!
//! - Handshake on every connection, followed by a flush of queued writes
//! - Writes made while disconnected are queued in order
//! - Randomized reconnect delay with a growing ceiling
//! - Round-robin across candidate endpoints
//! - Injectable transport trait for testing

pub mod backoff;
mod controller;
mod listener;
mod queue;
mod store;
mod transport;

pub use backoff::{RandomSource, ThreadRandom};
pub use controller::{CloudSession, SessionStatus};
pub use listener::{ChannelListener, NoopListener, SessionEvent, SessionListener};
pub use queue::OutboundQueue;
pub use store::VariableStore;
pub use transport::{Frame, Transport, TransportError, TransportResult, WebSocketTransport};

#[cfg(test)]
mod test_helpers;





#[cfg(test)]
mod transport_tests;
