// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for session module tests.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use super::controller::CloudSession;
use super::listener::{ChannelListener, SessionEvent};
use super::transport_tests::{MockRemote, MockTransport};
use crate::config::{SessionConfig, SessionConfigBuilder};

pub const PROJECT: &str = "104";
pub const USER: &str = "tester";

/// A native config with one endpoint and a fixed username.
pub fn config_builder() -> SessionConfigBuilder {
    SessionConfig::builder()
        .endpoint("ws://cloud.test")
        .project_id(PROJECT)
        .username(USER)
        .user_agent("cloudvar-tests/1.0")
}

/// Start a session over a mock transport with a fixed backoff sample.
pub fn start(config: SessionConfig) -> (CloudSession, MockRemote, UnboundedReceiver<SessionEvent>) {
    let (transport, remote) = MockTransport::new();
    let (listener, events) = ChannelListener::new();
    let session = CloudSession::with_transport(config, transport, listener, || 0.5).unwrap();
    (session, remote, events)
}

/// Wait for the next event.
pub async fn next_event(events: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Let the session run for a while and return whatever it emitted.
pub async fn drain_events(events: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    tokio::time::sleep(Duration::from_secs(30)).await;
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// A server `set` push line.
pub fn push_line(name: &str, value: serde_json::Value) -> String {
    serde_json::json!({"method": "set", "name": name, "value": value}).to_string()
}
