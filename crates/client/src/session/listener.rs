// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Event delivery from a session to its owner.
//!
//! Callbacks run on the session's driver task, strictly in the order the
//! underlying frames arrived. They may call back into the session.

use tokio::sync::mpsc;

use cv_core::Value;

use crate::error::SessionError;

/// Receives session events. Every method defaults to doing nothing.
pub trait SessionListener: Send + Sync + 'static {
    /// The handshake was sent and queued writes were flushed.
    fn connected(&self) {}

    /// The connection dropped and a reconnect is scheduled.
    fn reconnecting(&self) {}

    /// The server pushed a new value.
    fn set(&self, name: &str, value: &Value) {
        let _ = (name, value);
    }

    /// The session hit a terminal failure and is closed.
    fn error(&self, err: &SessionError) {
        let _ = err;
    }
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SessionListener for NoopListener {}

/// A session event, as delivered by [`ChannelListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connected,
    Reconnecting,
    Set { name: String, value: Value },
    Error(SessionError),
}

/// Forwards events into an unbounded channel.
///
/// Events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelListener { tx }, rx)
    }

    fn forward(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl SessionListener for ChannelListener {
    fn connected(&self) {
        self.forward(SessionEvent::Connected);
    }

    fn reconnecting(&self) {
        self.forward(SessionEvent::Reconnecting);
    }

    fn set(&self, name: &str, value: &Value) {
        self.forward(SessionEvent::Set {
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn error(&self, err: &SessionError) {
        self.forward(SessionEvent::Error(err.clone()));
    }
}
