// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound queue for messages written while disconnected.
//!
//! Holds serialized protocol lines in caller order. On open, the session
//! drains the queue after the handshake; lines that could not be written
//! before a connection dropped are put back at the front.

use std::collections::VecDeque;

/// FIFO of serialized-but-unsent protocol lines.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    lines: VecDeque<String>,
}

impl OutboundQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line for later sending.
    pub fn push(&mut self, line: String) {
        self.lines.push_back(line);
    }

    /// Take every queued line, leaving the queue empty.
    pub fn drain(&mut self) -> VecDeque<String> {
        std::mem::take(&mut self.lines)
    }

    /// Put unsent lines back ahead of anything queued since.
    pub fn requeue_front(&mut self, mut unsent: VecDeque<String>) {
        unsent.append(&mut self.lines);
        self.lines = unsent;
    }

    /// Get the number of queued lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over queued lines in send order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}
