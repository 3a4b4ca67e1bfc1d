// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::transport::{Frame, Transport, TransportError, TransportResult, WebSocketTransport};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct MockState {
    /// Every connect attempt, with the user agent it carried.
    connects: Vec<(String, Option<String>)>,
    /// Text sent over any connection, in order.
    sent: Vec<String>,
    /// Number of upcoming connects to refuse.
    refuse: usize,
    /// Number of upcoming sends to fail.
    fail_sends: usize,
    /// Feeds frames into the current connection.
    inbound: Option<mpsc::UnboundedSender<Frame>>,
    disconnects: usize,
}

/// Mock transport for testing without real sockets.
///
/// Each successful connect opens a fresh inbound channel, driven through the
/// paired [`MockRemote`].
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    inbound: Option<mpsc::UnboundedReceiver<Frame>>,
}

/// The server side of a [`MockTransport`].
#[derive(Clone)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> (Self, MockRemote) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let transport = MockTransport {
            state: Arc::clone(&state),
            inbound: None,
        };
        (transport, MockRemote { state })
    }
}

impl MockRemote {
    /// Push a frame to the current connection. Returns false if none is open.
    pub fn push(&self, frame: Frame) -> bool {
        let state = self.state.lock().unwrap();
        match &state.inbound {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    pub fn push_text(&self, text: &str) -> bool {
        self.push(Frame::Text(text.to_string()))
    }

    /// Close the current connection with the given code.
    pub fn close(&self, code: u16) {
        let tx = self.state.lock().unwrap().inbound.take();
        if let Some(tx) = tx {
            let _ = tx.send(Frame::Close(Some(code)));
        }
    }

    /// Drop the current connection without a close frame.
    pub fn drop_connection(&self) {
        self.state.lock().unwrap().inbound = None;
    }

    pub fn refuse_connects(&self, n: usize) {
        self.state.lock().unwrap().refuse = n;
    }

    pub fn fail_sends(&self, n: usize) {
        self.state.lock().unwrap().fail_sends = n;
    }

    pub fn connects(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.connects.iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn user_agents(&self) -> Vec<Option<String>> {
        let state = self.state.lock().unwrap();
        state.connects.iter().map(|(_, ua)| ua.clone()).collect()
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Sent lines parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    /// Wait until at least `n` lines have been sent.
    pub async fn wait_for_sent(&self, n: usize) -> Vec<String> {
        tokio::time::timeout(Duration::from_secs(60), async {
            loop {
                let sent = self.sent();
                if sent.len() >= n {
                    return sent;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("timed out waiting for sent lines")
    }

    /// Wait until at least `n` connect attempts have been made.
    pub async fn wait_for_connects(&self, n: usize) -> Vec<String> {
        tokio::time::timeout(Duration::from_secs(60), async {
            loop {
                let connects = self.connects();
                if connects.len() >= n {
                    return connects;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("timed out waiting for connects")
    }
}

impl Transport for MockTransport {
    fn connect(
        &mut self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let url = url.to_string();
        let user_agent = user_agent.map(str::to_string);
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.connects.push((url, user_agent));
            if state.refuse > 0 {
                state.refuse -= 1;
                return Err(TransportError::ConnectionFailed("mock refusal".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            state.inbound = Some(tx);
            drop(state);
            self.inbound = Some(rx);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.disconnects += 1;
            state.inbound = None;
            drop(state);
            self.inbound = None;
            Ok(())
        })
    }

    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if self.inbound.is_none() {
                return Err(TransportError::ConnectionClosed);
            }
            let mut state = self.state.lock().unwrap();
            if state.fail_sends > 0 {
                state.fail_sends -= 1;
                state.inbound = None;
                drop(state);
                self.inbound = None;
                return Err(TransportError::SendFailed("mock failure".into()));
            }
            state.sent.push(text);
            Ok(())
        })
    }

    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Frame>> + Send + '_>> {
        Box::pin(async move {
            let rx = self.inbound.as_mut().ok_or(TransportError::ConnectionClosed)?;
            match rx.recv().await {
                Some(Frame::Close(code)) => {
                    self.inbound = None;
                    Ok(Frame::Close(code))
                }
                Some(frame) => Ok(frame),
                None => {
                    self.inbound = None;
                    Ok(Frame::Close(None))
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.inbound.is_some()
    }
}

#[tokio::test]
async fn test_mock_transport_connect() {
    let (mut transport, remote) = MockTransport::new();
    assert!(!transport.is_connected());

    transport
        .connect("ws://localhost:1234", Some("ua"))
        .await
        .unwrap();
    assert!(transport.is_connected());
    assert_eq!(remote.connects(), ["ws://localhost:1234"]);
    assert_eq!(remote.user_agents(), [Some("ua".to_string())]);

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
    assert_eq!(remote.disconnects(), 1);
}

#[tokio::test]
async fn test_mock_transport_send_recv() {
    let (mut transport, remote) = MockTransport::new();
    transport.connect("ws://localhost:1234", None).await.unwrap();

    transport.send("hello".into()).await.unwrap();
    assert_eq!(remote.sent(), ["hello"]);

    assert!(remote.push_text("world"));
    assert_eq!(
        transport.recv().await.unwrap(),
        Frame::Text("world".to_string())
    );

    remote.close(4000);
    assert_eq!(transport.recv().await.unwrap(), Frame::Close(Some(4000)));
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_mock_transport_dropped_connection_reads_as_close() {
    let (mut transport, remote) = MockTransport::new();
    transport.connect("ws://x", None).await.unwrap();

    remote.drop_connection();
    assert_eq!(transport.recv().await.unwrap(), Frame::Close(None));
}

#[tokio::test]
async fn test_mock_transport_connect_refused() {
    let (mut transport, remote) = MockTransport::new();
    remote.refuse_connects(1);

    let result = transport.connect("ws://x", None).await;
    assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    assert!(!transport.is_connected());

    transport.connect("ws://x", None).await.unwrap();
    assert!(transport.is_connected());
    assert_eq!(remote.connects().len(), 2);
}

#[tokio::test]
async fn test_mock_transport_send_failure_drops_connection() {
    let (mut transport, remote) = MockTransport::new();
    transport.connect("ws://x", None).await.unwrap();
    remote.fail_sends(1);

    assert!(transport.send("lost".into()).await.is_err());
    assert!(!transport.is_connected());
    assert!(remote.sent().is_empty());
}

#[tokio::test]
async fn test_websocket_transport_starts_disconnected() {
    let mut transport = WebSocketTransport::new();
    assert!(!transport.is_connected());

    let result = transport.send("x".into()).await;
    assert!(matches!(result, Err(TransportError::ConnectionClosed)));

    let result = transport.recv().await;
    assert!(matches!(result, Err(TransportError::ConnectionClosed)));

    // Disconnecting when never connected is fine
    transport.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_websocket_transport_rejects_bad_url() {
    let mut transport = WebSocketTransport::new();
    let result = transport.connect("not a url", None).await;
    assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    assert!(!transport.is_connected());
}
