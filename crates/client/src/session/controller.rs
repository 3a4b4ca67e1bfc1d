// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session controller.
//!
//! A [`CloudSession`] owns one driver task that performs all transport I/O
//! and timer waits. The public methods are synchronous and only take short
//! locks on the shared state:
//!
//! - `set` writes through to the store and either hands the line to the
//!   driver (while open) or appends it to the outbound queue
//! - `get` reads the store
//! - `close` cancels the driver and stops event delivery
//!
//! Listener callbacks are made with the emit lock held and never with the
//! state lock held, so callbacks may call back into the session.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use cv_core::protocol::parse_frame;
use cv_core::{normalize_name, ClientMessage, CloseReason, ServerMessage, Value};

use super::backoff::{reconnect_delay, RandomSource, ThreadRandom};
use super::listener::SessionListener;
use super::queue::OutboundQueue;
use super::store::VariableStore;
use super::transport::{Frame, Transport, WebSocketTransport};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Waiting for a transport to open, or for the reconnect timer.
    Connecting,
    /// Handshake sent; writes go straight to the server.
    Open,
    /// Closed for good, by `close()` or a terminal failure.
    Closed,
}

/// State guarded by the session lock.
struct Core {
    status: SessionStatus,
    store: VariableStore,
    queue: OutboundQueue,
    /// Line channel into the driver, present only while open.
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// Connection attempts since the last successful open.
    attempts: u32,
    /// Lines handed to the driver that are not yet written.
    in_flight: usize,
    failure: Option<SessionError>,
}

/// State shared between the session handle and its driver.
struct Shared {
    config: SessionConfig,
    core: Mutex<Core>,
    /// Serializes listener callbacks against shutdown.
    emit_lock: ReentrantMutex<()>,
    closed: AtomicBool,
    cancel: CancellationToken,
    /// Cancelled when the driver task ends.
    finished: CancellationToken,
    /// Woken whenever queued or in-flight lines change.
    progress: Notify,
    listener: Box<dyn SessionListener>,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Calls the listener unless the session is closed.
    fn emit(&self, f: impl FnOnce(&dyn SessionListener)) {
        let _guard = self.emit_lock.lock();
        if !self.is_closed() {
            f(self.listener.as_ref());
        }
    }

    /// Marks the session closed. Returns false if it already was.
    fn mark_closed(&self, failure: Option<&SessionError>) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.cancel.cancel();

        let mut core = self.core.lock();
        core.status = SessionStatus::Closed;
        core.outbound = None;
        core.failure = failure.cloned();
        drop(core);
        self.progress.notify_waiters();
        true
    }

    /// Tears the session down after a terminal failure and reports it once.
    fn fail(&self, err: &SessionError) -> bool {
        let _guard = self.emit_lock.lock();
        if !self.mark_closed(Some(err)) {
            return false;
        }
        tracing::error!("session failed: {}", err);
        self.listener.error(err);
        true
    }

    /// Explicit shutdown. Emits nothing.
    fn shutdown(&self) -> bool {
        let _guard = self.emit_lock.lock();
        self.mark_closed(None)
    }

    fn outcome(&self) -> SessionResult<()> {
        match self.core.lock().failure.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Picks the endpoint for the next attempt and counts the attempt.
    fn next_endpoint(&self) -> (String, u32) {
        let mut core = self.core.lock();
        let endpoints = self.config.endpoints();
        let url = endpoints[core.attempts as usize % endpoints.len()].clone();
        core.attempts = core.attempts.saturating_add(1);
        (url, core.attempts)
    }

    /// Switches to `Open` and takes the queued lines for flushing.
    ///
    /// Returns `None` if the session was closed in the meantime.
    fn open(&self, tx: mpsc::UnboundedSender<String>) -> Option<VecDeque<String>> {
        let mut core = self.core.lock();
        if core.status == SessionStatus::Closed {
            return None;
        }
        core.status = SessionStatus::Open;
        core.outbound = Some(tx);
        core.attempts = 0;
        let pending = core.queue.drain();
        core.in_flight = pending.len();
        Some(pending)
    }

    /// Records that one in-flight line reached the transport.
    fn line_written(&self) {
        let mut core = self.core.lock();
        core.in_flight = core.in_flight.saturating_sub(1);
        drop(core);
        self.progress.notify_waiters();
    }

    /// Puts lines that never reached the server back at the head of the queue.
    ///
    /// Lines still sitting in the driver channel follow `unsent`, and both go
    /// ahead of anything queued since.
    fn requeue(&self, mut unsent: VecDeque<String>, rx: &mut mpsc::UnboundedReceiver<String>) {
        let mut core = self.core.lock();
        if core.status != SessionStatus::Closed {
            core.status = SessionStatus::Connecting;
        }
        core.outbound = None;
        core.in_flight = 0;
        while let Ok(line) = rx.try_recv() {
            unsent.push_back(line);
        }
        if !unsent.is_empty() {
            tracing::debug!("requeued {} unsent lines", unsent.len());
        }
        core.queue.requeue_front(unsent);
        drop(core);
        self.progress.notify_waiters();
    }

    /// Applies every message of a text frame.
    ///
    /// The whole frame is validated first; a bad line applies nothing.
    fn dispatch(&self, text: &str) -> SessionResult<()> {
        for message in parse_frame(text)? {
            if self.is_closed() {
                break;
            }
            match message {
                ServerMessage::Set { name, value } => {
                    self.core.lock().store.insert(name.clone(), value.clone());
                    self.emit(|listener| listener.set(&name, &value));
                }
                ServerMessage::Other { method } => {
                    tracing::debug!("ignoring message with method {:?}", method);
                }
            }
        }
        Ok(())
    }
}

/// A live cloud variable session.
///
/// Dropping the handle closes the session.
pub struct CloudSession {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<SessionResult<()>>>>,
}

impl CloudSession {
    /// Start a session over WebSocket.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(
        config: SessionConfig,
        listener: impl SessionListener,
    ) -> SessionResult<Self> {
        Self::with_transport(config, WebSocketTransport::new(), listener, ThreadRandom)
    }

    /// Start a session with a custom transport and randomness source.
    pub fn with_transport<T, L, R>(
        config: SessionConfig,
        transport: T,
        listener: L,
        random: R,
    ) -> SessionResult<Self>
    where
        T: Transport + 'static,
        L: SessionListener,
        R: RandomSource + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::Runtime(e.to_string()))?;
        let handshake = ClientMessage::handshake(config.project_id(), config.username())
            .to_json()
            .map_err(|e| SessionError::Driver(e.to_string()))?;

        let shared = Arc::new(Shared {
            config,
            core: Mutex::new(Core {
                status: SessionStatus::Connecting,
                store: VariableStore::new(),
                queue: OutboundQueue::new(),
                outbound: None,
                attempts: 0,
                in_flight: 0,
                failure: None,
            }),
            emit_lock: ReentrantMutex::new(()),
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
            progress: Notify::new(),
            listener: Box::new(listener),
        });

        let driver = runtime.spawn(drive(Arc::clone(&shared), transport, random, handshake));

        Ok(CloudSession {
            shared,
            driver: Mutex::new(Some(driver)),
        })
    }

    /// Write a variable.
    ///
    /// The value is stored locally right away. It is sent immediately while
    /// the session is open and queued otherwise. A non-finite number is a
    /// terminal failure.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> SessionResult<()> {
        if self.shared.is_closed() {
            return Err(SessionError::Closed);
        }

        let name = normalize_name(name).into_owned();
        let value = value.into();
        let line = match self.encode_set(&name, &value) {
            Ok(line) => line,
            Err(err) => {
                if self.shared.fail(&err) {
                    return Err(err);
                }
                return Err(SessionError::Closed);
            }
        };

        let mut core = self.shared.core.lock();
        if core.status == SessionStatus::Closed {
            return Err(SessionError::Closed);
        }
        core.store.insert(name, value);

        let sent = match (&core.outbound, core.status) {
            (Some(tx), SessionStatus::Open) => tx.send(line).map_err(|e| e.0),
            _ => Err(line),
        };
        match sent {
            Ok(()) => core.in_flight += 1,
            Err(line) => core.queue.push(line),
        }
        Ok(())
    }

    fn encode_set(&self, name: &str, value: &Value) -> SessionResult<String> {
        if !value.is_valid() {
            return Err(SessionError::Validation {
                name: name.to_string(),
                reason: format!("{} is not a finite number", value),
            });
        }
        let config = &self.shared.config;
        ClientMessage::set(config.project_id(), config.username(), name, value.clone())
            .to_json()
            .map_err(|e| SessionError::Validation {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Last known value of a variable, or `None` if it was never seen.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.shared
            .core
            .lock()
            .store
            .get(&normalize_name(name))
            .cloned()
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.core.lock().status
    }

    /// Number of lines waiting for the next open.
    pub fn pending_count(&self) -> usize {
        self.shared.core.lock().queue.len()
    }

    /// Snapshot of all known variables, ordered by name.
    pub fn variables(&self) -> Vec<(String, Value)> {
        self.shared.core.lock().store.snapshot()
    }

    pub fn username(&self) -> &str {
        self.shared.config.username()
    }

    pub fn project_id(&self) -> &str {
        self.shared.config.project_id()
    }

    /// Close the session. No event is delivered after this returns.
    pub fn close(&self) {
        if self.shared.shutdown() {
            tracing::info!("session closed");
        }
    }

    /// Wait until every line written so far has reached the transport.
    ///
    /// Resolves once the session is open with an empty queue and nothing in
    /// flight. Fails with the terminal error, or `Closed`, if the session
    /// ends first.
    pub async fn flushed(&self) -> SessionResult<()> {
        loop {
            let notified = self.shared.progress.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let core = self.shared.core.lock();
                match core.status {
                    SessionStatus::Closed => {
                        return Err(core.failure.clone().unwrap_or(SessionError::Closed));
                    }
                    SessionStatus::Open if core.queue.is_empty() && core.in_flight == 0 => {
                        return Ok(());
                    }
                    _ => {}
                }
            }

            notified.await;
        }
    }

    /// Wait for the driver to finish.
    ///
    /// Resolves to `Ok` after `close()` and to the failure after a terminal
    /// error. Any number of callers may wait at once.
    pub async fn closed(&self) -> SessionResult<()> {
        let driver = self.driver.lock().take();
        if let Some(handle) = driver {
            if let Err(e) = handle.await {
                return Err(SessionError::Driver(e.to_string()));
            }
        }
        self.shared.finished.cancelled().await;
        self.shared.outcome()
    }
}

impl Drop for CloudSession {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

/// Why a connection ended.
enum Disconnect {
    /// The session was closed while the connection was being set up.
    Cancelled,
    /// A terminal failure was reported.
    Failed,
    /// The connection dropped, with the close code if one was received.
    Lost(Option<u16>),
}

/// Driver loop: connect, serve, and reconnect until closed.
async fn drive<T, R>(
    shared: Arc<Shared>,
    mut transport: T,
    mut random: R,
    handshake: String,
) -> SessionResult<()>
where
    T: Transport,
    R: RandomSource,
{
    let _finished = shared.finished.clone().drop_guard();
    let user_agent = shared.config.user_agent().map(str::to_string);

    loop {
        let (url, attempts) = shared.next_endpoint();
        tracing::info!("connecting to {} (attempt {})", url, attempts);

        let connected = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            result = transport.connect(&url, user_agent.as_deref()) => result,
        };

        let code = match connected {
            Ok(()) => {
                tracing::info!("connected to {}", url);
                let outcome = tokio::select! {
                    _ = shared.cancel.cancelled() => Disconnect::Cancelled,
                    outcome = serve(&shared, &mut transport, &handshake) => outcome,
                };
                match outcome {
                    Disconnect::Cancelled | Disconnect::Failed => break,
                    Disconnect::Lost(code) => code,
                }
            }
            Err(e) => {
                tracing::warn!("connection to {} failed: {}", url, e);
                None
            }
        };

        if let Some(reason) = code.and_then(CloseReason::from_code) {
            shared.fail(&SessionError::Rejected(reason));
            break;
        }
        if shared.is_closed() {
            break;
        }

        let delay = reconnect_delay(shared.core.lock().attempts, random.next_unit());
        tracing::warn!(
            "connection lost (code {:?}), reconnecting in {:?}",
            code,
            delay
        );
        shared.emit(|listener| listener.reconnecting());

        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let _ = transport.disconnect().await;
    shared.outcome()
}

/// Runs one open connection until it ends.
async fn serve<T: Transport>(shared: &Shared, transport: &mut T, handshake: &str) -> Disconnect {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let Some(mut pending) = shared.open(tx) else {
        return Disconnect::Cancelled;
    };

    if let Err(e) = transport.send(handshake.to_string()).await {
        tracing::warn!("failed to send handshake: {}", e);
        shared.requeue(pending, &mut rx);
        return Disconnect::Lost(None);
    }

    let flushed = pending.len();
    while let Some(line) = pending.pop_front() {
        if let Err(e) = transport.send(line.clone()).await {
            tracing::warn!("failed to flush queued line: {}", e);
            pending.push_front(line);
            shared.requeue(pending, &mut rx);
            return Disconnect::Lost(None);
        }
        shared.line_written();
    }
    if flushed > 0 {
        tracing::debug!("flushed {} queued lines", flushed);
    }

    shared.emit(|listener| listener.connected());

    loop {
        tokio::select! {
            biased;
            Some(line) = rx.recv() => {
                if let Err(e) = transport.send(line.clone()).await {
                    tracing::warn!("send failed: {}", e);
                    shared.requeue(VecDeque::from([line]), &mut rx);
                    return Disconnect::Lost(None);
                }
                shared.line_written();
            }
            frame = transport.recv() => match frame {
                Ok(Frame::Text(text)) => {
                    if let Err(err) = shared.dispatch(&text) {
                        shared.fail(&err);
                        return Disconnect::Failed;
                    }
                }
                Ok(Frame::Binary(data)) => {
                    tracing::debug!("ignoring binary frame ({} bytes)", data.len());
                }
                Ok(Frame::Close(code)) => {
                    shared.requeue(VecDeque::new(), &mut rx);
                    return Disconnect::Lost(code);
                }
                Err(e) => {
                    tracing::warn!("receive failed: {}", e);
                    shared.requeue(VecDeque::new(), &mut rx);
                    return Disconnect::Lost(None);
                }
            },
        }
    }
}
