//! In-memory fakes shared by the session tests.
#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use dogent_core::{
    CommandExecutor, Connector, ExecutionError, Frame, Transport, TransportError,
};
use serde_json::Value;
use tokio::{sync::mpsc, time::Instant};
use url::Url;

/// Ordered record of side effects across fakes.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Transport whose far end is driven by the test.
pub struct FakeTransport {
    inbound: mpsc::UnboundedReceiver<Frame>,
    outbound: mpsc::UnboundedSender<String>,
    fail_sends: bool,
    log: EventLog,
    closes: Arc<AtomicUsize>,
}

/// The server side of a [`FakeTransport`].
pub struct ServerEnd {
    pub inbound: Option<mpsc::UnboundedSender<Frame>>,
    pub outbound: mpsc::UnboundedReceiver<String>,
    pub closes: Arc<AtomicUsize>,
}

impl ServerEnd {
    /// Queue one frame for the agent to read.
    pub fn push(&self, frame: &str) {
        self.push_bytes(frame.as_bytes());
    }

    pub fn push_bytes(&self, frame: &[u8]) {
        self.inbound
            .as_ref()
            .expect("server already hung up")
            .send(frame.to_vec())
            .unwrap();
    }

    /// Drop the inbound side; the agent's next read fails once queued frames are consumed.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Frames written by the agent so far, parsed as JSON.
    pub fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub fn transport_pair() -> (FakeTransport, ServerEnd) {
    transport_pair_with(EventLog::default(), false)
}

pub fn transport_pair_with(log: EventLog, fail_sends: bool) -> (FakeTransport, ServerEnd) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let closes = Arc::new(AtomicUsize::new(0));
    (
        FakeTransport {
            inbound: inbound_rx,
            outbound: outbound_tx,
            fail_sends,
            log,
            closes: Arc::clone(&closes),
        },
        ServerEnd {
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
            closes,
        },
    )
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send("broken pipe".to_string()));
        }
        self.log.push(format!("sent:{frame}"));
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<Frame, TransportError> {
        self.inbound.recv().await.ok_or(TransportError::Closed)
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connector that hands out queued outcomes, then fails forever.
#[derive(Clone, Default)]
pub struct FakeConnector {
    outcomes: Arc<Mutex<VecDeque<Result<FakeTransport, TransportError>>>>,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl FakeConnector {
    pub fn fail(&self) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Connect("connection refused".to_string())));
    }

    pub fn succeed(&self, transport: FakeTransport) {
        self.outcomes.lock().unwrap().push_back(Ok(transport));
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Transport = FakeTransport;

    async fn connect(&self, _endpoint: &Url) -> Result<FakeTransport, TransportError> {
        self.attempts.lock().unwrap().push(Instant::now());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("exhausted".to_string())))
    }
}

/// Executor returning a fixed outcome and recording start/end events.
pub struct StubExecutor {
    outcome: Result<String, String>,
    log: EventLog,
}

impl StubExecutor {
    pub fn ok(output: &str) -> Self {
        Self::with_log(Ok(output.to_string()), EventLog::default())
    }

    pub fn failing(message: &str) -> Self {
        Self::with_log(Err(message.to_string()), EventLog::default())
    }

    pub fn with_log(outcome: Result<String, String>, log: EventLog) -> Self {
        Self { outcome, log }
    }
}

#[async_trait]
impl CommandExecutor for StubExecutor {
    async fn execute(&self, command: &str) -> Result<String, ExecutionError> {
        self.log.push(format!("start:{command}"));
        tokio::task::yield_now().await;
        self.log.push(format!("end:{command}"));
        match &self.outcome {
            Ok(output) => Ok(output.clone()),
            Err(message) => Err(ExecutionError::Spawn(message.clone())),
        }
    }
}
