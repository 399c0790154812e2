//! Common test utilities for market stream integration tests.
//!
//! `MockConnector` stands in for the network: every `connect()` either fails
//! (when failures are queued) or creates an in-memory socket whose far end
//! is handed to the test as a `MockSession`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;

use tradedesk_sdk::error::WsError;
use tradedesk_sdk::ws::stream::{MarketStream, MarketSubscription, MarketView};
use tradedesk_sdk::ws::transport::{Connection, Connector, Frame};
use tradedesk_sdk::ws::{BackoffConfig, WsConfig};

pub const WS_URL: &str = "ws://mock/api/v1/ws";
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Far end of one in-memory socket.
pub struct MockSession {
    pub url: String,
    inbound: mpsc::UnboundedSender<Result<Frame, WsError>>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl MockSession {
    /// Push a JSON frame to the client.
    pub fn push(&self, frame: Value) {
        self.push_text(&frame.to_string());
    }

    pub fn push_text(&self, text: &str) {
        let _ = self.inbound.send(Ok(Frame::Text(text.to_string())));
    }

    /// Transport-level failure on the client's read side.
    pub fn fail(&self, reason: &str) {
        let _ = self.inbound.send(Err(WsError::Transport(reason.to_string())));
    }

    /// Server-initiated close frame.
    pub fn close(&self, code: u16, reason: &str) {
        let _ = self.inbound.send(Ok(Frame::Close {
            code: Some(code),
            reason: reason.to_string(),
        }));
    }

    /// Next message the client sent, parsed as JSON.
    pub async fn next_sent(&mut self) -> Value {
        let text = timeout(TEST_TIMEOUT, self.outbound.recv())
            .await
            .expect("timed out waiting for client message")
            .expect("client closed the socket");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }

    /// Resolves once the client has dropped its end of the socket.
    pub async fn wait_closed(&mut self) {
        timeout(TEST_TIMEOUT, async {
            while self.outbound.recv().await.is_some() {}
        })
        .await
        .expect("client did not close the socket");
    }
}

#[derive(Clone)]
pub struct MockConnector {
    sessions: mpsc::UnboundedSender<MockSession>,
    failures: Arc<AtomicU32>,
    stalls: Arc<AtomicU32>,
    attempts: Arc<AtomicU32>,
}

impl Connector for MockConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection, WsError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let refused = take_one(&self.failures);
        if refused {
            return Box::pin(async { Err(WsError::ConnectionFailed("connection refused".into())) });
        }
        if take_one(&self.stalls) {
            return Box::pin(futures_util::future::pending());
        }

        let (in_tx, in_rx) = mpsc::unbounded_channel::<Result<Frame, WsError>>();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();

        let _ = self.sessions.send(MockSession {
            url: url.to_string(),
            inbound: in_tx,
            outbound: out_rx,
        });

        let sink = futures_util::sink::unfold(out_tx, |tx, text: String| async move {
            tx.send(text)
                .map_err(|_| WsError::SendFailed("mock peer gone".into()))?;
            Ok::<_, WsError>(tx)
        });
        let stream = futures_util::stream::unfold(in_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Box::pin(async move { Ok(Connection::new(Box::pin(sink), stream.boxed())) })
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Test-side handle on the mock network.
pub struct MockServer {
    sessions: mpsc::UnboundedReceiver<MockSession>,
    failures: Arc<AtomicU32>,
    stalls: Arc<AtomicU32>,
    attempts: Arc<AtomicU32>,
}

impl MockServer {
    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Leave the next `n` handshakes hanging forever.
    pub fn stall_next(&self, n: u32) {
        self.stalls.store(n, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn next_session(&mut self) -> MockSession {
        timeout(TEST_TIMEOUT, self.sessions.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("connector dropped")
    }

    /// Whether a connection was opened that the test has not picked up yet.
    pub fn has_pending_session(&mut self) -> bool {
        self.sessions.try_recv().is_ok()
    }
}

pub fn mock_network() -> (MockConnector, MockServer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let failures = Arc::new(AtomicU32::new(0));
    let stalls = Arc::new(AtomicU32::new(0));
    let attempts = Arc::new(AtomicU32::new(0));
    (
        MockConnector {
            sessions: tx,
            failures: failures.clone(),
            stalls: stalls.clone(),
            attempts: attempts.clone(),
        },
        MockServer {
            sessions: rx,
            failures,
            stalls,
            attempts,
        },
    )
}

/// Deterministic config: no jitter so delays are exact.
pub fn test_config() -> WsConfig {
    WsConfig {
        url: WS_URL.into(),
        backoff: BackoffConfig {
            jitter: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn mock_stream(config: WsConfig) -> (MarketStream, MockServer) {
    let (connector, server) = mock_network();
    (MarketStream::new(config, Arc::new(connector)), server)
}

/// Wait until the subscription publishes a view matching `pred`.
pub async fn wait_for<F>(sub: &mut MarketSubscription, pred: F) -> MarketView
where
    F: Fn(&MarketView) -> bool,
{
    timeout(TEST_TIMEOUT, async {
        loop {
            let view = sub.current();
            if pred(&view) {
                return view;
            }
            sub.changed().await.expect("feed stopped");
        }
    })
    .await
    .expect("timed out waiting for view")
}

// ── Frame builders ───────────────────────────────────────────────────────────

pub fn level(price: i64, qty: i64) -> Value {
    json!({ "price": price, "qty": qty })
}

pub fn snapshot(seq: u64, bids: Vec<Value>, asks: Vec<Value>) -> Value {
    json!({ "type": "snapshot", "seq": seq, "data": { "bids": bids, "asks": asks } })
}

pub fn delta(seq: u64, bids: Vec<Value>, asks: Vec<Value>) -> Value {
    json!({ "type": "delta", "seq": seq, "data": { "bids": bids, "asks": asks } })
}

pub fn trade(price: i64, ts: f64) -> Value {
    json!({ "type": "trade", "data": { "price": price, "timestamp": ts } })
}
