//! Market data stream client.
//!
//! [`MarketStream`] multiplexes consumers onto one socket per symbol. Each
//! symbol is driven by its own feed task which owns the transport, the order
//! book and the ticker. Consumers hold a [`MarketSubscription`] and read
//! [`MarketView`] snapshots published over a `watch` channel after every
//! applied message.
//!
//! ```ignore
//! let stream = MarketStream::native(WsConfig::default());
//! let mut aapl = stream.subscribe("AAPL");
//! while let Some(view) = aapl.changed().await {
//!     println!("{} {:?}", view.connection.label(), view.order_book.best_bid());
//! }
//! ```
//!
//! A feed task lives exactly as long as its symbol has subscribers. When the
//! last handle is dropped the entry is removed, the command channel closes
//! and the task closes the socket on its next poll, whether it is connected,
//! mid-handshake or sleeping in backoff.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::orderbook::{DeltaOutcome, OrderBookState, TickerState};
use crate::error::WsError;
use crate::shared::Symbol;
use crate::ws::backoff::Backoff;
use crate::ws::transport::{Connection, Connector, Frame, TungsteniteConnector};
use crate::ws::{decode, ConnectionState, Kind, MessageOut, ResyncMode, WsConfig};

const COMMAND_CHANNEL_SIZE: usize = 16;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a consumer renders for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketView {
    pub symbol: Symbol,
    pub order_book: OrderBookState,
    pub ticker: TickerState,
    pub connection: ConnectionState,
}

impl MarketView {
    fn new(symbol: Symbol) -> Self {
        Self {
            order_book: OrderBookState::new(symbol.clone()),
            ticker: TickerState::new(symbol.clone()),
            connection: ConnectionState::Idle,
            symbol,
        }
    }
}

#[derive(Debug)]
enum FeedCommand {
    Resync,
}

/// One symbol's feed. `view_tx` outlives the task: a feed that gave up is
/// restarted on the same channel so existing subscribers keep receiving.
struct FeedEntry {
    subscribers: HashSet<u64>,
    view_tx: Arc<watch::Sender<MarketView>>,
    cmd_tx: mpsc::Sender<FeedCommand>,
    task: JoinHandle<()>,
}

struct Shared {
    config: WsConfig,
    connector: Arc<dyn Connector>,
    feeds: Mutex<HashMap<Symbol, FeedEntry>>,
    next_id: AtomicU64,
}

impl Shared {
    fn feeds(&self) -> MutexGuard<'_, HashMap<Symbol, FeedEntry>> {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_feed(&self, symbol: &Symbol) -> FeedEntry {
        let (view_tx, _) = watch::channel(MarketView::new(symbol.clone()));
        let view_tx = Arc::new(view_tx);
        let (cmd_tx, task) = self.spawn_feed(symbol, Arc::clone(&view_tx));
        FeedEntry {
            subscribers: HashSet::new(),
            view_tx,
            cmd_tx,
            task,
        }
    }

    fn spawn_feed(
        &self,
        symbol: &Symbol,
        view_tx: Arc<watch::Sender<MarketView>>,
    ) -> (mpsc::Sender<FeedCommand>, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        let feed = Feed {
            symbol: symbol.clone(),
            url: self.config.symbol_url(symbol),
            config: self.config.clone(),
            connector: Arc::clone(&self.connector),
            cmd_rx,
            view_tx,
            book: OrderBookState::new(symbol.clone()),
            ticker: TickerState::new(symbol.clone()),
            connection: ConnectionState::Idle,
            backoff: Backoff::new(self.config.backoff.clone()),
        };

        tracing::debug!("Starting feed for {}", symbol);
        (cmd_tx, tokio::spawn(feed.run()))
    }

    fn release(&self, symbol: &Symbol, id: u64) {
        let removed = {
            let mut feeds = self.feeds();
            let Some(entry) = feeds.get_mut(symbol) else {
                return;
            };
            if !entry.subscribers.remove(&id) {
                return;
            }
            if entry.subscribers.is_empty() {
                feeds.remove(symbol)
            } else {
                tracing::debug!(
                    "Subscriber left {} ({} remaining)",
                    symbol,
                    entry.subscribers.len()
                );
                None
            }
        };

        // Dropping the entry drops the command sender, which stops the task.
        if removed.is_some() {
            tracing::info!("Last subscriber left {}, releasing feed", symbol);
        }
    }

    fn resync(&self, symbol: &Symbol) {
        let feeds = self.feeds();
        if let Some(entry) = feeds.get(symbol) {
            if let Err(e) = entry.cmd_tx.try_send(FeedCommand::Resync) {
                tracing::warn!("Resync request for {} dropped: {}", symbol, e);
            }
        }
    }
}

/// Per-symbol subscription multiplexer with automatic reconnect.
///
/// Cheap to clone; clones share the same feeds. Must be used from within a
/// Tokio runtime since feed tasks are spawned on `subscribe`.
#[derive(Clone)]
pub struct MarketStream {
    inner: Arc<Shared>,
}

impl MarketStream {
    pub fn new(config: WsConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            inner: Arc::new(Shared {
                config,
                connector,
                feeds: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Stream over real sockets via `tokio-tungstenite`.
    pub fn native(config: WsConfig) -> Self {
        let connector = Arc::new(TungsteniteConnector::new(config.connect_timeout));
        Self::new(config, connector)
    }

    pub fn config(&self) -> &WsConfig {
        &self.inner.config
    }

    /// Register interest in a symbol.
    ///
    /// The first subscriber for a symbol opens its socket; later ones share
    /// it and start from the latest published view. A feed that already gave
    /// up (reconnect disabled) is replaced by a fresh one.
    pub fn subscribe(&self, symbol: impl Into<Symbol>) -> MarketSubscription {
        let symbol = symbol.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let view = {
            let mut feeds = self.inner.feeds();
            let entry = match feeds.entry(symbol.clone()) {
                Entry::Occupied(occupied) => {
                    let entry = occupied.into_mut();
                    if entry.task.is_finished() {
                        tracing::debug!("Restarting finished feed for {}", symbol);
                        let (cmd_tx, task) =
                            self.inner.spawn_feed(&symbol, Arc::clone(&entry.view_tx));
                        entry.cmd_tx = cmd_tx;
                        entry.task = task;
                    }
                    entry
                }
                Entry::Vacant(vacant) => vacant.insert(self.inner.new_feed(&symbol)),
            };
            entry.subscribers.insert(id);
            tracing::debug!(
                "Subscribed to {} ({} subscribers)",
                symbol,
                entry.subscribers.len()
            );
            entry.view_tx.subscribe()
        };

        MarketSubscription {
            id,
            symbol,
            view,
            stream: Arc::downgrade(&self.inner),
        }
    }

    /// Release a subscription. Same as dropping it.
    pub fn unsubscribe(&self, subscription: MarketSubscription) {
        drop(subscription);
    }

    pub fn subscriber_count(&self, symbol: &Symbol) -> usize {
        self.inner
            .feeds()
            .get(symbol)
            .map_or(0, |entry| entry.subscribers.len())
    }

    /// Symbols with at least one live subscriber, sorted.
    pub fn active_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.inner.feeds().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Release every feed and wait for the tasks to close their sockets.
    ///
    /// Outstanding subscriptions stay valid but see `Closed` and no further
    /// updates.
    pub async fn shutdown(&self) {
        let entries: Vec<(Symbol, FeedEntry)> = self.inner.feeds().drain().collect();

        for (symbol, entry) in entries {
            let FeedEntry { cmd_tx, task, .. } = entry;
            drop(cmd_tx);
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => tracing::debug!("Feed for {} stopped", symbol),
                Ok(Err(e)) => tracing::warn!("Feed for {} ended abnormally: {}", symbol, e),
                Err(_) => tracing::warn!("Feed for {} did not stop in time", symbol),
            }
        }
    }
}

impl std::fmt::Debug for MarketStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketStream")
            .field("url", &self.inner.config.url)
            .field("active_symbols", &self.active_symbols())
            .finish()
    }
}

/// A consumer's handle on one symbol. Dropping it unsubscribes.
pub struct MarketSubscription {
    id: u64,
    symbol: Symbol,
    view: watch::Receiver<MarketView>,
    stream: Weak<Shared>,
}

impl MarketSubscription {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Latest published view.
    pub fn current(&self) -> MarketView {
        self.view.borrow().clone()
    }

    /// Wait for the next published view. `None` once the symbol's feed has
    /// been released, by the last unsubscribe or by `MarketStream::shutdown`.
    pub async fn changed(&mut self) -> Option<MarketView> {
        self.view.changed().await.ok()?;
        Some(self.view.borrow_and_update().clone())
    }

    /// Independent receiver for the same view channel.
    pub fn watch(&self) -> watch::Receiver<MarketView> {
        self.view.clone()
    }

    /// Throw the current book away and ask the backend for a new snapshot.
    pub fn resync(&self) {
        if let Some(shared) = self.stream.upgrade() {
            shared.resync(&self.symbol);
        }
    }
}

impl Drop for MarketSubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.stream.upgrade() {
            shared.release(&self.symbol, self.id);
        }
    }
}

impl std::fmt::Debug for MarketSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketSubscription")
            .field("id", &self.id)
            .field("symbol", &self.symbol)
            .finish()
    }
}

// ─── Feed task ───────────────────────────────────────────────────────────────

/// Why `run_connected` returned.
enum Exit {
    /// Every subscriber is gone.
    Released,
    /// Transport failed or the server closed.
    Lost(WsError),
    /// Resync by dropping the socket, with the reason.
    Reconnect(String),
}

/// What a single inbound frame asks of the connection loop.
enum Handled {
    Continue,
    Gap(WsError),
}

struct Feed {
    symbol: Symbol,
    url: String,
    config: WsConfig,
    connector: Arc<dyn Connector>,
    cmd_rx: mpsc::Receiver<FeedCommand>,
    view_tx: Arc<watch::Sender<MarketView>>,
    book: OrderBookState,
    ticker: TickerState,
    connection: ConnectionState,
    backoff: Backoff,
}

impl Feed {
    async fn run(mut self) {
        loop {
            // A retry stays `Reconnecting` until the handshake completes.
            if !matches!(self.connection, ConnectionState::Reconnecting { .. }) {
                self.set_connection(ConnectionState::Connecting {
                    attempt: self.backoff.attempt(),
                });
            }

            let connect = self.connector.connect(&self.url);
            let result = tokio::select! {
                result = connect => Some(result),
                _ = released(&mut self.cmd_rx) => None,
            };

            let conn = match result {
                Some(Ok(conn)) => conn,
                Some(Err(e)) => {
                    tracing::warn!("Connect to {} failed: {}", self.url, e);
                    if self.wait_reconnect(e.to_string()).await {
                        continue;
                    }
                    return;
                }
                None => {
                    self.close(None);
                    return;
                }
            };

            tracing::info!("Market feed for {} connected", self.symbol);
            self.backoff.reset();
            self.set_connection(ConnectionState::Open);

            match self.run_connected(conn).await {
                Exit::Released => {
                    self.close(None);
                    return;
                }
                Exit::Lost(e) => {
                    tracing::warn!("Market feed for {} lost: {}", self.symbol, e);
                    self.discard_session_state();
                    if !self.wait_reconnect(e.to_string()).await {
                        return;
                    }
                }
                Exit::Reconnect(reason) => {
                    tracing::info!("Reconnecting {} to resync the book", self.symbol);
                    self.discard_session_state();
                    self.set_connection(ConnectionState::Reconnecting {
                        attempt: 1,
                        delay: Duration::ZERO,
                        last_error: reason,
                    });
                }
            }
        }
    }

    async fn run_connected(&mut self, mut conn: Connection) -> Exit {
        if self.config.request_snapshot_on_open {
            if let Err(e) = self.request_snapshot(&mut conn).await {
                return Exit::Lost(e);
            }
        }

        loop {
            tokio::select! {
                frame = conn.stream.next() => match frame {
                    Some(Ok(Frame::Text(text))) => match self.handle_text(&text) {
                        Handled::Continue => {}
                        Handled::Gap(e) => {
                            if let Some(exit) = self.resync(&mut conn, e.to_string()).await {
                                return exit;
                            }
                        }
                    },
                    Some(Ok(Frame::Close { code, reason })) => {
                        return Exit::Lost(WsError::Closed { code, reason });
                    }
                    Some(Err(e)) => return Exit::Lost(e),
                    None => {
                        return Exit::Lost(WsError::Closed {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                    }
                },
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(FeedCommand::Resync) => {
                        tracing::debug!("Resync requested for {}", self.symbol);
                        self.book.reset();
                        self.publish();
                        let reason = "Resync requested".to_string();
                        if let Some(exit) = self.resync(&mut conn, reason).await {
                            return exit;
                        }
                    }
                    None => {
                        conn.close().await;
                        return Exit::Released;
                    }
                },
            }
        }
    }

    /// Recover the book per the configured mode. `Some` ends the connection.
    async fn resync(&mut self, conn: &mut Connection, reason: String) -> Option<Exit> {
        match self.config.resync {
            ResyncMode::RequestSnapshot => match self.request_snapshot(conn).await {
                Ok(()) => None,
                Err(e) => Some(Exit::Lost(e)),
            },
            ResyncMode::Reconnect => {
                conn.close().await;
                Some(Exit::Reconnect(reason))
            }
        }
    }

    async fn request_snapshot(&self, conn: &mut Connection) -> Result<(), WsError> {
        tracing::debug!("Requesting snapshot for {}", self.symbol);
        conn.send(&MessageOut::snapshot_request(&self.symbol)).await
    }

    fn handle_text(&mut self, text: &str) -> Handled {
        let kind = match decode(text) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("Dropping undecodable frame on {}: {}", self.symbol, e);
                return Handled::Continue;
            }
        };

        match kind {
            Kind::Snapshot(payload) | Kind::Depth(payload) => {
                self.book.apply_snapshot(&payload.data, payload.seq);
                self.publish();
            }
            Kind::Delta(payload) => match self.book.apply_delta(&payload.data, payload.seq) {
                Ok(DeltaOutcome::Applied) => self.publish(),
                Ok(DeltaOutcome::Discarded) => {
                    tracing::debug!("Delta for {} before snapshot, discarded", self.symbol);
                }
                Err(e) => {
                    tracing::warn!("{} on {}, resyncing", e, self.symbol);
                    self.publish();
                    return Handled::Gap(e);
                }
            },
            Kind::Trade(payload) => {
                let trade = payload.data;
                if trade.symbol.as_ref().is_some_and(|s| *s != self.symbol) {
                    tracing::debug!("Trade for another symbol on {} feed", self.symbol);
                } else if self.ticker.apply_trade(&trade) {
                    self.publish();
                } else {
                    tracing::debug!(
                        "Stale trade on {} (ts {} < {:?})",
                        self.symbol,
                        trade.timestamp,
                        self.ticker.timestamp
                    );
                }
            }
            Kind::Error(payload) => {
                tracing::warn!("Server error on {}: {}", self.symbol, payload.message);
            }
            Kind::Unknown => {
                tracing::debug!("Ignoring unknown message on {}", self.symbol);
            }
        }

        Handled::Continue
    }

    /// Sleep out the backoff delay. `false` means the task should exit.
    async fn wait_reconnect(&mut self, last_error: String) -> bool {
        if !self.config.reconnect {
            self.close(Some(last_error));
            return false;
        }

        let delay = self.backoff.next_delay();
        let attempt = self.backoff.attempt();
        tracing::info!(
            "Reconnect attempt {} for {} in {}ms",
            attempt,
            self.symbol,
            delay.as_millis()
        );
        self.set_connection(ConnectionState::Reconnecting {
            attempt,
            delay,
            last_error: last_error.clone(),
        });

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = released(&mut self.cmd_rx) => {
                self.close(Some(last_error));
                false
            }
        }
    }

    /// Book and trade clock are only meaningful within one connection.
    fn discard_session_state(&mut self) {
        self.book.reset();
        self.ticker.reset_watermark();
    }

    fn close(&mut self, last_error: Option<String>) {
        tracing::info!("Market feed for {} closed", self.symbol);
        self.set_connection(ConnectionState::Closed { last_error });
    }

    fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
        self.publish();
    }

    fn publish(&self) {
        self.view_tx.send_replace(MarketView {
            symbol: self.symbol.clone(),
            order_book: self.book.clone(),
            ticker: self.ticker.clone(),
            connection: self.connection.clone(),
        });
    }
}

/// Resolves once the command channel closes. Resync requests received while
/// not connected are moot: every connection starts from a fresh snapshot.
async fn released(cmd_rx: &mut mpsc::Receiver<FeedCommand>) {
    while let Some(cmd) = cmd_rx.recv().await {
        tracing::trace!("Ignoring {:?} while disconnected", cmd);
    }
}
