//! Transport seam for market data sockets.
//!
//! A [`Connector`] opens one socket and hands back a [`Connection`]: a text
//! sink for outbound JSON and a stream of inbound [`Frame`]s. The market
//! stream only ever talks to this seam, so the production transport
//! (`tokio-tungstenite`) and in-memory test transports are interchangeable.

use std::pin::Pin;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::error::WsError;
use crate::ws::MessageOut;

/// One inbound frame, reduced to what the market stream cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Close { code: Option<u16>, reason: String },
}

pub type FrameSink = Pin<Box<dyn Sink<String, Error = WsError> + Send>>;
pub type FrameStream = BoxStream<'static, Result<Frame, WsError>>;

/// An open socket.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }

    /// Serialize and send a MessageOut over the sink.
    pub async fn send(&mut self, msg: &MessageOut) -> Result<(), WsError> {
        let json = serde_json::to_string(msg).map_err(|e| WsError::SendFailed(e.to_string()))?;
        self.sink.send(json).await
    }

    /// Graceful close; errors are irrelevant once we are leaving.
    pub async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            tracing::debug!("Error while closing socket: {}", e);
        }
    }
}

/// Opens market data sockets.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection, WsError>>;
}

// ─── tokio-tungstenite ───────────────────────────────────────────────────────

/// Native connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    connect_timeout: Duration,
}

impl TungsteniteConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection, WsError>> {
        let url = url.to_string();
        let connect_timeout = self.connect_timeout;

        Box::pin(async move {
            let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(url.as_str()))
                .await
                .map_err(|_| WsError::Timeout)?
                .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws_stream.split();

            let sink = sink
                .sink_map_err(|e| WsError::SendFailed(e.to_string()))
                .with(|text: String| {
                    futures_util::future::ok::<_, WsError>(Message::Text(text.into()))
                });
            let stream = stream.filter_map(|msg| futures_util::future::ready(map_message(msg)));

            Ok(Connection::new(Box::pin(sink), stream.boxed()))
        })
    }
}

/// Map a tungstenite message to a frame; control frames are dropped.
fn map_message(
    msg: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<Frame, WsError>> {
    match msg {
        Ok(Message::Text(text)) => {
            let text_str: &str = text.as_ref();
            Some(Ok(Frame::Text(text_str.to_string())))
        }
        Ok(Message::Close(frame)) => {
            let (code, reason) = extract_close(frame.as_ref());
            Some(Ok(Frame::Close {
                code: Some(code),
                reason,
            }))
        }
        // Ping is answered by tungstenite itself; Pong, Binary, Frame — ignore
        Ok(_) => None,
        Err(e) => Some(Err(WsError::Transport(e.to_string()))),
    }
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => {
            let reason: &str = f.reason.as_ref();
            (f.code.into(), reason.to_string())
        }
        None => (1006, "No close frame".into()),
    }
}
