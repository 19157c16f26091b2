// WebSocket transport for the battle channel: connect, then bridge the socket to channels.

use crate::domain::errors::SessionError;
use crate::domain::ports::{Action, BattleChannel, BattleConnector, Inbound};
use crate::domain::state::Credential;
use crate::interface_adapters::protocol::{decode_server_message, encode_action};

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tokio::task::AbortHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

/// Builds `{base}/ws/battle/{battle_id}/?token={credential}`.
pub fn battle_url(base: &Url, battle_id: &str, credential: &Credential) -> Result<Url, SessionError> {
    if !matches!(base.scheme(), "ws" | "wss") {
        return Err(SessionError::InvalidUrl(format!(
            "unsupported scheme {} in {base}",
            base.scheme()
        )));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SessionError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(["ws", "battle", battle_id, ""]);
    url.query_pairs_mut()
        .clear()
        .append_pair("token", credential.as_str());
    Ok(url)
}

pub struct WsConnector {
    base_url: Url,
    inbound_capacity: usize,
}

impl WsConnector {
    pub fn new(base_url: &str, inbound_capacity: usize) -> Result<Self, SessionError> {
        let base_url =
            Url::parse(base_url).map_err(|e| SessionError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            base_url,
            inbound_capacity,
        })
    }
}

#[async_trait]
impl BattleConnector for WsConnector {
    async fn open(
        &self,
        battle_id: &str,
        credential: &Credential,
    ) -> Result<BattleChannel, SessionError> {
        let url = battle_url(&self.base_url, battle_id, credential)?;
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        debug!(battle_id, "websocket handshake complete");

        let (write, read) = socket.split();
        let (inbound_tx, inbound) = mpsc::channel(self.inbound_capacity);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());

        let span = info_span!("battle_ws", battle_id);
        let reader = tokio::spawn(read_pump(read, inbound_tx).instrument(span.clone()));
        tokio::spawn(
            write_pump(write, outbound_rx, shutdown.clone(), reader.abort_handle()).instrument(span),
        );

        Ok(BattleChannel {
            inbound,
            outbound,
            shutdown,
        })
    }
}

// Decodes frames into the inbound channel until the socket ends.
// Always finishes with exactly one Closed or Failed item.
async fn read_pump<S>(mut read: S, inbound: mpsc::Sender<Inbound>)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let terminal = loop {
        let Some(frame) = read.next().await else {
            break Inbound::Closed { reason: None };
        };
        match frame {
            Ok(Message::Text(text)) => {
                let Some(item) = decode_server_message(text.as_str()) else {
                    continue;
                };
                if inbound.send(item).await.is_err() {
                    debug!("inbound receiver dropped; reader exiting");
                    return;
                }
            }
            Ok(Message::Binary(bytes)) => {
                debug!(len = bytes.len(), "ignoring binary frame");
            }
            Ok(Message::Close(frame)) => {
                let reason = frame
                    .map(|f| f.reason.as_str().to_string())
                    .filter(|r| !r.is_empty());
                info!(?reason, "server closed the battle channel");
                break Inbound::Closed { reason };
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "battle socket read failed");
                break Inbound::Failed {
                    error: e.to_string(),
                };
            }
        }
    };

    let _ = inbound.send(terminal).await;
}

// Drains queued actions onto the socket until shutdown, then sends a close frame.
async fn write_pump<W>(
    mut write: W,
    mut outbound: mpsc::UnboundedReceiver<Action>,
    shutdown: Arc<Notify>,
    reader: AbortHandle,
) where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            action = outbound.recv() => {
                let Some(action) = action else {
                    break;
                };
                let text = match encode_action(action) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, ?action, "failed to encode action");
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::text(text)).await {
                    warn!(error = %e, "battle socket write failed");
                    break;
                }
            }
        }
    }

    // Pending actions are abandoned.
    let _ = write.send(Message::Close(None)).await;
    let _ = write.close().await;
    reader.abort();
    debug!("battle socket writer stopped");
}
