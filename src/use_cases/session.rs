// Transport session: one authenticated real-time channel per battle.

use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};

use crate::domain::errors::SessionError;
use crate::domain::ports::{Action, AuthProvider, BattleChannel, BattleConnector, Inbound};
use crate::domain::state::Credential;

/// Returns a usable credential, refreshing it first when it is absent or expired.
pub async fn acquire_credential<A>(auth: &A) -> Result<Credential, SessionError>
where
    A: AuthProvider + ?Sized,
{
    if let Some(credential) = auth.current_credential() {
        if !auth.is_credential_expired() {
            return Ok(credential);
        }
        debug!("access credential expired; refreshing");
    } else {
        debug!("no access credential stored; refreshing");
    }

    auth.refresh_credential().await.map_err(|e| {
        warn!(error = %e, "credential refresh failed");
        SessionError::CredentialRefresh(e)
    })
}

pub struct TransportSession {
    battle_id: Arc<str>,
    inbound: mpsc::Receiver<Inbound>,
    outbound: mpsc::UnboundedSender<Action>,
    shutdown: Arc<Notify>,
    // False once the peer closed, the transport failed, or the session was disposed.
    open: bool,
    disposed: bool,
    actions_sent: u64,
    messages_received: u64,
}

impl TransportSession {
    /// Acquires a credential and opens the battle channel. Nothing is opened when the
    /// credential cannot be obtained.
    pub async fn connect<A, C>(
        auth: &A,
        connector: &C,
        battle_id: &str,
    ) -> Result<Self, SessionError>
    where
        A: AuthProvider + ?Sized,
        C: BattleConnector + ?Sized,
    {
        let credential = acquire_credential(auth).await?;
        let channel = connector.open(battle_id, &credential).await.inspect_err(|e| {
            warn!(battle_id, error = %e, "failed to open battle channel");
        })?;
        info!(battle_id, "battle channel opened");
        Ok(Self::from_channel(battle_id, channel))
    }

    pub fn from_channel(battle_id: &str, channel: BattleChannel) -> Self {
        Self {
            battle_id: Arc::from(battle_id),
            inbound: channel.inbound,
            outbound: channel.outbound,
            shutdown: channel.shutdown,
            open: true,
            disposed: false,
            actions_sent: 0,
            messages_received: 0,
        }
    }

    pub fn battle_id(&self) -> &str {
        &self.battle_id
    }

    pub fn is_open(&self) -> bool {
        self.open && !self.outbound.is_closed()
    }

    /// Queues an action for the server. Returns false when the channel is not open.
    pub fn send(&mut self, action: Action) -> bool {
        if !self.is_open() {
            debug!(battle_id = %self.battle_id, ?action, "channel not open; action dropped");
            return false;
        }
        match self.outbound.send(action) {
            Ok(()) => {
                self.actions_sent += 1;
                true
            }
            Err(_) => {
                self.open = false;
                false
            }
        }
    }

    /// Next inbound item in arrival order. `None` once the transport side is gone.
    pub async fn recv(&mut self) -> Option<Inbound> {
        let inbound = self.inbound.recv().await;
        match &inbound {
            Some(Inbound::Snapshot(_)) | Some(Inbound::Event(_)) => self.messages_received += 1,
            Some(Inbound::Closed { .. }) | Some(Inbound::Failed { .. }) | None => {
                self.open = false;
            }
        }
        inbound
    }

    /// Closes the channel if it is not already closed. Pending sends are abandoned.
    pub fn close(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.open = false;
        self.shutdown.notify_one();
        self.inbound.close();
        info!(
            battle_id = %self.battle_id,
            actions_sent = self.actions_sent,
            messages_received = self.messages_received,
            "battle channel closed"
        );
    }

    pub fn actions_sent(&self) -> u64 {
        self.actions_sent
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.close();
    }
}
