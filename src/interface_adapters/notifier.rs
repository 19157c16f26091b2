// Surfaces battle notifications to the terminal user through the log.

use crate::domain::ports::{Notification, Notifier};
use tracing::{error, info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::GameOver { reason } => info!(%reason, "game over"),
            Notification::ServerError { message } => error!(%message, "server error"),
            Notification::ChannelClosed { reason } => {
                warn!(reason = reason.as_deref().unwrap_or("none"), "connection closed")
            }
            Notification::ChannelFailed { error } => error!(%error, "connection failed"),
        }
    }
}
