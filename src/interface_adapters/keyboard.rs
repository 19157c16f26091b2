// Terminal key source: whitespace-separated key names read line by line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Forwards every key name from `reader` until EOF or until the receiver is gone.
pub async fn pump_keys<R>(reader: R, keys: mpsc::Sender<String>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "key source read failed");
                break;
            }
        };
        for key in line.split_whitespace() {
            if keys.send(key.to_string()).await.is_err() {
                return;
            }
        }
    }
    debug!("key source exhausted");
}

pub fn spawn_stdin_keys(keys: mpsc::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(pump_keys(BufReader::new(tokio::io::stdin()), keys))
}
