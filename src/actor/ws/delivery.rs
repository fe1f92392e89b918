use std::io::ErrorKind;

use tungstenite::protocol::Message;

use super::WsActor;
use crate::debug;

impl WsActor {
    pub(super) fn broadcast(&self, msg: Message) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|client| still_connected(client.ws.send(msg.clone())));
        debug!("ws"; "broadcast to {} clients", clients.len());
    }

    /// Send to clients holding any of `keys`, and to clients that have not
    /// reported keys yet.
    pub(super) fn send_keys(&self, keys: &[String], msg: Message) {
        let mut clients = self.clients.lock();
        let mut sent = 0;

        clients.retain_mut(|client| {
            if !client.holds_any(keys) {
                return true;
            }
            let kept = still_connected(client.ws.send(msg.clone()));
            if kept {
                sent += 1;
            }
            kept
        });

        if sent > 0 {
            debug!("ws"; "sent to {} of {} clients", sent, clients.len());
        }
    }
}

/// Whether a client survives a send or flush.
///
/// Sockets are non-blocking: on `WouldBlock` the frame stays in the write
/// buffer and goes out on the reader thread's next flush.
pub(super) fn still_connected(result: tungstenite::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => true,
        Err(e) => {
            debug!("ws"; "client disconnected: {}", e);
            false
        }
    }
}
