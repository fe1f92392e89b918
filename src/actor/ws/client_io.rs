use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::delivery::still_connected;
use super::{Clients, RegisteredClient, WsActor};
use crate::actor::messages::BuildMsg;
use crate::reload::{ClientMessage, HotReloadMessage, RedirectEvent};
use crate::{debug, log};

const READ_POLL: Duration = Duration::from_millis(100);

impl WsActor {
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Blocking during the handshake, non-blocking afterwards for polling reads
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                log!("ws"; "handshake failed: {}", e);
                return;
            }
        };
        let _ = ws.get_ref().set_nonblocking(true);

        let connected = HotReloadMessage::connected().to_json();
        if let Err(e) = ws.send(Message::Text(connected.into())) {
            log!("ws"; "failed to send connected message: {}", e);
            return;
        }

        if let Some((path, error)) = self.pending_error.lock().as_ref() {
            let text = HotReloadMessage::error(path, error).to_json();
            if let Err(e) = ws.send(Message::Text(text.into())) {
                log!("ws"; "failed to send pending error: {}", e);
            }
        }

        // Clients report their keys on open; pick that up before the first reload.
        let mut keys = FxHashSet::default();
        let pending =
            try_read_initial(&mut ws).and_then(|text| apply_client_message(&mut keys, &text));

        let mut clients = self.clients.lock();
        debug!("ws"; "client connected (total: {}, keys: {})", clients.len() + 1, keys.len());
        clients.push(RegisteredClient { ws, keys, pending });
    }

    /// Poll every client, update the keys it holds, and forward redirects.
    pub(super) fn client_reader_loop(
        clients: Clients,
        build_tx: mpsc::Sender<BuildMsg>,
        stop: Arc<AtomicBool>,
    ) {
        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(READ_POLL);

            // Collected under the lock, sent after releasing it.
            let mut redirects = Vec::new();
            {
                let mut guard = clients.lock();
                guard.retain_mut(|client| {
                    redirects.extend(client.pending.take());
                    if !still_connected(client.ws.flush()) {
                        return false;
                    }
                    read_client(client, &mut redirects)
                });
            }

            for event in redirects {
                if build_tx.blocking_send(BuildMsg::Redirected(event)).is_err() {
                    return;
                }
            }
        }
    }
}

/// Read one frame from a client; false once it is gone.
fn read_client(client: &mut RegisteredClient, redirects: &mut Vec<RedirectEvent>) -> bool {
    match client.ws.read() {
        Ok(Message::Text(text)) => {
            redirects.extend(apply_client_message(&mut client.keys, &text));
            true
        }
        Ok(Message::Close(_)) => false,
        Ok(_) => true,
        Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => true,
        Err(e) => {
            debug!("ws"; "client disconnected: {}", e);
            false
        }
    }
}

/// Apply one client text frame to its key set.
///
/// Returns the redirect to forward, if the frame was one that changes keys.
pub(super) fn apply_client_message(
    keys: &mut FxHashSet<String>,
    text: &str,
) -> Option<RedirectEvent> {
    let Some(msg) = ClientMessage::from_json(text) else {
        debug!("ws"; "ignored client message: {}", text);
        return None;
    };
    *keys = msg.keys().iter().cloned().collect();
    msg.into_redirect().filter(|event| !event.is_noop())
}

fn try_read_initial(ws: &mut WebSocket<TcpStream>) -> Option<String> {
    for _ in 0..5 {
        match ws.read() {
            Ok(Message::Text(text)) => return Some(text.to_string()),
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(5));
            }
            _ => break,
        }
    }
    None
}
