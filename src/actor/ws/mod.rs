//! WebSocket Actor - Hot Reload Notifier
//!
//! Owns the connected clients and the bundle keys each of them last
//! reported:
//!
//! ```text
//! BuildActor --[Reload/Error]--> WsActor --[targeted/broadcast]--> Clients
//!     ^                                                              |
//!     +------------------[Redirected]------------ redirect/keys -----+
//! ```

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::{BuildMsg, WsMsg};
use crate::debug;
use crate::reload::{HotReloadMessage, RedirectEvent};

/// A registered WebSocket client with the keys it holds
struct RegisteredClient {
    ws: WebSocket<TcpStream>,
    /// Empty until the client reports its keys.
    keys: FxHashSet<String>,
    /// Redirect read during the handshake, forwarded by the reader thread.
    pending: Option<RedirectEvent>,
}

impl RegisteredClient {
    fn holds_any(&self, keys: &[String]) -> bool {
        self.keys.is_empty() || keys.iter().any(|k| self.keys.contains(k))
    }
}

type Clients = Arc<Mutex<Vec<RegisteredClient>>>;

pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Redirect events go back to the BuildActor
    build_tx: mpsc::Sender<BuildMsg>,
    clients: Clients,
    /// Last error, replayed to clients that connect while it is shown
    pending_error: Arc<Mutex<Option<(String, String)>>>,
    stop: Arc<AtomicBool>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>, build_tx: mpsc::Sender<BuildMsg>) -> Self {
        Self {
            rx,
            build_tx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: Arc::new(Mutex::new(None)),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        let clients = Arc::clone(&self.clients);
        let build_tx = self.build_tx.clone();
        let stop = Arc::clone(&self.stop);
        std::thread::Builder::new()
            .name("rebundle-ws-read".into())
            .spawn(move || Self::client_reader_loop(clients, build_tx, stop))
            .ok();

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload { keys } => {
                    debug!("ws"; "reload {}", keys.join(", "));
                    let text = HotReloadMessage::reload(keys.clone()).to_json();
                    self.send_keys(&keys, Message::Text(text.into()));
                }

                WsMsg::Error { path, error } => {
                    let text = HotReloadMessage::error(&path, &error).to_json();
                    *self.pending_error.lock() = Some((path, error));
                    self.broadcast(Message::Text(text.into()));
                }

                WsMsg::ClearError => {
                    *self.pending_error.lock() = None;
                    self.broadcast(Message::Text(HotReloadMessage::ClearError.to_json().into()));
                }

                WsMsg::AddClient(stream) => self.add_client(stream),

                WsMsg::Shutdown => {
                    debug!("ws"; "shutting down");
                    break;
                }
            }
        }

        self.stop.store(true, Ordering::SeqCst);
        for mut client in self.clients.lock().drain(..) {
            let _ = client.ws.close(None);
        }
    }
}

#[cfg(test)]
mod tests;
