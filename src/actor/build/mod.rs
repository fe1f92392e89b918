//! Build Actor
//!
//! Handles one message at a time, so change requests and redirect
//! rebuilds never overlap:
//!
//! - `Change`: run the change request processor, report, ack
//! - `Redirected`: diff the key sets, re-pack every changed key
//!   concurrently, join, then push one reload

mod handlers;

use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{BuildMsg, WsMsg};
use crate::change::Session;
use crate::debug;

pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    session: Arc<Session>,
    /// Last request failed; the next success clears the client overlay
    has_error: bool,
}

impl BuildActor {
    pub fn new(
        rx: mpsc::Receiver<BuildMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            rx,
            ws_tx,
            session,
            has_error: false,
        }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                BuildMsg::Change { path, kind, done } => {
                    self.handle_change(path, kind).await;
                    let _ = done.send(());
                }
                BuildMsg::Redirected(event) => self.handle_redirect(event).await,
                BuildMsg::Shutdown => {
                    debug!("build"; "shutting down");
                    break;
                }
            }
        }
        self.session.packer().close();
    }
}
