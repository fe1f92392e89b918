//! WebSocket listener for hot reload clients.
//!
//! Accepted streams are handed to `WsActor`, which does the handshake and
//! owns them from then on.

use std::net::TcpListener;
use std::time::Duration;

use anyhow::Result;

use crate::actor::messages::WsMsg;
use crate::core::is_shutdown;
use crate::{debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Bind near `base_port` and forward accepted clients to the actor.
///
/// Returns the port actually bound.
pub fn start_ws_server(base_port: u16, ws_tx: tokio::sync::mpsc::Sender<WsMsg>) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::Builder::new()
        .name("rebundle-ws-accept".into())
        .spawn(move || {
            while !is_shutdown() {
                match listener.accept() {
                    Ok((stream, addr)) => {
                        debug!("reload"; "client connected: {}", addr);
                        let _ = stream.set_nonblocking(false);
                        if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                            // Actor gone: the dev session is shutting down.
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(ACCEPT_POLL);
                    }
                    Err(e) => {
                        log!("reload"; "accept error: {}", e);
                        std::thread::sleep(ACCEPT_POLL);
                    }
                }
            }
        })?;

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind hot reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_skips_taken_port() {
        let (taken, port) = try_bind_port(0, 1).unwrap();
        assert_ne!(port, 0);
        let (_second, second_port) = try_bind_port(port, 5).unwrap();
        assert_ne!(second_port, port);
        drop(taken);
    }
}
