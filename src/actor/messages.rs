//! Actor message definitions.
//!
//! ```text
//! FsActor --Change--> BuildActor --Reload--> WsActor
//!                         ^                     |
//!                         +-----Redirected------+
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use tokio::sync::oneshot;

pub use super::fs::ChangeKind;
use crate::reload::RedirectEvent;

/// Messages to BuildActor
#[derive(Debug)]
pub enum BuildMsg {
    /// One debounced file change. `done` fires once it is fully handled.
    Change {
        path: PathBuf,
        kind: ChangeKind,
        done: oneshot::Sender<()>,
    },
    /// A client moved between bundle key sets
    Redirected(RedirectEvent),
    Shutdown,
}

/// Messages to WsActor
#[derive(Debug)]
pub enum WsMsg {
    /// Artifacts for these keys changed
    Reload { keys: Vec<String> },
    /// Build error (display overlay, no reload)
    Error { path: String, error: String },
    /// Clear error overlay (build succeeded after error)
    ClearError,
    AddClient(TcpStream),
    Shutdown,
}
