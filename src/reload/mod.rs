//! Hot reload: key diffing, redirect events, the client protocol and the
//! WebSocket listener.

pub mod diff;
pub mod message;
mod redirect;
pub mod server;

pub use diff::{Drift, KeyDrift, diff, diff_tagged};
pub use message::{ClientMessage, HotReloadMessage};
pub use redirect::RedirectEvent;
