//! Actor system for dev mode.
//!
//! ```text
//! FsActor ──Change──▶ BuildActor ──Reload/Error──▶ WsActor ◀──▶ clients
//! (watch, tick)       (pack)         ▲                │
//!                                    └──Redirected────┘
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File watcher with tick-driven debouncing
//! - `build` - Change request and redirect processing
//! - `ws` - WebSocket clients and delivery
//! - `coordinator` - Wires up and runs actors

pub mod build;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
