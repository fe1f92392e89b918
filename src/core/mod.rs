//! Core types shared across the codebase.

mod mode;
mod state;

pub use mode::BundlerMode;
pub use state::{is_shutdown, register_shutdown, setup_shutdown_handler};
