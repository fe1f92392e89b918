//! Configuration sections.

mod build;
mod dev;

pub use build::{BuildSectionConfig, BundlerConfig, ENTRY_PLACEHOLDER, OUTPUT_PLACEHOLDER};
pub use dev::DevConfig;
