//! Component packing: parse, wrap, bundle.
//!
//! # Module Structure
//!
//! ```text
//! pack/
//! ├── parse      # Parse trait, SourceParser, Document, Framework
//! ├── wrap       # Wrap trait, React/Vue entry wrappers, WrapperSet
//! ├── key        # Content-derived BundleKey
//! ├── bundle     # Bundle trait, CommandBundler
//! ├── hook       # SyncHook timing wrapper
//! ├── component  # PackedComponent
//! └── packer     # Packer::pack_one / pack_many, PackSession
//! ```

mod bundle;
mod component;
mod error;
pub mod hook;
mod key;
mod parse;
pub mod packer;
mod wrap;

#[cfg(test)]
pub(crate) mod testing;

pub use bundle::{Bundle, BundleOutput, CommandBundler};
pub use component::{PackedComponent, WrapStats};
pub use error::{BundleError, PackError, ParseError, WrapError};
pub use hook::SyncHook;
pub use key::BundleKey;
pub use packer::{PackFailure, PackReport, PackSession, Packer};
pub use parse::{Document, Framework, Parse, SourceParser};
pub use wrap::{ReactWrapper, VueWrapper, Wrap, WrappedDocument, WrapperSet};
