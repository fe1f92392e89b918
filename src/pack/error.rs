//! Error types for the pack pipeline.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::Framework;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` is not a component source", path.display())]
    Unsupported { path: PathBuf },

    #[error("`{}` is empty", path.display())]
    Empty { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum WrapError {
    #[error("no wrapper enabled for {framework} components")]
    NoWrapper { framework: Framework },

    #[error("cannot tell which framework `{name}` is written for")]
    UnknownFramework { name: String },
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundler `{program}` is not installed")]
    MissingTool { program: String },

    #[error("bundler exited with {}:\n{stderr}", status.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    Failed { status: Option<i32>, stderr: String },

    #[error("bundler did not finish within {after:?}")]
    TimedOut { after: Duration },

    #[error("bundler produced no output for `{}`", path.display())]
    IncompleteArtifact { path: PathBuf },

    #[error("io error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A failed pack of one source file.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to parse `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("failed to wrap `{}`", path.display())]
    Wrap {
        path: PathBuf,
        #[source]
        source: WrapError,
    },

    #[error("failed to bundle `{}`", path.display())]
    Bundle {
        path: PathBuf,
        #[source]
        source: BundleError,
    },
}

impl PackError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Parse { path, .. } | Self::Wrap { path, .. } | Self::Bundle { path, .. } => path,
        }
    }

    /// Full message including the cause chain, one cause per line.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str("\n  caused by: ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
