//! Content-derived bundle keys.
//!
//! A key is `<name-slug>_<16 hex>`, where the hex digest is blake3 over:
//!
//! - the component source,
//! - the content of every file in its local import closure,
//! - the wrapper framework,
//! - the bundler mode.
//!
//! Unchanged inputs give the same key in any session, so an existing
//! artifact for a key can be reused as is.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Document, Framework};
use crate::core::BundlerMode;

const KEY_DOMAIN: &[u8] = b"rebundle bundle key v1";
const DIGEST_CHARS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleKey(String);

impl BundleKey {
    pub fn compute(document: &Document, framework: Framework, mode: BundlerMode) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(KEY_DOMAIN);
        hasher.update(document.source.as_bytes());
        for import in &document.imports {
            hasher.update(&hash_file(import));
        }
        hasher.update(framework.as_str().as_bytes());
        hasher.update(mode.as_str().as_bytes());

        let digest = hex::encode(hasher.finalize().as_bytes());
        Self(format!("{}_{}", slug(&document.name), &digest[..DIGEST_CHARS]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a key string received from a client.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BundleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lowercase `[a-z0-9-]` slug of a component name.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "component".to_string()
    } else {
        trimmed.to_string()
    }
}

/// blake3 of a file's content; unreadable files hash as all zeros.
fn hash_file(path: &Path) -> [u8; 32] {
    let Ok(file) = File::open(path) else {
        return [0; 32];
    };

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return [0; 32],
        }
    }
    *hasher.finalize().as_bytes()
}
