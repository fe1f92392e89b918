//! Component source scanning.
//!
//! [`SourceParser`] does not build an AST. It extracts the three things the
//! pack pipeline needs from a source file:
//!
//! - the declared component name (`export default function Name`, ...),
//! - the framework it is written for,
//! - its local import closure.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ParseError;
use crate::utils::path::{COMPONENT_EXTENSIONS, is_component_source, normalize_path};

static DEFAULT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*export\s+default\s+(?:async\s+)?(?:function\s*\*?|class)\s+([A-Za-z_$][\w$]*)")
        .unwrap()
});

static DEFAULT_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*export\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$").unwrap()
});

static VUE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bname\s*:\s*['"]([A-Za-z_$][\w$-]*)['"]"#).unwrap());

static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:import|export)\s+(?:[\w$*{}\s,]+\s+from\s+)?['"]([^'"]+)['"]"#)
        .unwrap()
});

static DYNAMIC_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bimport\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// The UI framework a component is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Vue,
    Svelte,
    Unknown,
}

impl Framework {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Vue => "vue",
            Self::Svelte => "svelte",
            Self::Unknown => "unknown",
        }
    }

    /// Guess from the modules a plain `.js`/`.ts` file imports.
    fn from_specifiers<'a>(specifiers: impl IntoIterator<Item = &'a str>) -> Self {
        for specifier in specifiers {
            match specifier {
                "react" | "react-dom" | "react-dom/client" | "react/jsx-runtime" => {
                    return Self::React;
                }
                "vue" => return Self::Vue,
                "svelte" => return Self::Svelte,
                _ => {}
            }
        }
        Self::Unknown
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned component source.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute source path.
    pub path: PathBuf,
    pub name: String,
    pub framework: Framework,
    pub source: String,
    /// Every local file reachable through relative imports, the source
    /// itself excluded. Sorted and deduplicated.
    pub imports: Vec<PathBuf>,
}

pub trait Parse: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Document, ParseError>;
}

/// Regex-based scanner for component sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceParser;

impl Parse for SourceParser {
    fn parse(&self, path: &Path) -> Result<Document, ParseError> {
        if !is_component_source(path) {
            return Err(ParseError::Unsupported {
                path: path.to_path_buf(),
            });
        }

        let path = normalize_path(path);
        let source = fs::read_to_string(&path).map_err(|source| ParseError::Read {
            path: path.clone(),
            source,
        })?;
        if source.trim().is_empty() {
            return Err(ParseError::Empty { path });
        }

        let specifiers = import_specifiers(&source);
        let framework = detect_framework(&path, &specifiers);
        let name = declared_name(&source, framework).unwrap_or_else(|| file_stem(&path));

        let imports = import_closure(&path, &specifiers);

        Ok(Document {
            path,
            name,
            framework,
            source,
            imports,
        })
    }
}

fn detect_framework(path: &Path, specifiers: &[&str]) -> Framework {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsx" | "tsx") => Framework::React,
        Some("vue") => Framework::Vue,
        Some("svelte") => Framework::Svelte,
        _ => Framework::from_specifiers(specifiers.iter().copied()),
    }
}

fn declared_name(source: &str, framework: Framework) -> Option<String> {
    if let Some(caps) = DEFAULT_DECL.captures(source) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = DEFAULT_IDENT.captures(source)
        && !matches!(&caps[1], "function" | "class" | "async")
    {
        return Some(caps[1].to_string());
    }
    if framework == Framework::Vue {
        return VUE_NAME.captures(source).map(|caps| caps[1].to_string());
    }
    None
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn import_specifiers(source: &str) -> Vec<&str> {
    STATIC_IMPORT
        .captures_iter(source)
        .chain(DYNAMIC_IMPORT.captures_iter(source))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Follow relative imports from `root` until no new file turns up.
///
/// Only component sources are scanned further; stylesheets, JSON and other
/// imported files are leaves. Cycles terminate on the seen set.
fn import_closure(root: &Path, specifiers: &[&str]) -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    let mut pending = resolve_all(root, specifiers);

    while let Some(next) = pending.pop() {
        if next == root || !seen.insert(next.clone()) || !is_component_source(&next) {
            continue;
        }
        let Ok(source) = fs::read_to_string(&next) else {
            continue;
        };
        pending.extend(resolve_all(&next, &import_specifiers(&source)));
    }

    seen.into_iter().collect()
}

fn resolve_all(from: &Path, specifiers: &[&str]) -> Vec<PathBuf> {
    let base = from.parent().unwrap_or(Path::new("/"));
    specifiers
        .iter()
        .filter_map(|specifier| resolve_local(base, specifier))
        .collect()
}

/// Resolve a relative specifier the way a bundler would: exact file, then
/// each component extension, then an `index` file inside a directory.
fn resolve_local(base: &Path, specifier: &str) -> Option<PathBuf> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }

    let target = base.join(specifier);
    if target.is_file() {
        return Some(normalize_path(&target));
    }

    let file_name = target.file_name()?.to_string_lossy().into_owned();
    COMPONENT_EXTENSIONS
        .iter()
        .map(|ext| target.with_file_name(format!("{file_name}.{ext}")))
        .chain(
            COMPONENT_EXTENSIONS
                .iter()
                .map(|ext| target.join(format!("index.{ext}"))),
        )
        .find(|candidate| candidate.is_file())
        .map(|found| normalize_path(&found))
}
