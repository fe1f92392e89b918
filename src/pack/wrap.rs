//! Framework entry-module wrappers.
//!
//! A wrapper turns a component into a standalone entry module that mounts
//! (hydrates) it into `#root` with the props the page embedded in
//! `window.__PROPS__`.

use std::path::{Path, PathBuf};

use super::{Document, Framework, WrapError};

/// Entry module source generated for one component.
#[derive(Debug, Clone)]
pub struct WrappedDocument {
    pub name: String,
    pub framework: Framework,
    pub source_path: PathBuf,
    pub entry: String,
}

pub trait Wrap: Send + Sync {
    fn framework(&self) -> Framework;
    fn wrap(&self, document: &Document) -> Result<WrappedDocument, WrapError>;
}

/// `react-dom/client` hydration entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReactWrapper;

impl Wrap for ReactWrapper {
    fn framework(&self) -> Framework {
        Framework::React
    }

    fn wrap(&self, document: &Document) -> Result<WrappedDocument, WrapError> {
        let import = js_string(&document.path);
        let entry = format!(
            "import React from \"react\";\n\
             import {{ hydrateRoot }} from \"react-dom/client\";\n\
             import __Component from {import};\n\
             \n\
             hydrateRoot(\n  \
               document.getElementById(\"root\"),\n  \
               React.createElement(__Component, window.__PROPS__ ?? {{}})\n\
             );\n"
        );
        Ok(wrapped(document, Framework::React, entry))
    }
}

/// Vue 3 `createApp` entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct VueWrapper;

impl Wrap for VueWrapper {
    fn framework(&self) -> Framework {
        Framework::Vue
    }

    fn wrap(&self, document: &Document) -> Result<WrappedDocument, WrapError> {
        let import = js_string(&document.path);
        let entry = format!(
            "import {{ createApp }} from \"vue\";\n\
             import __Component from {import};\n\
             \n\
             createApp(__Component, window.__PROPS__ ?? {{}}).mount(\"#root\");\n"
        );
        Ok(wrapped(document, Framework::Vue, entry))
    }
}

fn wrapped(document: &Document, framework: Framework, entry: String) -> WrappedDocument {
    WrappedDocument {
        name: document.name.clone(),
        framework,
        source_path: document.path.clone(),
        entry,
    }
}

/// Quote a path as a JS string literal (JSON escaping is valid JS).
fn js_string(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    serde_json::to_string(&raw).unwrap_or_else(|_| format!("\"{raw}\""))
}

/// The enabled wrappers, one per framework.
#[derive(Default)]
pub struct WrapperSet {
    wrappers: Vec<Box<dyn Wrap>>,
}

impl WrapperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in wrappers for the given frameworks; others are skipped.
    pub fn from_frameworks(frameworks: &[Framework]) -> Self {
        frameworks
            .iter()
            .fold(Self::new(), |set, framework| match framework {
                Framework::React => set.with(ReactWrapper),
                Framework::Vue => set.with(VueWrapper),
                Framework::Svelte | Framework::Unknown => set,
            })
    }

    /// Register a wrapper, replacing any previous one for its framework.
    pub fn with(mut self, wrapper: impl Wrap + 'static) -> Self {
        let framework = wrapper.framework();
        self.wrappers.retain(|w| w.framework() != framework);
        self.wrappers.push(Box::new(wrapper));
        self
    }

    pub fn select(&self, framework: Framework) -> Option<&dyn Wrap> {
        self.wrappers
            .iter()
            .find(|w| w.framework() == framework)
            .map(|w| w.as_ref())
    }

    /// Wrap with the wrapper for the document's framework.
    pub fn wrap(&self, document: &Document) -> Result<WrappedDocument, WrapError> {
        match self.select(document.framework) {
            Some(wrapper) => wrapper.wrap(document),
            None if document.framework == Framework::Unknown => Err(WrapError::UnknownFramework {
                name: document.name.clone(),
            }),
            None => Err(WrapError::NoWrapper {
                framework: document.framework,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(framework: Framework) -> Document {
        Document {
            path: PathBuf::from("/site/web/pages/Home.jsx"),
            name: "Home".into(),
            framework,
            source: "export default function Home() {}".into(),
            imports: vec![],
        }
    }

    #[test]
    fn test_react_entry() {
        let wrapped = ReactWrapper.wrap(&document(Framework::React)).unwrap();
        assert!(wrapped.entry.contains("import __Component from \"/site/web/pages/Home.jsx\";"));
        assert!(wrapped.entry.contains("hydrateRoot("));
        assert!(wrapped.entry.contains("window.__PROPS__ ?? {}"));
        assert_eq!(wrapped.name, "Home");
    }

    #[test]
    fn test_vue_entry() {
        let wrapped = VueWrapper.wrap(&document(Framework::Vue)).unwrap();
        assert!(wrapped.entry.contains("createApp(__Component, window.__PROPS__ ?? {})"));
        assert!(wrapped.entry.contains(".mount(\"#root\")"));
    }

    #[test]
    fn test_select_by_framework() {
        let set = WrapperSet::from_frameworks(&[Framework::React, Framework::Svelte]);
        assert!(set.select(Framework::React).is_some());
        assert!(set.select(Framework::Vue).is_none());

        assert!(matches!(
            set.wrap(&document(Framework::Svelte)),
            Err(WrapError::NoWrapper { framework: Framework::Svelte })
        ));
        assert!(matches!(
            set.wrap(&document(Framework::Unknown)),
            Err(WrapError::UnknownFramework { .. })
        ));
    }

    #[test]
    fn test_with_replaces_same_framework() {
        let set = WrapperSet::new().with(ReactWrapper).with(ReactWrapper);
        assert_eq!(set.wrappers.len(), 1);
    }
}
