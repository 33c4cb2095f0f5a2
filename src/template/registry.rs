//! Template registry for storing parsed component templates

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::markup::{self, NodeId, Tree};
use crate::tags::{self, Validation};

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Name is not a lowercase custom element name
    #[error("Invalid template name: \"{name}\"")]
    InvalidName { name: String },

    /// Error reading template file
    #[error("error reading template file {path}: {message}")]
    FileReadError { path: PathBuf, message: String },
}

/// Registry mapping component names to master trees
///
/// Masters are never rendered directly; every expansion imports a fresh
/// copy into the render's own tree.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Tree>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a name against the custom element convention
    ///
    /// Names start with `[a-z]`, contain a `-`, use only `[a-z0-9_-]`,
    /// do not end in `-`, and never claim the `ssr-` directive prefix.
    pub fn is_valid_name(name: &str) -> bool {
        let starts_lower = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        starts_lower
            && name.contains('-')
            && !name.ends_with('-')
            && !name.starts_with("ssr-")
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    }

    /// Parse, validate and store a template, replacing any previous one
    pub fn register(&mut self, name: &str, markup: &str) -> Result<(), TemplateError> {
        if !Self::is_valid_name(name) {
            return Err(TemplateError::InvalidName {
                name: name.to_string(),
            });
        }

        let mut tree = markup::parse(markup);
        let root = tree.root();
        let mut diagnostics = Diagnostics::new();
        tags::validate_tree(&mut tree, root, &mut Validation::check(&mut diagnostics));
        tracing::debug!(template = name, warnings = diagnostics.len(), "registered template");

        self.templates.insert(name.to_string(), tree);
        Ok(())
    }

    /// Register every `*.html` file in a directory, named by file stem
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, TemplateError> {
        let read_error = |path: &Path, e: std::io::Error| TemplateError::FileReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| read_error(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
            .collect();
        paths.sort();

        for path in &paths {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let markup = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
            self.register(&name, &markup)?;
        }
        Ok(paths.len())
    }

    /// Get a master tree by name
    pub fn get(&self, name: &str) -> Option<&Tree> {
        self.templates.get(name)
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Import a deep copy of the named template's root into `tree`
    ///
    /// The copy is unattached; its root keeps the ROOT kind of the master.
    pub fn clone_template(&self, name: &str, tree: &mut Tree) -> Option<NodeId> {
        let master = self.templates.get(name)?;
        Some(tree.import(master, master.root()))
    }

    /// Get all template names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::NodeKind;

    #[test]
    fn test_valid_names() {
        for name in ["my-card", "s-1", "my_card-2", "a-b-c"] {
            assert!(TemplateRegistry::is_valid_name(name), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["card", "My-card", "my-", "-my", "ssr-card", "my card", "1-card", ""] {
            assert!(!TemplateRegistry::is_valid_name(name), "{}", name);
        }
    }

    #[test]
    fn test_register_rejects_invalid_name() {
        let mut registry = TemplateRegistry::new();
        let result = registry.register("card", "<div/>");
        assert!(matches!(result, Err(TemplateError::InvalidName { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_clone() {
        let mut registry = TemplateRegistry::new();
        registry.register("my-card", "<div>{{title}}</div>").expect("Should register");
        assert!(registry.contains("my-card"));

        let mut tree = Tree::new();
        let copy = registry.clone_template("my-card", &mut tree).expect("Should clone");
        assert_eq!(tree.get(copy).kind, NodeKind::Root);
        assert_eq!(tree.get(copy).parent, None);
        assert_eq!(tree.to_markup(copy), "<div>{{title}}</div>");
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = TemplateRegistry::new();
        registry.register("my-card", "<p>one</p>").expect("Should register");
        registry.register("my-card", "<p>two</p>").expect("Should register");
        assert_eq!(registry.len(), 1);
        let master = registry.get("my-card").expect("Should exist");
        assert_eq!(master.to_markup(master.root()), "<p>two</p>");
    }

    #[test]
    fn test_register_drops_invalid_directives() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("my-card", "<ssr-if>never</ssr-if><p>kept</p>")
            .expect("Should register");
        let master = registry.get("my-card").expect("Should exist");
        assert_eq!(master.to_markup(master.root()), "<p>kept</p>");
    }

    #[test]
    fn test_clone_unknown_template() {
        let registry = TemplateRegistry::new();
        let mut tree = Tree::new();
        assert!(registry.clone_template("my-card", &mut tree).is_none());
    }
}
