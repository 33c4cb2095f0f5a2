//! Directive tags
//!
//! Every directive implements [`Tag`]: `matches` picks the nodes it owns,
//! `validate` runs once per tree before compilation and may only report
//! diagnostics (portals also register their placeholder), and `render`
//! appends the directive's instructions to the program being compiled.

mod cache;
mod component;
mod conditional;
mod element;
mod fragment;
mod loops;
mod portal;
mod raw;
mod script;

pub use cache::Cache;
pub use component::Component;
pub use conditional::Conditional;
pub use element::DynamicElement;
pub use fragment::Fragment;
pub use loops::Loop;
pub use portal::Portal;
pub use raw::RawHtml;
pub use script::ComponentScript;

use crate::cache::CacheStore;
use crate::diagnostics::{DiagnosticCategory, Diagnostics};
use crate::markup::{Node, NodeId, NodeKind, Tree, Visit};
use crate::renderer::{Compiler, Placeholder, Program};
use crate::RenderError;

/// Tags whose default element rendering is always suppressed
pub const DIRECTIVE_TAGS: &[&str] = &[
    "ssr-if",
    "ssr-elseif",
    "ssr-else",
    "ssr-for",
    "ssr-html",
    "ssr-element",
    "ssr-fragment",
    "ssr-portal",
    "ssr-slot",
    "ssr-cache",
    "ssr-script",
];

/// Uniform contract shared by all directives
pub trait Tag: Sync {
    /// Canonical tag name
    fn name(&self) -> &'static str;

    fn matches(&self, node: &Node) -> bool {
        node.tag == self.name()
    }

    /// Check a node before compilation; `false` removes it from the tree
    fn validate(&self, _tree: &mut Tree, _id: NodeId, _cx: &mut Validation<'_>) -> bool {
        true
    }

    /// Append instructions for this node
    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        out: &mut Program,
    ) -> Result<(), RenderError>;
}

/// Dispatch table
pub static TAGS: &[&dyn Tag] = &[
    &RawHtml,
    &Cache,
    &ComponentScript,
    &DynamicElement,
    &Conditional,
    &Loop,
    &Fragment,
    &Portal,
    &Component,
];

/// First directive that claims `node`
pub fn find(node: &Node) -> Option<&'static dyn Tag> {
    TAGS.iter().copied().find(|tag| tag.matches(node))
}

pub fn is_directive(node: &Node) -> bool {
    DIRECTIVE_TAGS.contains(&node.tag.as_str()) || ComponentScript.matches(node)
}

/// State available to `validate`
pub struct Validation<'a> {
    pub diagnostics: &'a mut Diagnostics,
    /// Store consulted by `<ssr-cache>`; absent when checking a master template
    pub cache: Option<&'a CacheStore>,
    /// Portal placeholders; absent when checking a master template
    pub portals: Option<&'a mut Vec<Placeholder>>,
}

impl<'a> Validation<'a> {
    /// Diagnostics only, for templates at registration time
    pub fn check(diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            diagnostics,
            cache: None,
            portals: None,
        }
    }

    /// Full validation of a tree about to be rendered
    pub fn render(
        diagnostics: &'a mut Diagnostics,
        cache: &'a CacheStore,
        portals: &'a mut Vec<Placeholder>,
    ) -> Self {
        Self {
            diagnostics,
            cache: Some(cache),
            portals: Some(portals),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.diagnostics.push(DiagnosticCategory::Directive, message);
    }
}

/// Validation pass over the descendants of `root`
///
/// Directive nodes become INVISIBLE. Nodes failing validation are detached
/// once the walk is complete. `<ssr-html>` content is not descended into,
/// so directive-like tags inside it stay literal.
pub fn validate_tree(tree: &mut Tree, root: NodeId, cx: &mut Validation<'_>) {
    let mut visited = Vec::new();
    tree.traverse(root, |id, node| {
        visited.push(id);
        if RawHtml.matches(node) {
            Visit::Skip
        } else {
            Visit::Continue
        }
    });

    let mut failed = Vec::new();
    for id in visited {
        if is_directive(tree.get(id)) {
            tree.get_mut(id).kind = NodeKind::Invisible;
        }
        if let Some(tag) = find(tree.get(id)) {
            if !tag.validate(tree, id, cx) {
                failed.push(id);
            }
        }
    }

    for id in failed {
        tree.detach(id);
    }
}
