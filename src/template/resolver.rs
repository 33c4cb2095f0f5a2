//! Component expansion - turns an instance element into a populated template clone

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::diagnostics::DiagnosticCategory;
use crate::markup::{NodeId, NodeKind, Tree, Visit};
use crate::tags::{self, Tag, Validation};

use super::registry::TemplateRegistry;

/// Name of the slot receiving un-targeted instance content
pub const DEFAULT_SLOT: &str = "default";

/// Chain of components currently being expanded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    resolving: Vec<String>,
}

impl ResolutionContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a component is currently being expanded (recursion detection)
    pub fn is_resolving(&self, name: &str) -> bool {
        self.resolving.iter().any(|n| n == name)
    }

    /// Mark a component as being expanded
    pub fn start_resolving(&mut self, name: &str) {
        self.resolving.push(name.to_string());
    }

    /// Mark the innermost component as done
    pub fn done_resolving(&mut self) {
        self.resolving.pop();
    }

    /// Innermost component being expanded
    pub fn current(&self) -> Option<&str> {
        self.resolving.last().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.resolving.len()
    }
}

/// Result of expanding one instance
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Unattached INVISIBLE root holding the populated template
    pub root: NodeId,
    /// Body of the template's `<script context="component">`, if any
    pub script: Option<String>,
}

/// Expand a component instance into a fresh template clone
///
/// The clone is validated in render mode, self-recursion that is not
/// gated by `<ssr-if>`/`<ssr-for>` is pruned, and the instance's content is
/// routed into slots. Returns `None` when no template is registered.
pub fn expand(
    tree: &mut Tree,
    templates: &TemplateRegistry,
    instance: NodeId,
    cx: &mut Validation<'_>,
) -> Option<Expansion> {
    let name = tree.get(instance).tag.clone();
    let root = templates.clone_template(&name, tree)?;
    tree.get_mut(root).kind = NodeKind::Invisible;

    tags::validate_tree(tree, root, cx);
    prune_recursion(tree, root, &name, cx);

    let slots = collect_slots(tree, root);
    route_content(tree, instance, &slots, cx);
    let script = extract_script(tree, root);

    tracing::debug!(component = %name, slots = slots.len(), "expanded component");
    Some(Expansion { root, script })
}

/// Remove ungated occurrences of the component inside its own template
fn prune_recursion(tree: &mut Tree, root: NodeId, name: &str, cx: &mut Validation<'_>) {
    let mut recursive = Vec::new();
    tree.traverse(root, |id, node| {
        if tags::Conditional.matches(node) || tags::Loop.matches(node) || tags::RawHtml.matches(node) {
            return Visit::Skip;
        }
        if node.tag == name && node.kind != NodeKind::Invisible {
            recursive.push(id);
            return Visit::Skip;
        }
        Visit::Continue
    });

    for id in recursive {
        tree.detach(id);
        cx.diagnostics.push(
            DiagnosticCategory::Component,
            format!("<{}> infinite nested loop", name),
        );
    }
}

/// Slot anchors by name; the first anchor of a name wins
fn collect_slots(tree: &Tree, root: NodeId) -> IndexMap<String, NodeId> {
    let mut slots = IndexMap::new();
    tree.traverse(root, |id, node| {
        if tags::RawHtml.matches(node) {
            return Visit::Skip;
        }
        if node.tag == "ssr-slot" && node.kind == NodeKind::Invisible {
            let name = node.attr("name").filter(|n| !n.is_empty()).unwrap_or(DEFAULT_SLOT);
            slots.entry(name.to_string()).or_insert(id);
        }
        Visit::Continue
    });
    slots
}

fn is_slot_fragment(tree: &Tree, id: NodeId) -> bool {
    let node = tree.get(id);
    tags::Fragment.matches(node)
        && node.kind == NodeKind::Invisible
        && node.has_attr("slot")
        && !node.has_attr("portal")
}

/// Move the instance's content into the clone's slots
///
/// Slot fragments anywhere in the instance (outside nested components)
/// target their named slot; every other top-level child goes to the
/// default slot. The first assignment to a slot discards its fallback.
fn route_content(
    tree: &mut Tree,
    instance: NodeId,
    slots: &IndexMap<String, NodeId>,
    cx: &mut Validation<'_>,
) {
    let mut fragments = Vec::new();
    tree.traverse(instance, |id, node| {
        if tags::Component.matches(node) || tags::RawHtml.matches(node) {
            return Visit::Skip;
        }
        if is_slot_fragment(tree, id) {
            fragments.push(id);
            return Visit::Skip;
        }
        Visit::Continue
    });

    let default_content: Vec<NodeId> = tree
        .children(instance)
        .iter()
        .copied()
        .filter(|id| !fragments.contains(id))
        .collect();

    let mut assigned = HashSet::new();
    let mut assign = |tree: &mut Tree, slot: NodeId, name: &str, content: &[NodeId]| {
        if assigned.insert(name.to_string()) {
            tree.clear(slot);
        }
        for &child in content {
            tree.append(slot, child);
        }
    };

    for fragment in fragments {
        let name = tree.get(fragment).attr("slot").unwrap_or_default().to_string();
        match slots.get(&name) {
            Some(&slot) => {
                let content = tree.children(fragment).to_vec();
                assign(tree, slot, &name, &content);
            }
            None => cx.warn(format!("<ssr-fragment slot=\"{}\"> has no matching slot", name)),
        }
        tree.detach(fragment);
    }

    let has_content = default_content.iter().any(|&id| {
        let node = tree.get(id);
        node.kind != NodeKind::Text || !node.raw.trim().is_empty()
    });
    if has_content {
        if let Some(&slot) = slots.get(DEFAULT_SLOT) {
            assign(tree, slot, DEFAULT_SLOT, &default_content);
        }
    }
}

/// Detach the first top-level component script and return its body
fn extract_script(tree: &mut Tree, root: NodeId) -> Option<String> {
    let script = tree
        .children(root)
        .iter()
        .copied()
        .find(|&id| tags::ComponentScript.matches(tree.get(id)))?;
    let source = tree
        .children(script)
        .iter()
        .map(|&child| tree.get(child).raw.as_str())
        .collect::<String>();
    tree.detach(script);
    Some(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::markup::parse;
    use crate::renderer::Placeholder;
    use crate::cache::CacheStore;

    fn registry(templates: &[(&str, &str)]) -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        for (name, markup) in templates {
            registry.register(name, markup).expect("Should register");
        }
        registry
    }

    fn expand_first(
        markup: &str,
        registry: &TemplateRegistry,
    ) -> (Tree, Option<Expansion>, Vec<String>) {
        let mut tree = parse(markup);
        let root = tree.root();
        let instance = tree.children(root)[0];
        let mut diagnostics = Diagnostics::new();
        let cache = CacheStore::new();
        let mut portals: Vec<Placeholder> = Vec::new();
        let mut cx = Validation::render(&mut diagnostics, &cache, &mut portals);
        tags::validate_tree(&mut tree, root, &mut cx);
        let expansion = expand(&mut tree, registry, instance, &mut cx);
        let messages = diagnostics.iter().map(|d| d.message.clone()).collect();
        (tree, expansion, messages)
    }

    #[test]
    fn test_context_tracks_chain() {
        let mut ctx = ResolutionContext::new();
        ctx.start_resolving("my-list");
        ctx.start_resolving("my-item");
        assert!(ctx.is_resolving("my-list"));
        assert_eq!(ctx.current(), Some("my-item"));
        ctx.done_resolving();
        assert_eq!(ctx.depth(), 1);
        assert!(!ctx.is_resolving("my-item"));
    }

    #[test]
    fn test_unknown_template() {
        let (_, expansion, _) = expand_first("<my-card></my-card>", &TemplateRegistry::new());
        assert!(expansion.is_none());
    }

    #[test]
    fn test_default_and_named_slots() {
        let registry = registry(&[(
            "my-card",
            r#"<h2><ssr-slot name="title">Untitled</ssr-slot></h2><ssr-slot></ssr-slot><ssr-slot name="foot">Foot</ssr-slot>"#,
        )]);
        let (tree, expansion, _) = expand_first(
            r#"<my-card><fragment slot="title">Hi</fragment><p>Body</p></my-card>"#,
            &registry,
        );
        let expansion = expansion.expect("Should expand");
        let markup = tree.to_markup(expansion.root);
        assert!(markup.contains(">Hi</ssr-slot>"), "got: {}", markup);
        assert!(markup.contains("<p>Body</p>"), "got: {}", markup);
        assert!(markup.contains(">Foot</ssr-slot>"), "got: {}", markup);
        assert!(!markup.contains("Untitled"));
    }

    #[test]
    fn test_ungated_recursion_is_pruned() {
        let registry = registry(&[("my-loop", "<p>x</p><my-loop></my-loop>")]);
        let (tree, expansion, messages) = expand_first("<my-loop></my-loop>", &registry);
        let expansion = expansion.expect("Should expand");
        assert!(!tree.to_markup(expansion.root).contains("<my-loop>"));
        assert_eq!(messages, vec!["<my-loop> infinite nested loop"]);
    }

    #[test]
    fn test_gated_recursion_is_kept() {
        let registry = registry(&[(
            "my-tree",
            r#"<ssr-if condition="depth > 0"><my-tree depth="{{depth - 1}}"></my-tree></ssr-if>"#,
        )]);
        let (tree, expansion, messages) = expand_first("<my-tree depth=\"2\"></my-tree>", &registry);
        let expansion = expansion.expect("Should expand");
        assert!(tree.to_markup(expansion.root).contains("<my-tree"));
        assert!(messages.is_empty());
    }

    #[test]
    fn test_script_is_extracted() {
        let registry = registry(&[(
            "my-greet",
            r#"<script context="component">const who = 'world'</script><p>{{who}}</p>"#,
        )]);
        let (tree, expansion, _) = expand_first("<my-greet/>", &registry);
        let expansion = expansion.expect("Should expand");
        assert_eq!(expansion.script.as_deref(), Some("const who = 'world'"));
        assert!(!tree.to_markup(expansion.root).contains("script"));
    }

    #[test]
    fn test_whitespace_keeps_fallback() {
        let registry = registry(&[("my-box", "<div><ssr-slot>Empty</ssr-slot></div>")]);
        let (tree, expansion, _) = expand_first("<my-box>\n  </my-box>", &registry);
        let expansion = expansion.expect("Should expand");
        assert!(tree.to_markup(expansion.root).contains("Empty"));
    }
}
