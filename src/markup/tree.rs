//! Arena-backed markup tree
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`].
//! Detaching a node unlinks it from its parent but leaves it in the arena,
//! so handles held by a caller stay valid for the lifetime of the tree.

use indexmap::IndexMap;

/// Handle to a node inside a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element,
    Void,
    Text,
    Comment,
    /// Content kept verbatim (script, style, svg, textarea)
    Opaque,
    /// Closing tag with no matching open element
    Stray,
    /// Directive whose default element rendering is suppressed
    Invisible,
}

/// A markup node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Normalized tag name
    pub tag: String,
    /// Tag name as authored
    pub tag_raw: String,
    pub attributes: IndexMap<String, String>,
    /// Text payload for TEXT / COMMENT / STRAY nodes
    pub raw: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            tag_raw: String::new(),
            attributes: IndexMap::new(),
            raw: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::new(NodeKind::Text)
        }
    }

    pub fn comment(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::new(NodeKind::Comment)
        }
    }

    pub fn element(kind: NodeKind, tag_raw: impl Into<String>) -> Self {
        let tag_raw = tag_raw.into();
        Self {
            tag: super::canonical_tag(&tag_raw),
            tag_raw,
            ..Self::new(kind)
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}

/// Traversal control returned by a visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Do not descend into this node's children
    Skip,
}

/// Markup tree with a single ROOT node
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Add an unattached node to the arena
    pub fn create(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Unlink a node from its parent
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` at `index` among `parent`'s children
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Put `replacement` where `target` is and detach `target`
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) {
        let Some(parent) = self.nodes[target.0].parent else {
            return;
        };
        self.detach(replacement);
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == target);
        if let Some(position) = position {
            self.nodes[parent.0].children[position] = replacement;
            self.nodes[replacement.0].parent = Some(parent);
            self.nodes[target.0].parent = None;
        }
    }

    /// Detach every child of `id`
    pub fn clear(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Pre-order walk over the descendants of `start`
    pub fn traverse<F>(&self, start: NodeId, mut visitor: F)
    where
        F: FnMut(NodeId, &Node) -> Visit,
    {
        let mut stack: Vec<NodeId> = self.nodes[start.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if visitor(id, node) == Visit::Continue {
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    /// First descendant of `start` (pre-order) matching `predicate`
    pub fn find<P>(&self, start: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Node) -> bool,
    {
        let mut found = None;
        self.traverse(start, |id, node| {
            if found.is_some() {
                return Visit::Skip;
            }
            if predicate(node) {
                found = Some(id);
                return Visit::Skip;
            }
            Visit::Continue
        });
        found
    }

    /// Nearest ancestor of `id` (excluding itself) matching `predicate`
    pub fn closest<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Node) -> bool,
    {
        let mut current = self.nodes[id.0].parent;
        while let Some(ancestor) = current {
            if predicate(&self.nodes[ancestor.0]) {
                return Some(ancestor);
            }
            current = self.nodes[ancestor.0].parent;
        }
        None
    }

    /// Deep copy of a subtree within this tree; the copy is unattached
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let copy = self.create(self.nodes[id.0].clone());
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// Deep copy of a subtree from another tree; the copy is unattached
    pub fn import(&mut self, other: &Tree, id: NodeId) -> NodeId {
        let copy = self.create(other.get(id).clone());
        for &child in other.children(id) {
            let child_copy = self.import(other, child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// Serialize a subtree back to markup
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match node.kind {
            NodeKind::Text | NodeKind::Comment | NodeKind::Stray => out.push_str(&node.raw),
            NodeKind::Root => {
                for &child in &node.children {
                    self.write_markup(child, out);
                }
            }
            NodeKind::Element | NodeKind::Void | NodeKind::Opaque | NodeKind::Invisible => {
                out.push('<');
                out.push_str(&node.tag_raw);
                for (key, value) in &node.attributes {
                    out.push(' ');
                    out.push_str(key);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&value.replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                if node.kind == NodeKind::Void {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &node.children {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(&node.tag_raw);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let div = tree.create(Node::element(NodeKind::Element, "div"));
        let a = tree.create(Node::text("a"));
        let b = tree.create(Node::text("b"));
        tree.append(root, div);
        tree.append(div, a);
        tree.append(div, b);
        (tree, div, a, b)
    }

    #[test]
    fn test_append_and_detach() {
        let (mut tree, div, a, b) = sample();
        assert_eq!(tree.children(div), &[a, b]);
        tree.detach(a);
        assert_eq!(tree.children(div), &[b]);
        assert_eq!(tree.get(a).parent, None);
    }

    #[test]
    fn test_append_moves_between_parents() {
        let (mut tree, div, a, b) = sample();
        let span = tree.create(Node::element(NodeKind::Element, "span"));
        tree.append(tree.root(), span);
        tree.append(span, a);
        assert_eq!(tree.children(div), &[b]);
        assert_eq!(tree.children(span), &[a]);
        assert_eq!(tree.get(a).parent, Some(span));
    }

    #[test]
    fn test_replace_keeps_position() {
        let (mut tree, div, a, b) = sample();
        let c = tree.create(Node::text("c"));
        tree.replace(a, c);
        assert_eq!(tree.children(div), &[c, b]);
        assert_eq!(tree.get(a).parent, None);
    }

    #[test]
    fn test_insert_and_clear() {
        let (mut tree, div, a, b) = sample();
        let c = tree.create(Node::text("c"));
        tree.insert(div, 0, c);
        assert_eq!(tree.children(div), &[c, a, b]);
        tree.clear(div);
        assert!(tree.children(div).is_empty());
        assert_eq!(tree.get(b).parent, None);
    }

    #[test]
    fn test_traverse_skip() {
        let (tree, _, _, _) = sample();
        let mut seen = Vec::new();
        tree.traverse(tree.root(), |_, node| {
            seen.push(node.kind);
            Visit::Skip
        });
        assert_eq!(seen, vec![NodeKind::Element]);
    }

    #[test]
    fn test_find_and_closest() {
        let (tree, div, _, b) = sample();
        assert_eq!(tree.find(tree.root(), |n| n.raw == "b"), Some(b));
        assert_eq!(tree.closest(b, |n| n.tag == "div"), Some(div));
        assert_eq!(tree.closest(b, |n| n.tag == "span"), None);
    }

    #[test]
    fn test_clone_subtree_is_independent() {
        let (mut tree, div, a, _) = sample();
        let copy = tree.clone_subtree(div);
        assert_ne!(copy, div);
        let copy_first = tree.children(copy)[0];
        tree.get_mut(copy_first).raw = "changed".to_string();
        assert_eq!(tree.get(a).raw, "a");
        assert_eq!(tree.get(copy).parent, None);
    }

    #[test]
    fn test_import_from_other_tree() {
        let (source, div, _, _) = sample();
        let mut target = Tree::new();
        let copy = target.import(&source, div);
        assert_eq!(target.to_markup(copy), "<div>ab</div>");
    }
}
