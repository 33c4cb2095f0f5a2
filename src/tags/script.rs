//! `<script context="component">` / `<ssr-script context="component">`

use crate::diagnostics::DiagnosticCategory;
use crate::markup::{Node, NodeId, Tree};
use crate::renderer::{Compiler, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct ComponentScript;

impl Tag for ComponentScript {
    fn name(&self) -> &'static str {
        "ssr-script"
    }

    fn matches(&self, node: &Node) -> bool {
        node.tag == "ssr-script" || (node.tag == "script" && node.attr("context") == Some("component"))
    }

    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        let node = tree.get(id);
        if node.attr("context") != Some("component") {
            cx.warn(format!("<{}> unknown", node.tag));
            return false;
        }
        let empty = node
            .children
            .iter()
            .all(|&child| tree.get(child).raw.trim().is_empty());
        if empty {
            cx.warn(format!("<{}> with no content", node.tag));
            return false;
        }
        true
    }

    /// Scripts run when their component expands; one reaching compilation
    /// is not at the top level of a template.
    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        _out: &mut Program,
    ) -> Result<(), RenderError> {
        let tag = compiler.tree().get(id).tag.clone();
        compiler.warn(
            DiagnosticCategory::Directive,
            format!("<{} context=\"component\"> outside of a component template", tag),
        );
        Ok(())
    }
}
