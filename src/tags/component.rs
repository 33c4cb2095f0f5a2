//! Custom elements expanded from registered templates

use crate::markup::{Node, NodeId, NodeKind};
use crate::renderer::{Compiler, Program};
use crate::template::TemplateRegistry;
use crate::RenderError;

use super::{RawHtml, Tag};

pub struct Component;

impl Tag for Component {
    fn name(&self) -> &'static str {
        "ssr-component"
    }

    fn matches(&self, node: &Node) -> bool {
        matches!(node.kind, NodeKind::Element | NodeKind::Void)
            && TemplateRegistry::is_valid_name(&node.tag)
    }

    /// Unknown components and those inside `<ssr-html>` stay literal elements
    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        out: &mut Program,
    ) -> Result<(), RenderError> {
        let tree = compiler.tree();
        let known = compiler.settings().templates.contains(&tree.get(id).tag);
        let raw = tree.closest(id, |node| RawHtml.matches(node)).is_some();
        if known && !raw {
            compiler.compile_component(id, out)
        } else {
            compiler.compile_element(id, out)
        }
    }
}
