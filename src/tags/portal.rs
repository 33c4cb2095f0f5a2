//! `<ssr-portal name="...">`: collects fragments rendered anywhere

use crate::markup::{Node, NodeId, Tree};
use crate::renderer::{Compiler, Placeholder, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct Portal;

impl Tag for Portal {
    fn name(&self) -> &'static str {
        "ssr-portal"
    }

    /// Appends the placeholder comment the resolver later replaces
    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        let Some(name) = tree.get(id).attr("name").filter(|n| !n.is_empty()) else {
            cx.warn("<ssr-portal> missing \"name\" property");
            return false;
        };
        if let Some(portals) = cx.portals.as_deref_mut() {
            let placeholder = Placeholder::portal(name);
            let comment = tree.create(Node::comment(placeholder.marker.clone()));
            tree.append(id, comment);
            portals.push(placeholder);
        }
        true
    }

    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        out: &mut Program,
    ) -> Result<(), RenderError> {
        compiler.compile_children(id, out)
    }
}
