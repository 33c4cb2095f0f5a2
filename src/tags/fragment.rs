//! `<ssr-fragment>`: content routed to a slot or a portal

use crate::diagnostics::DiagnosticCategory;
use crate::markup::{NodeId, Tree};
use crate::renderer::{Compiler, Op, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct Fragment;

impl Tag for Fragment {
    fn name(&self) -> &'static str {
        "ssr-fragment"
    }

    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        let node = tree.get(id);
        if !node.has_attr("slot") && !node.has_attr("portal") {
            cx.warn("<ssr-fragment> missing \"slot\" or \"portal\" property");
            return false;
        }
        true
    }

    /// Slot fragments are consumed by component expansion, so one that
    /// reaches compilation has no component to fill.
    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        out: &mut Program,
    ) -> Result<(), RenderError> {
        let node = compiler.tree().get(id);
        let portal = node.attr("portal").map(str::to_string);
        let slot = node.attr("slot").unwrap_or_default().to_string();
        match portal {
            Some(portal) => {
                let mut body = Program::new();
                compiler.compile_children(id, &mut body)?;
                out.push(Op::Capture { portal, body });
            }
            None => {
                let message = format!("<ssr-fragment slot=\"{}\"> outside of a component", slot);
                compiler.warn(DiagnosticCategory::Directive, message);
            }
        }
        Ok(())
    }
}
