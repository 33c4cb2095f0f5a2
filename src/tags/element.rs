//! `<ssr-element tag="...">`: element with a computed tag name

use crate::markup::{NodeId, Tree};
use crate::renderer::program::DynamicElementBlock;
use crate::renderer::{Compiler, Op, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct DynamicElement;

impl Tag for DynamicElement {
    fn name(&self) -> &'static str {
        "ssr-element"
    }

    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        if tree.get(id).attr("tag").map_or(true, str::is_empty) {
            cx.warn("<ssr-element> missing \"tag\" property");
            return false;
        }
        true
    }

    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        out: &mut Program,
    ) -> Result<(), RenderError> {
        let tag = compiler.tree().get(id).attr("tag").unwrap_or_default().to_string();
        let tag = compiler.interpolate(&tag)?;
        let attributes = compiler.attributes(id, &["tag"])?;
        let mut body = Program::new();
        compiler.compile_children(id, &mut body)?;

        out.push(Op::DynamicElement(Box::new(DynamicElementBlock {
            tag,
            attributes,
            body,
        })));
        Ok(())
    }
}
