//! `<ssr-html>`: expression output inside is not escaped

use crate::markup::{NodeId, Tree};
use crate::renderer::{Compiler, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct RawHtml;

impl Tag for RawHtml {
    fn name(&self) -> &'static str {
        "ssr-html"
    }

    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        if tree.children(id).is_empty() {
            cx.warn("<ssr-html> with no content");
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
        let previous = compiler.set_escape(false);
        let result = compiler.compile_children(id, out);
        compiler.set_escape(previous);
        result
    }
}
