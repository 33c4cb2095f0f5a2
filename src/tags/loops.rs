//! `<ssr-for item="x" index="i" of="expr">`

use crate::markup::{NodeId, Tree};
use crate::parser::lexer::KEYWORDS;
use crate::parser::Identifier;
use crate::renderer::program::LoopBlock;
use crate::renderer::scope::RESERVED_PROPS;
use crate::renderer::{Compiler, Op, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct Loop;

/// Names a loop may bind: identifiers that are neither keywords nor reserved props
fn is_binding(name: &str) -> bool {
    Identifier::is_valid(name) && !KEYWORDS.contains(&name) && !RESERVED_PROPS.contains(&name)
}

impl Tag for Loop {
    fn name(&self) -> &'static str {
        "ssr-for"
    }

    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        let node = tree.get(id);
        if node.children.is_empty() {
            cx.warn("<ssr-for> with no statement");
            return false;
        }
        if node.attr("of").map_or(true, str::is_empty) {
            cx.warn("<ssr-for> missing \"of\" property");
            return false;
        }
        if !node.attr("item").is_some_and(is_binding) {
            cx.warn("<ssr-for> invalid \"item\" property");
            return false;
        }
        if node.attr("index").is_some_and(|index| !is_binding(index)) {
            cx.warn("<ssr-for> invalid \"index\" property");
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
        let node = compiler.tree().get(id);
        let of = node.attr("of").unwrap_or_default().to_string();
        let item = node.attr("item").unwrap_or_default().to_string();
        let index = node.attr("index").map(str::to_string);

        let source = compiler.attribute_expression(&of)?;
        let mut body = Program::new();
        compiler.compile_children(id, &mut body)?;

        out.push(Op::Loop(Box::new(LoopBlock {
            source,
            item,
            index,
            body,
        })));
        Ok(())
    }
}
