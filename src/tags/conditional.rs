//! `<ssr-if>` with `<ssr-elseif>` / `<ssr-else>` arms

use crate::diagnostics::DiagnosticCategory;
use crate::markup::{NodeId, Tree};
use crate::renderer::program::Arm;
use crate::renderer::{false_expression, Compiler, Op, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct Conditional;

impl Tag for Conditional {
    fn name(&self) -> &'static str {
        "ssr-if"
    }

    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        let node = tree.get(id);
        if node.children.is_empty() {
            cx.warn("<ssr-if> with no statement");
            return false;
        }
        if node.attr("condition").map_or(true, str::is_empty) {
            cx.warn("<ssr-if> missing \"condition\" property");
            return false;
        }
        true
    }

    /// Children are split into arms at each `<ssr-elseif>` and `<ssr-else>`
    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        out: &mut Program,
    ) -> Result<(), RenderError> {
        let condition = compiler.tree().get(id).attr("condition").unwrap_or_default().to_string();
        let mut condition = Some(compiler.attribute_expression(&condition)?);
        let mut body = Program::new();
        let mut arms = Vec::new();

        let children = compiler.tree().children(id).to_vec();
        for child in children {
            let node = compiler.tree().get(child);
            let tag = node.tag.clone();
            let source = node.attr("condition").filter(|c| !c.is_empty()).map(str::to_string);
            match tag.as_str() {
                "ssr-elseif" => {
                    let next = match source {
                        Some(source) => compiler.attribute_expression(&source)?,
                        None => {
                            compiler.warn(
                                DiagnosticCategory::Directive,
                                "<ssr-elseif> with invalid condition",
                            );
                            false_expression()
                        }
                    };
                    arms.push(Arm {
                        condition: condition.replace(next),
                        body: std::mem::take(&mut body),
                    });
                }
                "ssr-else" => {
                    arms.push(Arm {
                        condition: condition.take(),
                        body: std::mem::take(&mut body),
                    });
                }
                _ => compiler.compile_node(child, &mut body)?,
            }
        }
        arms.push(Arm { condition, body });

        out.push(Op::Branch(arms));
        Ok(())
    }
}
