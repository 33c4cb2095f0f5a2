//! `<ssr-cache name="...">`: reuse rendered HTML across renders

use crate::markup::{NodeId, Tree};
use crate::renderer::{Compiler, Program};
use crate::RenderError;

use super::{Tag, Validation};

pub struct Cache;

impl Tag for Cache {
    fn name(&self) -> &'static str {
        "ssr-cache"
    }

    fn validate(&self, tree: &mut Tree, id: NodeId, cx: &mut Validation<'_>) -> bool {
        let node = tree.get(id);
        let Some(name) = node.attr("name").filter(|n| !n.is_empty()) else {
            cx.warn("<ssr-cache> missing \"name\" property");
            return false;
        };
        let cached = cx.cache.map_or(true, |store| store.contains(name));
        if !cached && node.children.is_empty() {
            cx.warn("<ssr-cache> with no content");
            return false;
        }
        true
    }

    /// A stored span is emitted as is; otherwise the body is bracketed by
    /// markers so the resolver can store it.
    fn render(
        &self,
        compiler: &mut Compiler<'_>,
        id: NodeId,
        out: &mut Program,
    ) -> Result<(), RenderError> {
        let name = compiler.tree().get(id).attr("name").unwrap_or_default().to_string();
        if let Some(html) = compiler.settings().cache.get(&name) {
            tracing::debug!(name = %name, "cache hit");
            out.text(html);
            return Ok(());
        }

        let marker = compiler.add_cache(&name);
        out.text(marker.clone());
        compiler.compile_children(id, out)?;
        out.text(marker);
        Ok(())
    }
}
