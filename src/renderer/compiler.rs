//! Tree-to-program compiler
//!
//! The compiler owns the render's tree. It walks the validated tree once and
//! mirrors node nesting as block nesting in the [`Program`]. Component
//! instances are expanded in place; an instance of a component that is
//! already being expanded is compiled lazily when the executor reaches it.

use crate::cache::CacheStore;
use crate::diagnostics::{DiagnosticCategory, Diagnostics};
use crate::markup::{self, NodeId, NodeKind, Tree};
use crate::parser::{parse_expression, parse_script, Expr, Literal, Spanned};
use crate::tags::{self, Tag, Validation};
use crate::template::{self, ResolutionContext, TemplateRegistry};
use crate::RenderError;

use super::deferred::Placeholder;
use super::program::{
    split_interpolations, Attribute, Deferred, Expression, Interpolation, Op, Piece, Program,
    ScopeBlock, ScriptBlock, Segment,
};
use super::scope::normalize_prop;

/// Engine state a render reads
#[derive(Debug, Clone, Copy)]
pub struct Settings<'e> {
    pub templates: &'e TemplateRegistry,
    pub cache: &'e CacheStore,
    pub auto_escape: bool,
    pub max_depth: usize,
}

/// Per-render compiler state
pub struct Compiler<'e> {
    tree: Tree,
    settings: Settings<'e>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) portals: Vec<Placeholder>,
    pub(crate) caches: Vec<Placeholder>,
    escape: bool,
    elements: Vec<String>,
    resolving: ResolutionContext,
}

impl<'e> Compiler<'e> {
    pub fn new(tree: Tree, settings: Settings<'e>) -> Self {
        Self {
            tree,
            escape: settings.auto_escape,
            settings,
            diagnostics: Diagnostics::new(),
            portals: Vec::new(),
            caches: Vec::new(),
            elements: Vec::new(),
            resolving: ResolutionContext::new(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn settings(&self) -> &Settings<'e> {
        &self.settings
    }

    pub fn warn(&mut self, category: DiagnosticCategory, message: impl Into<String>) {
        self.diagnostics.push(category, message);
    }

    /// Current escaping mode for expression output
    pub fn escape(&self) -> bool {
        self.escape
    }

    /// Change the escaping mode, returning the previous one
    pub fn set_escape(&mut self, escape: bool) -> bool {
        std::mem::replace(&mut self.escape, escape)
    }

    /// Validate the descendants of `root` in render mode
    pub fn validate(&mut self, root: NodeId) {
        let cache = self.settings.cache;
        let mut cx = Validation::render(&mut self.diagnostics, cache, &mut self.portals);
        tags::validate_tree(&mut self.tree, root, &mut cx);
    }

    pub fn compile(&mut self, root: NodeId) -> Result<Program, RenderError> {
        let mut program = Program::new();
        self.compile_children(root, &mut program)?;
        Ok(program)
    }

    /// Register a cache span and return its marker
    pub fn add_cache(&mut self, name: &str) -> String {
        let placeholder = Placeholder::cache(name);
        let marker = placeholder.marker.clone();
        self.caches.push(placeholder);
        marker
    }

    /// Tag reported when an expression fails
    ///
    /// The innermost component instance, else the innermost element.
    pub fn context_element(&self) -> Option<String> {
        self.resolving
            .current()
            .map(str::to_string)
            .or_else(|| self.elements.last().cloned())
    }

    pub fn compile_children(&mut self, id: NodeId, out: &mut Program) -> Result<(), RenderError> {
        let children = self.tree.children(id).to_vec();
        for child in children {
            self.compile_node(child, out)?;
        }
        Ok(())
    }

    pub fn compile_node(&mut self, id: NodeId, out: &mut Program) -> Result<(), RenderError> {
        let kind = self.tree.get(id).kind;
        match kind {
            NodeKind::Text => self.compile_text(id, out),
            NodeKind::Comment => {
                out.text(self.tree.get(id).raw.clone());
                Ok(())
            }
            NodeKind::Stray => {
                let message = format!("unexpected closing tag {}", self.tree.get(id).raw);
                self.warn(DiagnosticCategory::Markup, message);
                Ok(())
            }
            NodeKind::Root => self.compile_children(id, out),
            NodeKind::Invisible => match tags::find(self.tree.get(id)) {
                Some(tag) => tag.render(self, id, out),
                None => self.compile_invisible(id, out),
            },
            NodeKind::Element | NodeKind::Void | NodeKind::Opaque => {
                if tags::Component.matches(self.tree.get(id)) {
                    tags::Component.render(self, id, out)
                } else {
                    self.compile_element(id, out)
                }
            }
        }
    }

    /// Directive nodes with no tag of their own
    fn compile_invisible(&mut self, id: NodeId, out: &mut Program) -> Result<(), RenderError> {
        let tag = self.tree.get(id).tag.clone();
        match tag.as_str() {
            "ssr-else" | "ssr-elseif" => {
                self.warn(
                    DiagnosticCategory::Directive,
                    format!("<{}> outside of <ssr-if>", tag),
                );
                Ok(())
            }
            _ => self.compile_children(id, out),
        }
    }

    fn compile_text(&mut self, id: NodeId, out: &mut Program) -> Result<(), RenderError> {
        let raw = self.tree.get(id).raw.clone();
        if raw.trim().is_empty() {
            if let Some(space) = self.whitespace(id, &raw) {
                out.text(space);
            }
            return Ok(());
        }

        let element = self.context_element();
        for piece in split_interpolations(&raw) {
            match piece {
                Piece::Text(text) => out.text(text),
                Piece::Expr { source, code } => {
                    let expr = expression(source, code, element.clone())?;
                    out.push(Op::Print {
                        expr,
                        escape: self.escape,
                    });
                }
            }
        }
        Ok(())
    }

    /// Collapse whitespace-only text
    ///
    /// Dropped at the edges of the root, a template root or an inline
    /// element; otherwise a newline if it spans lines, else one space.
    fn whitespace(&self, id: NodeId, raw: &str) -> Option<&'static str> {
        if let Some(parent) = self.tree.get(id).parent {
            let siblings = self.tree.children(parent);
            let edge = siblings.first() == Some(&id) || siblings.last() == Some(&id);
            let parent = self.tree.get(parent);
            let trimmed_context = parent.kind == NodeKind::Root
                || parent.parent.is_none()
                || markup::is_inline(&parent.tag);
            if edge && trimmed_context {
                return None;
            }
        }
        Some(if raw.contains('\n') { "\n" } else { " " })
    }

    /// Emit a node as a literal element
    pub fn compile_element(&mut self, id: NodeId, out: &mut Program) -> Result<(), RenderError> {
        let node = self.tree.get(id);
        let kind = node.kind;
        let tag = node.tag_raw.clone();

        self.elements.push(tag.clone());
        let result = self.compile_element_body(id, kind, &tag, out);
        self.elements.pop();
        result
    }

    fn compile_element_body(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        tag: &str,
        out: &mut Program,
    ) -> Result<(), RenderError> {
        let attributes = self.attributes(id, &[])?;
        let void = kind == NodeKind::Void;
        out.push(Op::OpenTag {
            tag: tag.to_string(),
            attributes,
            void,
        });
        if void {
            return Ok(());
        }

        if kind == NodeKind::Opaque {
            let content: String = self
                .tree
                .children(id)
                .iter()
                .map(|&child| self.tree.to_markup(child))
                .collect();
            out.text(content);
        } else {
            self.compile_children(id, out)?;
        }
        out.text(format!("</{}>", tag));
        Ok(())
    }

    /// Compile a node's attributes, leaving out `skip`
    pub fn attributes(&self, id: NodeId, skip: &[&str]) -> Result<Vec<Attribute>, RenderError> {
        let element = self.context_element();
        self.tree
            .get(id)
            .attributes
            .iter()
            .filter(|(name, _)| !skip.contains(&name.as_str()))
            .map(|(name, value)| {
                Ok(Attribute {
                    name: name.clone(),
                    value: interpolate(value, element.clone())?,
                })
            })
            .collect()
    }

    pub fn interpolate(&self, text: &str) -> Result<Interpolation, RenderError> {
        interpolate(text, self.context_element())
    }

    /// Expression held by a directive attribute such as `condition` or `of`
    ///
    /// A value that is exactly one `{{ }}` uses the inner expression;
    /// anything else is read as a bare expression.
    pub fn attribute_expression(&self, value: &str) -> Result<Expression, RenderError> {
        let element = self.context_element();
        let interpolation = interpolate(value, element.clone())?;
        match interpolation.single() {
            Some(expr) => Ok(expr.clone()),
            None => expression(value, value, element),
        }
    }

    /// Expand a component instance, deferring recursive instances
    pub fn compile_component(&mut self, id: NodeId, out: &mut Program) -> Result<(), RenderError> {
        let name = self.tree.get(id).tag.clone();
        if self.resolving.is_resolving(&name) {
            out.push(Op::Deferred(Box::new(Deferred {
                instance: id,
                resolving: self.resolving.clone(),
                elements: self.elements.clone(),
                escape: self.escape,
            })));
            return Ok(());
        }
        self.expand_component(id, out)
    }

    /// Compile a deferred instance with the state it was reached in
    pub fn compile_deferred(&mut self, deferred: &Deferred) -> Result<Program, RenderError> {
        let resolving = std::mem::replace(&mut self.resolving, deferred.resolving.clone());
        let elements = std::mem::replace(&mut self.elements, deferred.elements.clone());
        let escape = self.set_escape(deferred.escape);

        let mut program = Program::new();
        let result = self.expand_component(deferred.instance, &mut program);

        self.resolving = resolving;
        self.elements = elements;
        self.escape = escape;
        result.map(|_| program)
    }

    fn expand_component(&mut self, id: NodeId, out: &mut Program) -> Result<(), RenderError> {
        let name = self.tree.get(id).tag.clone();
        if self.resolving.depth() >= self.settings.max_depth {
            self.warn(
                DiagnosticCategory::Component,
                format!(
                    "<{}> exceeds the maximum component depth of {}",
                    name, self.settings.max_depth
                ),
            );
            return Ok(());
        }

        let Settings {
            templates, cache, ..
        } = self.settings;
        let expansion = {
            let mut cx = Validation::render(&mut self.diagnostics, cache, &mut self.portals);
            template::expand(&mut self.tree, templates, id, &mut cx)
        };
        let Some(expansion) = expansion else {
            return self.compile_element(id, out);
        };

        let props = self.props(id, &name)?;
        let script = match expansion.script {
            Some(source) => {
                let script = parse_script(&source).map_err(|errors| {
                    RenderError::syntax(&source, &source, Some(name.clone()), errors)
                })?;
                Some(ScriptBlock { source, script })
            }
            None => None,
        };

        self.resolving.start_resolving(&name);
        let mut body = Program::new();
        let result = self.compile_children(expansion.root, &mut body);
        self.resolving.done_resolving();
        result?;

        out.push(Op::Scope(Box::new(ScopeBlock {
            element: name,
            props,
            script,
            body,
        })));
        Ok(())
    }

    /// Instance attributes as props, evaluated in the enclosing scope
    fn props(&mut self, id: NodeId, name: &str) -> Result<Vec<Attribute>, RenderError> {
        let entries: Vec<(String, String)> = self
            .tree
            .get(id)
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut props = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match normalize_prop(&key) {
                Ok(prop) => props.push(Attribute {
                    name: prop,
                    value: interpolate(&value, Some(name.to_string()))?,
                }),
                Err(message) => self.warn(DiagnosticCategory::Prop, message),
            }
        }
        Ok(props)
    }
}

/// Split text into literal and parsed expression segments
fn interpolate(text: &str, element: Option<String>) -> Result<Interpolation, RenderError> {
    let mut segments = Vec::new();
    for piece in split_interpolations(text) {
        match piece {
            Piece::Text(text) => segments.push(Segment::Text(text)),
            Piece::Expr { source, code } => {
                segments.push(Segment::Expr(expression(source, code, element.clone())?))
            }
        }
    }
    Ok(Interpolation { segments })
}

fn expression(source: &str, code: &str, element: Option<String>) -> Result<Expression, RenderError> {
    let ast = parse_expression(code)
        .map_err(|errors| RenderError::syntax(source, code, element.clone(), errors))?;
    Ok(Expression {
        source: source.to_string(),
        ast,
        element,
    })
}

/// Constant `false`, used for conditions that cannot be read
pub fn false_expression() -> Expression {
    Expression {
        source: "false".to_string(),
        ast: Spanned::new(Expr::Literal(Literal::Bool(false)), 0..5),
        element: None,
    }
}
