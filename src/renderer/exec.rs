//! Program executor
//!
//! Runs a compiled [`Program`] once against a render's own [`Scope`],
//! writing HTML into a caller-supplied buffer. Fragments targeting portals
//! are collected for the post-render resolver.

use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostics::DiagnosticCategory;
use crate::markup::{NodeId, VOID_TAGS};
use crate::parser::{Expr, Spanned, Stmt};
use crate::value::{escape_html, Props, Value};
use crate::RenderError;

use super::compiler::Compiler;
use super::deferred::Fragment;
use super::eval::{evaluate, EvalError};
use super::program::{
    Attribute, DynamicElementBlock, Expression, Interpolation, LoopBlock, Op, Program, ScopeBlock,
    Segment,
};
use super::scope::{Scope, LOCAL_PROPS};

pub struct Executor<'c, 'e, 'g> {
    compiler: &'c mut Compiler<'e>,
    scope: Scope<'g>,
    fragments: Vec<Fragment>,
    /// Lazily compiled recursive instances
    deferred: HashMap<NodeId, Rc<Program>>,
}

impl<'c, 'e, 'g> Executor<'c, 'e, 'g> {
    pub fn new(compiler: &'c mut Compiler<'e>, scope: Scope<'g>) -> Self {
        Self {
            compiler,
            scope,
            fragments: Vec::new(),
            deferred: HashMap::new(),
        }
    }

    /// Fragments rendered so far, in render order
    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    pub fn run(&mut self, program: &Program, out: &mut String) -> Result<(), RenderError> {
        for op in &program.ops {
            match op {
                Op::Text(text) => out.push_str(text),
                Op::Print { expr, escape } => {
                    let text = self.eval(expr)?.to_display_string();
                    if *escape {
                        out.push_str(&escape_html(&text));
                    } else {
                        out.push_str(&text);
                    }
                }
                Op::OpenTag {
                    tag,
                    attributes,
                    void,
                } => {
                    out.push('<');
                    out.push_str(tag);
                    self.write_attributes(attributes, out);
                    out.push_str(if *void { "/>" } else { ">" });
                }
                Op::DynamicElement(block) => self.run_element(block, out)?,
                Op::Scope(block) => self.run_scope(block, out)?,
                Op::Loop(block) => self.run_loop(block, out)?,
                Op::Branch(arms) => {
                    for arm in arms {
                        let taken = match &arm.condition {
                            Some(condition) => self.eval(condition)?.is_truthy(),
                            None => true,
                        };
                        if taken {
                            self.run(&arm.body, out)?;
                            break;
                        }
                    }
                }
                Op::Capture { portal, body } => {
                    let mut html = String::new();
                    self.run(body, &mut html)?;
                    self.fragments.push(Fragment {
                        portal: portal.clone(),
                        html,
                    });
                }
                Op::Deferred(deferred) => {
                    let program = match self.deferred.get(&deferred.instance) {
                        Some(program) => Rc::clone(program),
                        None => {
                            let program = Rc::new(self.compiler.compile_deferred(deferred)?);
                            self.deferred.insert(deferred.instance, Rc::clone(&program));
                            program
                        }
                    };
                    self.run(&program, out)?;
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expression) -> Result<Value, RenderError> {
        evaluate(&expr.ast, &self.scope).map_err(|err| RenderError::evaluation(expr, err))
    }

    /// Value of an attribute; a lone expression keeps its type
    fn interpolate(&self, value: &Interpolation) -> Result<Value, RenderError> {
        if let Some(expr) = value.single() {
            return self.eval(expr);
        }
        let mut text = String::new();
        for segment in &value.segments {
            match segment {
                Segment::Text(literal) => text.push_str(literal),
                Segment::Expr(expr) => text.push_str(&self.eval(expr)?.to_display_string()),
            }
        }
        Ok(Value::String(text))
    }

    /// Serialize attributes; one that fails to evaluate is left out
    fn write_attributes(&self, attributes: &[Attribute], out: &mut String) {
        for attribute in attributes {
            let value = match self.interpolate(&attribute.value) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(attribute = %attribute.name, error = %err, "dropped attribute");
                    continue;
                }
            };
            match value {
                Value::Undefined | Value::Null => {}
                Value::String(s) if s.is_empty() => {
                    out.push(' ');
                    out.push_str(&attribute.name);
                }
                value => {
                    out.push(' ');
                    out.push_str(&attribute.name);
                    out.push_str("=\"");
                    out.push_str(&escape_html(&value.to_display_string()));
                    out.push('"');
                }
            }
        }
    }

    fn run_element(&mut self, block: &DynamicElementBlock, out: &mut String) -> Result<(), RenderError> {
        let tag = self.interpolate(&block.tag)?.to_display_string();
        let tag = tag.trim();
        if tag.is_empty() {
            self.compiler
                .warn(DiagnosticCategory::Directive, "<ssr-element> with empty \"tag\" property");
            return self.run(&block.body, out);
        }

        let void = block.body.is_empty() && VOID_TAGS.contains(&tag.to_ascii_lowercase().as_str());
        out.push('<');
        out.push_str(tag);
        self.write_attributes(&block.attributes, out);
        if void {
            out.push_str("/>");
            return Ok(());
        }
        out.push('>');
        self.run(&block.body, out)?;
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        Ok(())
    }

    fn run_scope(&mut self, block: &ScopeBlock, out: &mut String) -> Result<(), RenderError> {
        let mut props = Props::new();
        for prop in &block.props {
            props.insert(prop.name.clone(), self.interpolate(&prop.value)?);
        }

        let mut frame = props.clone();
        frame.insert(LOCAL_PROPS.to_string(), Value::object(props.clone()));
        self.scope.push(frame);
        let result = self
            .run_script(block, &props)
            .and_then(|_| self.run(&block.body, out));
        self.scope.pop();
        result
    }

    /// Declarations fill in props that were not passed; assignments override
    fn run_script(&mut self, block: &ScopeBlock, passed: &Props) -> Result<(), RenderError> {
        let Some(script) = &block.script else {
            return Ok(());
        };

        for statement in &script.script.statements {
            let fail = |err: EvalError| {
                let source = script
                    .source
                    .get(statement.span.clone())
                    .unwrap_or(&script.source);
                RenderError::Expression {
                    message: err.to_string(),
                    expression: source.trim().to_string(),
                    element: Some(block.element.clone()),
                    syntax: None,
                }
            };
            let eval = |expr: &Spanned<Expr>, scope: &Scope<'_>| evaluate(expr, scope).map_err(fail);

            match &statement.node {
                Stmt::Declare { name, value, .. } => {
                    if passed.contains_key(name.node.as_str()) {
                        continue;
                    }
                    let value = match value {
                        Some(expr) => eval(expr, &self.scope)?,
                        None => Value::Undefined,
                    };
                    self.scope.set(name.node.as_str(), value);
                }
                Stmt::Assign { name, value } => {
                    let value = eval(value, &self.scope)?;
                    self.scope.set(name.node.as_str(), value);
                }
                Stmt::Expr(expr) => {
                    eval(expr, &self.scope)?;
                }
            }
        }
        Ok(())
    }

    fn run_loop(&mut self, block: &LoopBlock, out: &mut String) -> Result<(), RenderError> {
        let source = self.eval(&block.source)?;
        let items = match iterate(source) {
            Ok(Some(items)) => items,
            Ok(None) => {
                self.compiler.warn(
                    DiagnosticCategory::Loop,
                    "<ssr-for> invalid \"of\" property (not iterable)",
                );
                return Ok(());
            }
            Err(err) => return Err(RenderError::evaluation(&block.source, err)),
        };

        for (index, item) in items.enumerate() {
            let mut frame = Props::new();
            frame.insert(block.item.clone(), item);
            if let Some(name) = &block.index {
                frame.insert(name.clone(), Value::from(index));
            }
            self.scope.push(frame);
            let result = self.run(&block.body, out);
            self.scope.pop();
            result?;
        }
        Ok(())
    }
}

/// Longest array a loop range may describe
pub const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;

/// Items a loop visits
///
/// Integers (and strings starting with one) count from zero, other strings
/// iterate their characters, arrays their elements. `None` means the
/// value cannot be iterated.
pub fn iterate(value: Value) -> Result<Option<Box<dyn Iterator<Item = Value>>>, EvalError> {
    match value {
        Value::Number(n) => range(n).map(Some),
        Value::String(s) => match leading_integer(&s) {
            Some(n) => range(n).map(Some),
            None => {
                let chars: Vec<Value> = s.chars().map(|c| Value::String(c.to_string())).collect();
                Ok(Some(Box::new(chars.into_iter())))
            }
        },
        Value::Array(items) => Ok(Some(Box::new(items.to_vec().into_iter()))),
        _ => Ok(None),
    }
}

/// Integer prefix of a string, read the way `parseInt` reads it
fn leading_integer(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let digits = unsigned.len() - unsigned.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let end = trimmed.len() - unsigned.len() + digits;
    trimmed[..end].parse::<f64>().ok()
}

fn range(n: f64) -> Result<Box<dyn Iterator<Item = Value>>, EvalError> {
    if n < 0.0 || n.fract() != 0.0 || !n.is_finite() || n > MAX_ARRAY_LENGTH {
        return Err(EvalError::Invalid("invalid array length".to_string()));
    }
    Ok(Box::new((0..n as u64).map(|i| Value::from(i as f64))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(value: impl Into<Value>) -> Vec<String> {
        iterate(value.into())
            .expect("Should iterate")
            .expect("Iterable")
            .map(|item| item.to_display_string())
            .collect()
    }

    #[test]
    fn test_iterate_numbers_and_numeric_strings() {
        assert_eq!(strings(3), vec!["0", "1", "2"]);
        assert_eq!(strings(" 2 "), vec!["0", "1"]);
        assert_eq!(strings("2.0"), vec!["0", "1"]);
        assert_eq!(strings("1.5"), vec!["0"]);
        assert_eq!(strings("3px"), vec!["0", "1", "2"]);
        assert_eq!(strings("+1"), vec!["0"]);
    }

    #[test]
    fn test_iterate_strings_and_arrays() {
        assert_eq!(strings("abc"), vec!["a", "b", "c"]);
        assert_eq!(strings("px3"), vec!["p", "x", "3"]);
        assert_eq!(strings("-"), vec!["-"]);
        assert_eq!(strings(Value::array(vec![Value::from(1), Value::from("x")])), vec!["1", "x"]);
    }

    #[test]
    fn test_iterate_rejects() {
        assert!(matches!(iterate(Value::Null), Ok(None)));
        assert!(matches!(iterate(Value::Bool(true)), Ok(None)));
        assert!(iterate(Value::from(-1)).is_err());
        assert!(iterate(Value::from("-2")).is_err());
        assert!(iterate(Value::from(1.5)).is_err());
        assert!(iterate(Value::from(1e19)).is_err());
        assert!(iterate(Value::from("99999999999999999999")).is_err());
        assert!(iterate(Value::from(MAX_ARRAY_LENGTH)).is_ok());
    }
}
