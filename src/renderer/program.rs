//! Compiled program
//!
//! A program is a list of instructions executed once per render. Blocks
//! (scopes, loops, branches, captures) own their body as a nested
//! [`Program`], so block nesting always mirrors tree nesting.

use crate::markup::NodeId;
use crate::parser::{Expr, Script, Spanned};
use crate::template::ResolutionContext;

/// An expression as authored, with its parsed form
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Source text including the braces, e.g. `{{ user.name }}`
    pub source: String,
    pub ast: Spanned<Expr>,
    /// Tag reported when evaluation fails
    pub element: Option<String>,
}

/// Piece of an interpolated string
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Expr(Expression),
}

/// Text with embedded `{{ }}` expressions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpolation {
    pub segments: Vec<Segment>,
}

impl Interpolation {
    /// The expression when the whole value is exactly one `{{ }}`
    pub fn single(&self) -> Option<&Expression> {
        match self.segments.as_slice() {
            [Segment::Expr(expr)] => Some(expr),
            _ => None,
        }
    }
}

/// Element attribute or component prop
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Interpolation,
}

/// Component boundary
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeBlock {
    /// Component tag, used for error context
    pub element: String,
    /// Props evaluated in the enclosing scope
    pub props: Vec<Attribute>,
    pub script: Option<ScriptBlock>,
    pub body: Program,
}

/// Parsed `<script context="component">`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBlock {
    pub source: String,
    pub script: Script,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopBlock {
    pub source: Expression,
    pub item: String,
    pub index: Option<String>,
    pub body: Program,
}

/// One `if`/`elseif`/`else` group; `None` is an unconditional `else`
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub condition: Option<Expression>,
    pub body: Program,
}

/// Element whose tag name is computed at render time
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicElementBlock {
    pub tag: Interpolation,
    pub attributes: Vec<Attribute>,
    pub body: Program,
}

/// Recursive component expansion compiled on first execution
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred {
    pub instance: NodeId,
    /// Components being expanded when the instance was reached
    pub resolving: ResolutionContext,
    pub elements: Vec<String>,
    pub escape: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Emit literal text
    Text(String),
    /// Emit an expression result
    Print { expr: Expression, escape: bool },
    /// Emit `<tag attrs>` or `<tag attrs/>`
    OpenTag {
        tag: String,
        attributes: Vec<Attribute>,
        void: bool,
    },
    DynamicElement(Box<DynamicElementBlock>),
    Scope(Box<ScopeBlock>),
    Loop(Box<LoopBlock>),
    Branch(Vec<Arm>),
    /// Render the body into a separate buffer registered for a portal
    Capture { portal: String, body: Program },
    Deferred(Box<Deferred>),
}

/// Instruction list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction, merging adjacent literal text
    pub fn push(&mut self, op: Op) {
        if let (Some(Op::Text(last)), Op::Text(text)) = (self.ops.last_mut(), &op) {
            last.push_str(text);
            return;
        }
        self.ops.push(op);
    }

    pub fn text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.push(Op::Text(text));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Raw piece of interpolated text before expressions are parsed
#[derive(Debug, Clone, PartialEq)]
pub enum Piece<'a> {
    Text(String),
    Expr { source: &'a str, code: &'a str },
}

/// Split text into literal pieces and `{{ }}` expressions
///
/// An expression must not start with `{` and ends at the first `}}`.
/// `{{!expr}}` is an escape that yields the literal text `{{expr}}`.
pub fn split_interpolations(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        literal.push_str(&rest[..start]);
        rest = &rest[start..];

        let first = rest[2..].chars().next().filter(|&c| c != '{');
        let end = first.and_then(|c| {
            let body = 2 + c.len_utf8();
            rest[body..].find("}}").map(|offset| body + offset)
        });

        match end {
            None => {
                literal.push('{');
                rest = &rest[1..];
            }
            Some(end) => {
                let code = &rest[2..end];
                if let Some(escaped) = code.strip_prefix('!') {
                    literal.push_str("{{");
                    literal.push_str(escaped);
                    literal.push_str("}}");
                } else {
                    if !literal.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Expr {
                        source: &rest[..end + 2],
                        code,
                    });
                }
                rest = &rest[end + 2..];
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        pieces.push(Piece::Text(literal));
    }
    pieces
}
