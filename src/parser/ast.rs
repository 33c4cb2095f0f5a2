//! Abstract Syntax Tree types for template expressions and component scripts

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + `_`/`$`, starts with letter/`_`/`$`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a string could be bound as a name
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Literal constant
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    LooseEq,
    LooseNotEq,
    StrictEq,
    StrictNotEq,
    And,
    Or,
    Nullish,
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(Identifier),
    Array(Vec<Spanned<Expr>>),
    Object(Vec<(String, Spanned<Expr>)>),
    /// `object.name` / `object?.name`
    Member {
        object: Box<Spanned<Expr>>,
        property: Identifier,
        optional: bool,
    },
    /// `object[index]` / `object?.[index]`
    Index {
        object: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
        optional: bool,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
    Conditional {
        test: Box<Spanned<Expr>>,
        consequent: Box<Spanned<Expr>>,
        alternate: Box<Spanned<Expr>>,
    },
}

/// Declaration keyword of a script statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

/// Component script statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `const|let|var name = value`: a default, skipped when passed as a prop
    Declare {
        kind: DeclKind,
        name: Spanned<Identifier>,
        value: Option<Spanned<Expr>>,
    },
    /// `name = value`: an override applied after props
    Assign {
        name: Spanned<Identifier>,
        value: Spanned<Expr>,
    },
    Expr(Spanned<Expr>),
}

/// Parsed component script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub statements: Vec<Spanned<Stmt>>,
}
