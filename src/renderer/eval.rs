//! Expression evaluation against a [`Scope`]

use thiserror::Error;

use super::builtins;
use super::scope::Scope;
use crate::parser::{BinaryOp, Expr, Literal, Spanned, UnaryOp};
use crate::value::Value;

/// Runtime evaluation failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{name} is not defined")]
    NotDefined { name: String },

    #[error("cannot read properties of {target} (reading '{property}')")]
    NullAccess {
        target: &'static str,
        property: String,
    },

    #[error("{callee} is not a function")]
    NotCallable { callee: String },

    #[error("{0}")]
    Invalid(String),
}

/// Evaluate an expression
pub fn evaluate(expr: &Spanned<Expr>, scope: &Scope<'_>) -> Result<Value, EvalError> {
    Evaluator { scope }.eval(expr)
}

struct Evaluator<'a, 'g> {
    scope: &'a Scope<'g>,
}

impl Evaluator<'_, '_> {
    fn eval(&self, expr: &Spanned<Expr>) -> Result<Value, EvalError> {
        match &expr.node {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Ident(name) => self.lookup(name.as_str()),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(values))
            }
            Expr::Object(entries) => {
                let mut map = crate::value::Object::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::object(map))
            }
            Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => {
                Ok(self.chain(expr)?.unwrap_or_default())
            }
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.scope
            .lookup(name)
            .cloned()
            .ok_or_else(|| EvalError::NotDefined {
                name: name.to_string(),
            })
    }

    /// Member/index/call chain; `None` when an optional link short-circuits
    fn chain(&self, expr: &Spanned<Expr>) -> Result<Option<Value>, EvalError> {
        match &expr.node {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.chain(object)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                read_property(&target, property.as_str()).map(Some)
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let Some(target) = self.chain(object)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval(index)?;
                read_property(&target, &builtins::property_key(&key)).map(Some)
            }
            Expr::Call { callee, args } => self.call(callee, args),
            _ => self.eval(expr).map(Some),
        }
    }

    fn call(
        &self,
        callee: &Spanned<Expr>,
        args: &[Spanned<Expr>],
    ) -> Result<Option<Value>, EvalError> {
        match &callee.node {
            // Global functions such as `String(x)`
            Expr::Ident(name) if self.scope.lookup(name.as_str()).is_none() => {
                let values = self.args(args)?;
                match builtins::call_function(name.as_str(), &values) {
                    Some(result) => result.map(Some),
                    None => Err(EvalError::NotDefined {
                        name: name.to_string(),
                    }),
                }
            }
            // Namespaced helpers such as `Math.max(a, b)`
            Expr::Member {
                object, property, ..
            } if is_unbound_namespace(object, self.scope) => {
                let namespace = match &object.node {
                    Expr::Ident(name) => name.as_str(),
                    _ => "",
                };
                let values = self.args(args)?;
                match builtins::call_namespace(namespace, property.as_str(), &values) {
                    Some(result) => result.map(Some),
                    None => Err(EvalError::NotCallable {
                        callee: describe(callee),
                    }),
                }
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.chain(object)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                if let Some(target_name) = nullish_name(&target) {
                    return Err(EvalError::NullAccess {
                        target: target_name,
                        property: property.to_string(),
                    });
                }
                let values = self.args(args)?;
                match builtins::call_method(&target, property.as_str(), &values) {
                    Some(result) => result.map(Some),
                    None => Err(EvalError::NotCallable {
                        callee: describe(callee),
                    }),
                }
            }
            _ => Err(EvalError::NotCallable {
                callee: describe(callee),
            }),
        }
    }

    fn args(&self, args: &[Spanned<Expr>]) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn unary(&self, op: UnaryOp, operand: &Spanned<Expr>) -> Result<Value, EvalError> {
        if op == UnaryOp::Typeof {
            // `typeof` tolerates unbound names
            if let Expr::Ident(name) = &operand.node {
                if self.scope.lookup(name.as_str()).is_none() {
                    return Ok(Value::from("undefined"));
                }
            }
            return Ok(Value::from(self.eval(operand)?.type_of()));
        }
        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Typeof => Value::from(value.type_of()),
        })
    }

    fn binary(
        &self,
        op: BinaryOp,
        left: &Spanned<Expr>,
        right: &Spanned<Expr>,
    ) -> Result<Value, EvalError> {
        // Short-circuit operators return one of their operands
        match op {
            BinaryOp::And => {
                let l = self.eval(left)?;
                return if l.is_truthy() { self.eval(right) } else { Ok(l) };
            }
            BinaryOp::Or => {
                let l = self.eval(left)?;
                return if l.is_truthy() { Ok(l) } else { self.eval(right) };
            }
            BinaryOp::Nullish => {
                let l = self.eval(left)?;
                return if l.is_nullish() { self.eval(right) } else { Ok(l) };
            }
            _ => {}
        }

        let l = self.eval(left)?;
        let r = self.eval(right)?;
        Ok(match op {
            BinaryOp::Add => add(&l, &r),
            BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
            BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
            BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
            BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
            BinaryOp::Less => Value::Bool(compare(&l, &r, |o| o.is_lt())),
            BinaryOp::LessOrEqual => Value::Bool(compare(&l, &r, |o| o.is_le())),
            BinaryOp::Greater => Value::Bool(compare(&l, &r, |o| o.is_gt())),
            BinaryOp::GreaterOrEqual => Value::Bool(compare(&l, &r, |o| o.is_ge())),
            BinaryOp::LooseEq => Value::Bool(l.loose_eq(&r)),
            BinaryOp::LooseNotEq => Value::Bool(!l.loose_eq(&r)),
            BinaryOp::StrictEq => Value::Bool(l.strict_eq(&r)),
            BinaryOp::StrictNotEq => Value::Bool(!l.strict_eq(&r)),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => Value::Undefined,
        })
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Undefined => Value::Undefined,
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn nullish_name(value: &Value) -> Option<&'static str> {
    match value {
        Value::Undefined => Some("undefined"),
        Value::Null => Some("null"),
        _ => None,
    }
}

fn read_property(target: &Value, key: &str) -> Result<Value, EvalError> {
    match nullish_name(target) {
        Some(name) => Err(EvalError::NullAccess {
            target: name,
            property: key.to_string(),
        }),
        None => Ok(builtins::get_property(target, key)),
    }
}

/// `Math`, `JSON`, `Object` and `Array` unless a prop shadows them
fn is_unbound_namespace(object: &Spanned<Expr>, scope: &Scope<'_>) -> bool {
    match &object.node {
        Expr::Ident(name) => {
            builtins::NAMESPACES.contains(&name.as_str()) && scope.lookup(name.as_str()).is_none()
        }
        _ => false,
    }
}

/// `+`: string concatenation when either side is (or converts to) a string
fn add(l: &Value, r: &Value) -> Value {
    let stringy = |v: &Value| matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_));
    if stringy(l) || stringy(r) {
        Value::String(format!("{}{}", l.to_display_string(), r.to_display_string()))
    } else {
        Value::Number(l.to_number() + r.to_number())
    }
}

/// Relational comparison; strings compare lexically, anything else numerically
fn compare(l: &Value, r: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::String(a), Value::String(b)) = (l, r) {
        return test(a.cmp(b));
    }
    l.to_number()
        .partial_cmp(&r.to_number())
        .is_some_and(test)
}

/// Dotted name of a callee for error messages
fn describe(expr: &Spanned<Expr>) -> String {
    match &expr.node {
        Expr::Ident(name) => name.to_string(),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", describe(object), property),
        Expr::Index { object, .. } => format!("{}[...]", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}
