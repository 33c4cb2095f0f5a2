//! Parser for template expressions and component scripts

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::{parse_expression, parse_script};
