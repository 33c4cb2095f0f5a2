//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::value::format_number;

/// Parse a single template expression (the inside of `{{ }}`)
pub fn parse_expression(input: &str) -> Result<Spanned<Expr>, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Parse the body of a `<script context="component">` block
pub fn parse_script(input: &str) -> Result<Script, Vec<crate::ParseError>> {
    let len = input.len();
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));
    let token_stream =
        Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    script_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// Postfix operation applied to an atom
#[derive(Debug, Clone)]
enum Postfix {
    Member(Identifier, bool),
    Index(Spanned<Expr>, bool),
    Call(Vec<Spanned<Expr>>),
}

fn binary(left: Spanned<Expr>, (op, right): (BinaryOp, Spanned<Expr>)) -> Spanned<Expr> {
    let span = left.span.start..right.span.end;
    Spanned::new(
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn expression_parser<'a, I>(
) -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let identifier = select! {
            Token::Ident(s) => Identifier::new(s),
        };

        let literal = select! {
            Token::Number(n) => Expr::Literal(Literal::Number(n)),
            Token::String(s) => Expr::Literal(Literal::String(s)),
            Token::True => Expr::Literal(Literal::Bool(true)),
            Token::False => Expr::Literal(Literal::Bool(false)),
            Token::Null => Expr::Literal(Literal::Null),
            Token::Undefined => Expr::Literal(Literal::Undefined),
        };

        let array = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(Expr::Array);

        // Object entries: `key: value` or shorthand `key`
        let key = select! {
            Token::Ident(s) => s,
            Token::String(s) => s,
            Token::Number(n) => format_number(n),
        };
        let entry = choice((
            key.then_ignore(just(Token::Colon)).then(expr.clone()),
            identifier.clone().map_with(|id, e| {
                (
                    id.0.clone(),
                    Spanned::new(Expr::Ident(id), span_range(&e.span())),
                )
            }),
        ));
        let object = entry
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
            .map(Expr::Object);

        let atom = choice((
            literal,
            identifier.clone().map(Expr::Ident),
            array,
            object,
        ))
        .map_with(|node, e| Spanned::new(node, span_range(&e.span())))
        .or(expr
            .clone()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)))
        .boxed();

        // Member access, indexing and calls
        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

        let index = expr
            .clone()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose));

        let postfix_op = choice((
            just(Token::Dot)
                .ignore_then(identifier.clone())
                .map(|id| Postfix::Member(id, false)),
            just(Token::OptionalDot)
                .ignore_then(identifier)
                .map(|id| Postfix::Member(id, true)),
            just(Token::OptionalDot)
                .ignore_then(index.clone())
                .map(|i| Postfix::Index(i, true)),
            index.map(|i| Postfix::Index(i, false)),
            args.map(Postfix::Call),
        ))
        .map_with(|op, e| (op, span_range(&e.span())));

        let postfix = atom
            .foldl(postfix_op.repeated(), |object, (op, span)| {
                let span = object.span.start..span.end;
                let node = match op {
                    Postfix::Member(property, optional) => Expr::Member {
                        object: Box::new(object),
                        property,
                        optional,
                    },
                    Postfix::Index(index, optional) => Expr::Index {
                        object: Box::new(object),
                        index: Box::new(index),
                        optional,
                    },
                    Postfix::Call(args) => Expr::Call {
                        callee: Box::new(object),
                        args,
                    },
                };
                Spanned::new(node, span)
            })
            .boxed();

        // Prefix operators, right-associative
        let unary_op = select! {
            Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Typeof => UnaryOp::Typeof,
        }
        .map_with(|op, e| (op, span_range(&e.span())));

        let unary = unary_op
            .repeated()
            .foldr(postfix, |(op, span), operand| {
                let span = span.start..operand.span.end;
                Spanned::new(
                    Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                )
            })
            .boxed();

        // Binary operators, lowest level last
        let product = unary
            .clone()
            .foldl(
                select! {
                    Token::Star => BinaryOp::Mul,
                    Token::Slash => BinaryOp::Div,
                    Token::Percent => BinaryOp::Rem,
                }
                .then(unary)
                .repeated(),
                binary,
            )
            .boxed();

        let sum = product
            .clone()
            .foldl(
                select! {
                    Token::Plus => BinaryOp::Add,
                    Token::Minus => BinaryOp::Sub,
                }
                .then(product)
                .repeated(),
                binary,
            )
            .boxed();

        let comparison = sum
            .clone()
            .foldl(
                select! {
                    Token::Less => BinaryOp::Less,
                    Token::LessOrEqual => BinaryOp::LessOrEqual,
                    Token::Greater => BinaryOp::Greater,
                    Token::GreaterOrEqual => BinaryOp::GreaterOrEqual,
                }
                .then(sum)
                .repeated(),
                binary,
            )
            .boxed();

        let equality = comparison
            .clone()
            .foldl(
                select! {
                    Token::LooseEq => BinaryOp::LooseEq,
                    Token::LooseNotEq => BinaryOp::LooseNotEq,
                    Token::StrictEq => BinaryOp::StrictEq,
                    Token::StrictNotEq => BinaryOp::StrictNotEq,
                }
                .then(comparison)
                .repeated(),
                binary,
            )
            .boxed();

        let conjunction = equality
            .clone()
            .foldl(
                just(Token::And).to(BinaryOp::And).then(equality).repeated(),
                binary,
            )
            .boxed();

        let disjunction = conjunction
            .clone()
            .foldl(
                select! {
                    Token::Or => BinaryOp::Or,
                    Token::Nullish => BinaryOp::Nullish,
                }
                .then(conjunction)
                .repeated(),
                binary,
            )
            .boxed();

        // Ternary: test ? consequent : alternate
        disjunction
            .then(
                just(Token::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expr)
                    .or_not(),
            )
            .map(|(test, branches)| match branches {
                Some((consequent, alternate)) => {
                    let span = test.span.start..alternate.span.end;
                    Spanned::new(
                        Expr::Conditional {
                            test: Box::new(test),
                            consequent: Box::new(consequent),
                            alternate: Box::new(alternate),
                        },
                        span,
                    )
                }
                None => test,
            })
            .boxed()
    })
}

fn script_parser<'a, I>() -> impl Parser<'a, I, Script, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let expr = expression_parser();

    let name = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    let kind = select! {
        Token::Const => DeclKind::Const,
        Token::Let => DeclKind::Let,
        Token::Var => DeclKind::Var,
    };

    let declare = kind
        .then(name.clone())
        .then(just(Token::Assign).ignore_then(expr.clone()).or_not())
        .map(|((kind, name), value)| Stmt::Declare { kind, name, value });

    let assign = name
        .then_ignore(just(Token::Assign))
        .then(expr.clone())
        .map(|(name, value)| Stmt::Assign { name, value });

    // Semicolons are optional statement terminators
    let statement = choice((declare, assign, expr.map(Stmt::Expr)))
        .map_with(|s, e| Spanned::new(s, span_range(&e.span())))
        .then_ignore(just(Token::Semicolon).repeated());

    just(Token::Semicolon)
        .repeated()
        .ignore_then(statement.repeated().collect::<Vec<_>>())
        .then_ignore(end())
        .map(|statements| Script { statements })
}
