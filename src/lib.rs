//! Markup SSR - server-side rendering of an HTML template dialect
//!
//! Templates are HTML with `{{ expression }}` interpolation, control-flow
//! directives (`<ssr-if>`, `<ssr-for>`, ...), reusable components with
//! slots, portals and cached spans. Markup is parsed into a tree, compiled
//! into a program and executed once per render.
//!
//! # Example
//!
//! ```rust
//! use markup_ssr::{Engine, Props, Value};
//!
//! let mut engine = Engine::new();
//! engine
//!     .set_template("my-greeting", "<p>Hello, {{ name }}!</p>")
//!     .unwrap();
//!
//! let mut props = Props::new();
//! props.insert("who".into(), Value::from("<World>"));
//!
//! let html = engine
//!     .render(r#"<my-greeting name="{{ who }}"></my-greeting>"#, &props)
//!     .unwrap();
//! assert_eq!(html, "<p>Hello, &lt;World&gt;!</p>");
//! ```

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod markup;
pub mod parser;
pub mod renderer;
pub mod tags;
pub mod template;
pub mod value;

pub use cache::CacheStore;
pub use config::{ConfigError, EngineConfig, Options};
pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use engine::Engine;
pub use error::ParseError;
pub use renderer::EvalError;
pub use template::{TemplateError, TemplateRegistry};
pub use value::{Props, Value};

use thiserror::Error;

/// Errors that abort a render
#[derive(Debug, Error)]
pub enum RenderError {
    /// An expression failed to parse or evaluate
    #[error("{}", describe_expression(.message, .expression, .element))]
    Expression {
        message: String,
        /// Expression as authored, e.g. `{{ user.name }}`
        expression: String,
        /// Nearest component instance or element
        element: Option<String>,
        syntax: Option<Box<SyntaxDetail>>,
    },

    /// Template registration failed
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration or props could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Parse failure behind a [`RenderError::Expression`]
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxDetail {
    /// Code handed to the parser
    pub source: String,
    pub error: ParseError,
}

fn describe_expression(message: &str, expression: &str, element: &Option<String>) -> String {
    let mut out = format!("\"{}\" in expression: \"{}\"", message, expression);
    if let Some(element) = element {
        out.push_str(&format!(" in element: <{}>", element));
    }
    out
}

impl RenderError {
    pub(crate) fn syntax(
        expression: &str,
        code: &str,
        element: Option<String>,
        errors: Vec<ParseError>,
    ) -> Self {
        let error = errors.into_iter().next();
        RenderError::Expression {
            message: error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "invalid expression".to_string()),
            expression: expression.to_string(),
            element,
            syntax: error.map(|error| {
                Box::new(SyntaxDetail {
                    source: code.to_string(),
                    error,
                })
            }),
        }
    }

    pub(crate) fn evaluation(expr: &renderer::program::Expression, err: EvalError) -> Self {
        RenderError::Expression {
            message: err.to_string(),
            expression: expr.source.clone(),
            element: expr.element.clone(),
            syntax: None,
        }
    }

    /// Human-readable report; syntax errors include source context
    pub fn report(&self) -> String {
        match self {
            RenderError::Expression {
                syntax: Some(detail),
                ..
            } => format!("{}\n{}", self, detail.error.format(&detail.source, "expression")),
            _ => self.to_string(),
        }
    }
}

/// Render markup with a default engine
///
/// # Example
///
/// ```rust
/// use markup_ssr::{render, Props};
///
/// let html = render(r#"<for item="n" of="3">{{ n + 1 }}</for>"#, &Props::new()).unwrap();
/// assert_eq!(html, "123");
/// ```
pub fn render(markup: &str, props: &Props) -> Result<String, RenderError> {
    Engine::new().render(markup, props)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_markup() {
        let html = render("<div hidden=\"{{false}}\" />", &Props::new()).unwrap();
        assert_eq!(html, r#"<div hidden="false"/>"#);
    }

    #[test]
    fn test_undefined_attribute_is_omitted() {
        let html = render("<div hidden=\"{{undefined}}\" />", &Props::new()).unwrap();
        assert_eq!(html, "<div/>");
    }

    #[test]
    fn test_expression_error_display() {
        let err = render("<p>{{ missing }}</p>", &Props::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#""missing is not defined" in expression: "{{ missing }}" in element: <p>"#
        );
    }

    #[test]
    fn test_syntax_error_report() {
        let err = render("{{ a + }}", &Props::new()).unwrap_err();
        assert!(matches!(err, RenderError::Expression { syntax: Some(_), .. }));
        let report = err.report();
        assert!(report.contains("{{ a + }}"), "got: {}", report);
        assert!(report.contains("expression"));
    }
}
