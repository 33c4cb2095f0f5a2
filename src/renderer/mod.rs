//! HTML renderer
//!
//! A render runs in three stages: the parsed tree is validated and compiled
//! into a [`Program`], the program is executed once against the render's
//! scope, and the resulting HTML is finished by substituting portals and
//! storing cache spans.

pub mod builtins;
mod compiler;
pub mod deferred;
pub mod eval;
mod exec;
pub mod program;
pub mod scope;

pub use compiler::{false_expression, Compiler, Settings};
pub use deferred::{Fragment, Placeholder};
pub use eval::{evaluate, EvalError};
pub use exec::{iterate, Executor};
pub use program::{Op, Program};
pub use scope::Scope;

use crate::diagnostics::{Diagnostic, DiagnosticCategory, Diagnostics};
use crate::markup;
use crate::value::{Props, Value};
use crate::RenderError;

/// HTML and the diagnostics collected while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub html: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render markup with the given props
///
/// `props` shadow `globals` of the same name. Every call owns its tree,
/// scope and output buffer; only the template registry and the cache store
/// in `settings` are shared.
pub fn render(
    source: &str,
    props: &Props,
    globals: &Props,
    settings: Settings<'_>,
) -> Result<Output, RenderError> {
    let tree = markup::parse(source);
    let root = tree.root();
    let mut compiler = Compiler::new(tree, settings);
    compiler.validate(root);
    let program = compiler.compile(root)?;
    tracing::debug!(ops = program.len(), "compiled program");

    let mut scope = Scope::new(globals);
    scope.push(root_frame(props, &mut compiler.diagnostics));

    let mut html = String::new();
    let fragments = {
        let mut executor = Executor::new(&mut compiler, scope);
        executor.run(&program, &mut html)?;
        executor.into_fragments()
    };

    let mut diagnostics = std::mem::take(&mut compiler.diagnostics);
    let html = deferred::resolve(
        html,
        &compiler.portals,
        &fragments,
        &compiler.caches,
        settings.cache,
        &mut diagnostics,
    );
    Ok(Output {
        html,
        diagnostics: diagnostics.into_vec(),
    })
}

/// Scope frame for the props passed to a render call
fn root_frame(props: &Props, diagnostics: &mut Diagnostics) -> Props {
    let mut frame = Props::new();
    for (name, value) in props {
        match scope::normalize_prop(name) {
            Ok(key) => {
                frame.insert(key, value.clone());
            }
            Err(message) => diagnostics.push(DiagnosticCategory::Prop, message),
        }
    }
    let local = Value::object(frame.clone());
    frame.insert(scope::LOCAL_PROPS.to_string(), local);
    frame
}
