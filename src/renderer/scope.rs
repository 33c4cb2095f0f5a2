//! Prop scope stack

use crate::value::{Props, Value};
use crate::parser::Identifier;

/// Names that user props can never set
pub const RESERVED_PROPS: &[&str] = &["globalProps", "$global", "$local"];

/// Containers exposing every global prop
const GLOBAL_CONTAINERS: &[&str] = &["globalProps", "$global"];

/// Snapshot of the props passed at the nearest component boundary
pub const LOCAL_PROPS: &str = "$local";

/// Convert an attribute name to a prop name (`camel-case` -> `camelCase`)
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Normalize a prop name, or explain why it cannot be used
pub fn normalize_prop(name: &str) -> Result<String, String> {
    let key = to_camel_case(name);
    if RESERVED_PROPS.contains(&key.as_str()) {
        return Err(format!("invalid prop \"{}\" is reserved", key));
    }
    if !Identifier::is_valid(&key) {
        return Err(format!("invalid prop \"{}\"", name));
    }
    Ok(key)
}

/// Layered name lookup for one render
///
/// Frames are searched top-down, then the global props, then the global
/// containers. Each render owns its scope, so concurrent renders never
/// share frames.
#[derive(Debug)]
pub struct Scope<'g> {
    globals: &'g Props,
    global_object: Value,
    frames: Vec<Props>,
}

impl<'g> Scope<'g> {
    pub fn new(globals: &'g Props) -> Self {
        Self {
            globals,
            global_object: Value::object(globals.clone()),
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, frame: Props) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Props> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.globals.get(name))
            .or_else(|| GLOBAL_CONTAINERS.contains(&name).then_some(&self.global_object))
    }

    /// Bind a name in the innermost frame
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if self.frames.is_empty() {
            self.frames.push(Props::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }
}
