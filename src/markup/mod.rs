//! Markup tree and the HTML-dialect parser that builds it
//!
//! The parser is deliberately forgiving: unknown tags become elements,
//! unmatched closing tags become STRAY nodes, and `{{ }}` expressions are
//! never split by a `<` inside them.

mod html;
mod tree;

pub use html::{decode_entities, parse};
pub use tree::{Node, NodeId, NodeKind, Tree, Visit};

/// Elements that never have children
pub const VOID_TAGS: &[&str] = &[
    "area",
    "base",
    "br",
    "col",
    "embed",
    "hr",
    "img",
    "input",
    "link",
    "meta",
    "param",
    "source",
    "track",
    "wbr",
    "ssr-else",
    "ssr-elseif",
];

/// Elements whose content is kept verbatim
pub const OPAQUE_TAGS: &[&str] = &["script", "style", "svg", "textarea", "ssr-script"];

/// Phrasing elements that affect whitespace handling
pub const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "kbd", "label",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

/// Directive names that may be written without the `ssr-` prefix
const DIRECTIVE_ALIASES: &[&str] = &[
    "if", "elseif", "else", "for", "fragment", "portal", "slot", "cache", "element",
];

/// Normalize an authored tag name
///
/// Tags are lowercased and bare directive aliases gain the `ssr-` prefix,
/// so `<For>` and `<ssr-for>` name the same directive.
pub fn canonical_tag(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if DIRECTIVE_ALIASES.contains(&lower.as_str()) {
        format!("ssr-{}", lower)
    } else {
        lower
    }
}

pub fn is_inline(tag: &str) -> bool {
    INLINE_TAGS.contains(&tag)
}
