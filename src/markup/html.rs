//! Markup parser

use indexmap::IndexMap;

use super::tree::{Node, NodeId, NodeKind, Tree};
use super::{canonical_tag, OPAQUE_TAGS, VOID_TAGS};

/// Parse markup text into a tree
pub fn parse(source: &str) -> Tree {
    let mut parser = Parser {
        src: source,
        pos: 0,
        tree: Tree::new(),
        stack: Vec::new(),
    };
    parser.stack.push(parser.tree.root());
    parser.run();
    parser.tree
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    tree: Tree,
    /// Open elements, root first
    stack: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.tree.create(node);
        let parent = self.current();
        self.tree.append(parent, id);
        id
    }

    fn run(&mut self) {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.comment();
            } else if rest.starts_with("<!") {
                self.declaration();
            } else if rest.starts_with("</") && starts_tag_name(&rest[2..]) {
                self.close_tag();
            } else if rest.starts_with('<') && starts_tag_name(&rest[1..]) {
                self.open_tag();
            } else {
                self.text();
            }
        }
    }

    fn comment(&mut self) {
        let end = match self.rest()[4..].find("-->") {
            Some(offset) => self.pos + 4 + offset + 3,
            None => self.src.len(),
        };
        let raw = &self.src[self.pos..end];
        self.push_node(Node::comment(raw));
        self.pos = end;
    }

    fn declaration(&mut self) {
        let end = match self.rest().find('>') {
            Some(offset) => self.pos + offset + 1,
            None => self.src.len(),
        };
        let raw = &self.src[self.pos..end];
        self.push_node(Node::comment(raw));
        self.pos = end;
    }

    fn text(&mut self) {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        // Always consume at least one byte so a lone `<` makes progress
        let mut i = self.pos + 1;
        if bytes[self.pos] == b'{' {
            i = self.pos;
        }
        while i < bytes.len() {
            if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
                match self.src[i + 2..].find("}}") {
                    Some(offset) => i += 2 + offset + 2,
                    None => i = bytes.len(),
                }
                continue;
            }
            if bytes[i] == b'<' {
                let after = &self.src[i + 1..];
                if after.starts_with('!')
                    || starts_tag_name(after)
                    || (after.starts_with('/') && starts_tag_name(&after[1..]))
                {
                    break;
                }
            }
            i += 1;
        }
        let end = i.min(bytes.len());
        let end = floor_char_boundary(self.src, end);
        self.push_node(Node::text(&self.src[start..end]));
        self.pos = end;
    }

    fn tag_name(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn close_tag(&mut self) {
        let start = self.pos;
        self.pos += 2;
        let name = self.tag_name();
        let tag = canonical_tag(name);
        let end = match self.rest().find('>') {
            Some(offset) => self.pos + offset + 1,
            None => self.src.len(),
        };
        self.pos = end;

        let open = self
            .stack
            .iter()
            .skip(1)
            .rposition(|&id| self.tree.get(id).tag == tag);
        match open {
            // `skip(1)` shifts positions by one
            Some(position) => self.stack.truncate(position + 1),
            None => {
                let mut stray = Node::element(NodeKind::Stray, name);
                stray.raw = self.src[start..end].to_string();
                self.push_node(stray);
            }
        }
    }

    fn attributes(&mut self) -> (IndexMap<String, String>, bool) {
        let mut attributes = IndexMap::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return (attributes, false);
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return (attributes, true);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return (attributes, false);
            }

            let len = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len());
            if len == 0 {
                // Stray `/` or `=`
                self.pos += 1;
                continue;
            }
            let key = rest[..len].to_string();
            self.pos += len;

            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                attributes.insert(key, String::new());
                continue;
            }
            self.pos += 1;
            self.skip_whitespace();
            let value = self.attribute_value();
            attributes.insert(key, decode_entities(&value));
        }
    }

    fn attribute_value(&mut self) -> String {
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let body = &rest[1..];
            let len = body.find(quote).unwrap_or(body.len());
            self.pos += 1 + len + usize::from(len < body.len());
            return body[..len].to_string();
        }

        // Unquoted: ends at whitespace or `>`, skipping over expressions
        let bytes = rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
                match rest[i + 2..].find("}}") {
                    Some(offset) => i += 2 + offset + 2,
                    None => i = bytes.len(),
                }
                continue;
            }
            if bytes[i].is_ascii_whitespace() || bytes[i] == b'>' {
                break;
            }
            i += 1;
        }
        let i = floor_char_boundary(rest, i.min(bytes.len()));
        self.pos += i;
        rest[..i].to_string()
    }

    fn open_tag(&mut self) {
        self.pos += 1;
        let name = self.tag_name();
        let tag = canonical_tag(name);
        let (attributes, self_closing) = self.attributes();

        if OPAQUE_TAGS.contains(&tag.as_str()) {
            let mut node = Node::element(NodeKind::Opaque, name);
            node.attributes = attributes;
            let id = self.push_node(node);
            if !self_closing {
                self.opaque_content(id, name);
            }
            return;
        }

        let kind = if self_closing || VOID_TAGS.contains(&tag.as_str()) {
            NodeKind::Void
        } else {
            NodeKind::Element
        };
        let mut node = Node::element(kind, name);
        node.attributes = attributes;
        let id = self.push_node(node);
        if kind == NodeKind::Element {
            self.stack.push(id);
        }
    }

    /// Consume everything up to the matching close tag as one TEXT child
    fn opaque_content(&mut self, id: NodeId, name: &str) {
        let needle = format!("</{}", name.to_ascii_lowercase());
        let lower = self.rest().to_ascii_lowercase();
        let (content_len, close_len) = match lower.find(&needle) {
            Some(offset) => {
                let close = lower[offset..].find('>').map(|e| e + 1).unwrap_or(lower.len() - offset);
                (offset, close)
            }
            None => (lower.len(), 0),
        };
        let content = &self.rest()[..content_len];
        if !content.is_empty() {
            let text = self.tree.create(Node::text(content));
            self.tree.append(id, text);
        }
        self.pos += content_len + close_len;
    }
}

fn starts_tag_name(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Decode the HTML character references used in attribute values
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
