//! Integration tests for `<ssr-html>`, `<ssr-element>`, portals and cache spans

use markup_ssr::{render, DiagnosticCategory, Engine, Props, Value};
use pretty_assertions::assert_eq;

fn with(name: &str, value: Value) -> Props {
    let mut props = Props::new();
    props.insert(name.to_string(), value);
    props
}

fn messages(engine: &Engine, markup: &str) -> (String, Vec<String>) {
    let (html, diagnostics) = engine
        .render_with_diagnostics(markup, &Props::new())
        .expect("Should render");
    (html, diagnostics.into_iter().map(|d| d.message).collect())
}

#[test]
fn test_raw_html_is_not_escaped() {
    let props = with("markup", Value::from("<b>bold</b>"));
    let html = render("<div><ssr-html>{{ markup }}</ssr-html> {{ markup }}</div>", &props)
        .expect("Should render");
    assert_eq!(html, "<div><b>bold</b> &lt;b&gt;bold&lt;/b&gt;</div>");
}

#[test]
fn test_raw_html_keeps_directives_literal() {
    let html = render(r#"<ssr-html><if condition="false">x</if></ssr-html>"#, &Props::new())
        .expect("Should render");
    assert_eq!(html, r#"<if condition="false">x</if>"#);
}

#[test]
fn test_raw_html_without_content() {
    let (html, messages) = messages(&Engine::new(), "<ssr-html></ssr-html>ok");
    assert_eq!(html, "ok");
    assert_eq!(messages, vec!["<ssr-html> with no content"]);
}

#[test]
fn test_dynamic_element() {
    let props = with("level", Value::from("h2"));
    let html = render(r#"<element tag="{{ level }}" class="title">Hi</element>"#, &props)
        .expect("Should render");
    assert_eq!(html, r#"<h2 class="title">Hi</h2>"#);
}

#[test]
fn test_dynamic_void_element() {
    let html = render(r#"<element tag="br"/><element tag="div"/>"#, &Props::new()).expect("Should render");
    assert_eq!(html, "<br/><div></div>");
}

#[test]
fn test_dynamic_element_with_empty_tag() {
    let (html, messages) = messages(&Engine::new(), r#"<element tag="{{ '' }}">body</element>"#);
    assert_eq!(html, "body");
    assert_eq!(messages, vec![r#"<ssr-element> with empty "tag" property"#]);
}

#[test]
fn test_dynamic_element_without_tag() {
    let (html, messages) = messages(&Engine::new(), "<element>body</element>");
    assert_eq!(html, "");
    assert_eq!(messages, vec![r#"<ssr-element> missing "tag" property"#]);
}

#[test]
fn test_portal_collects_fragments() {
    let input = r#"<head><portal name="head"></portal></head><body><fragment portal="head"><meta charset="utf-8"></fragment><p>x</p><fragment portal="head"><title>T</title></fragment></body>"#;
    let html = render(input, &Props::new()).expect("Should render");
    assert_eq!(
        html,
        r#"<head><meta charset="utf-8"/><title>T</title></head><body><p>x</p></body>"#
    );
}

#[test]
fn test_portal_without_fragments_is_empty() {
    let html = render(r#"<div><portal name="side"></portal></div>"#, &Props::new()).expect("Should render");
    assert_eq!(html, "<div></div>");
}

#[test]
fn test_portal_fragment_from_component() {
    let mut engine = Engine::new();
    engine
        .set_template(
            "my-page",
            r#"<head><portal name="head"></portal></head><body><slot></slot></body>"#,
        )
        .expect("Should register");
    let props = with("title", Value::from("Home"));
    let html = engine
        .render(
            r#"<my-page><fragment portal="head"><title>{{ title }}</title></fragment><p>x</p></my-page>"#,
            &props,
        )
        .expect("Should render");
    assert_eq!(html, "<head><title>Home</title></head><body><p>x</p></body>");
}

#[test]
fn test_fragment_directive_errors() {
    let (html, messages) = messages(
        &Engine::new(),
        r#"<fragment>a</fragment><fragment slot="x">b</fragment>c"#,
    );
    assert_eq!(html, "c");
    assert_eq!(
        messages,
        vec![
            r#"<ssr-fragment> missing "slot" or "portal" property"#,
            r#"<ssr-fragment slot="x"> outside of a component"#,
        ]
    );
}

#[test]
fn test_cache_is_reused_across_renders() {
    let engine = Engine::new();
    let input = r#"<cache name="count"><p>{{ n }}</p></cache>"#;

    let html = engine.render(input, &with("n", Value::from(1))).expect("Should render");
    assert_eq!(html, "<p>1</p>");
    assert_eq!(engine.cached("count").as_deref(), Some("<p>1</p>"));

    let html = engine.render(input, &with("n", Value::from(2))).expect("Should render");
    assert_eq!(html, "<p>1</p>");

    // A stored span needs no body
    let html = engine
        .render(r#"<cache name="count"></cache>"#, &Props::new())
        .expect("Should render");
    assert_eq!(html, "<p>1</p>");

    engine.clear_cache();
    let html = engine.render(input, &with("n", Value::from(2))).expect("Should render");
    assert_eq!(html, "<p>2</p>");
}

#[test]
fn test_cache_errors() {
    let (html, messages) = messages(
        &Engine::new(),
        r#"<cache>a</cache><cache name="empty"></cache>b"#,
    );
    assert_eq!(html, "b");
    assert_eq!(
        messages,
        vec![
            r#"<ssr-cache> missing "name" property"#,
            "<ssr-cache> with no content",
        ]
    );
}

#[test]
fn test_cache_repeated_in_loop_fails() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics(
            r#"<for item="i" of="2"><cache name="row">{{ i }}</cache></for>"#,
            &Props::new(),
        )
        .expect("Should render");
    assert_eq!(html, "01");
    assert_eq!(diagnostics[0].category, DiagnosticCategory::Cache);
    assert_eq!(diagnostics[0].message, r#"<ssr-cache name="row"> failed"#);
    assert_eq!(engine.cached("row"), None);
}

#[test]
fn test_portal_after_fragments() {
    let input = r#"<fragment portal="tail">a</fragment><p>x</p><fragment portal="tail">b</fragment><footer><portal name="tail"></portal></footer>"#;
    let html = render(input, &Props::new()).expect("Should render");
    assert_eq!(html, "<p>x</p><footer>ab</footer>");
}

#[test]
fn test_escaping_round_trip() {
    let raw = r#"<a href="x">Tom & 'Jerry'</a>"#;
    let props = with("s", Value::from(raw));
    let escaped = render("{{ s }}", &props).expect("Should render");
    assert_eq!(escaped, "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
    let unescaped = render("<ssr-html>{{ s }}</ssr-html>", &props).expect("Should render");
    assert_eq!(unescaped, raw);
}

#[test]
fn test_static_render_is_idempotent() {
    let engine = Engine::new();
    let input = r#"<ul><for item="i" of="3"><li class="{{ i % 2 ? 'odd' : 'even' }}">{{ i }}</li></for></ul>"#;
    let first = engine.render(input, &Props::new()).expect("Should render");
    let second = engine.render(input, &Props::new()).expect("Should render");
    assert_eq!(first, second);
    insta::assert_snapshot!(first, @r#"<ul><li class="even">0</li><li class="odd">1</li><li class="even">2</li></ul>"#);
}
