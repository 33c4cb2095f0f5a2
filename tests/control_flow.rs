//! Integration tests for `<ssr-if>` and `<ssr-for>`

use markup_ssr::{render, DiagnosticCategory, Engine, Props, RenderError, Value};
use pretty_assertions::assert_eq;

fn with(name: &str, value: Value) -> Props {
    let mut props = Props::new();
    props.insert(name.to_string(), value);
    props
}

fn strings(items: &[&str]) -> Value {
    Value::array(items.iter().map(|s| Value::from(*s)).collect())
}

#[test]
fn test_if_elseif_else() {
    let input = r#"<if condition="n > 1">many<elseif condition="n === 1">one<else>none</if>"#;
    let cases = [(2, "many"), (1, "one"), (0, "none")];
    for (n, expected) in cases {
        let html = render(input, &with("n", Value::from(n))).expect("Should render");
        assert_eq!(html, expected, "n = {}", n);
    }
}

#[test]
fn test_if_without_else_renders_nothing() {
    let input = r#"<p><ssr-if condition="{{ show }}">shown</ssr-if></p>"#;
    let html = render(input, &with("show", Value::from(false))).expect("Should render");
    assert_eq!(html, "<p></p>");
    let html = render(input, &with("show", Value::from("yes"))).expect("Should render");
    assert_eq!(html, "<p>shown</p>");
}

#[test]
fn test_untaken_arms_are_not_evaluated() {
    let input = r#"<if condition="true">ok<else>{{ missing.value }}</if>"#;
    let html = render(input, &Props::new()).expect("Should render");
    assert_eq!(html, "ok");
}

#[test]
fn test_if_missing_condition_is_removed() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics("<if>hidden</if><p>after</p>", &Props::new())
        .expect("Should render");
    assert_eq!(html, "<p>after</p>");
    assert_eq!(diagnostics[0].category, DiagnosticCategory::Directive);
    assert_eq!(diagnostics[0].message, r#"<ssr-if> missing "condition" property"#);
}

#[test]
fn test_elseif_without_condition_is_false() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics(
            r#"<if condition="false">a<elseif>b<else>c</if>"#,
            &Props::new(),
        )
        .expect("Should render");
    assert_eq!(html, "c");
    assert_eq!(diagnostics[0].message, "<ssr-elseif> with invalid condition");
}

#[test]
fn test_else_outside_if() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics("<p>x<else>y</p>", &Props::new())
        .expect("Should render");
    assert_eq!(html, "<p>xy</p>");
    assert_eq!(diagnostics[0].message, "<ssr-else> outside of <ssr-if>");
}

#[test]
fn test_for_over_array_with_index() {
    let input = r#"<ul><for item="name" index="i" of="names"><li>{{ i }}:{{ name }}</li></for></ul>"#;
    let html = render(input, &with("names", strings(&["ada", "bob"]))).expect("Should render");
    assert_eq!(html, "<ul><li>0:ada</li><li>1:bob</li></ul>");
}

#[test]
fn test_for_over_numbers_and_strings() {
    let range = render(r#"<for item="n" of="3">{{ n + 1 }}</for>"#, &Props::new()).expect("Should render");
    let array = render(r#"<for item="n" of="{{ [0, 1, 2] }}">{{ n + 1 }}</for>"#, &Props::new())
        .expect("Should render");
    assert_eq!(range, "123");
    assert_eq!(range, array);

    let numeric = render(r#"<for item="n" of="count">[{{ n }}]</for>"#, &with("count", Value::from("2")))
        .expect("Should render");
    assert_eq!(numeric, "[0][1]");

    let chars = render(r#"<for item="c" of="'ab'">[{{ c }}]</for>"#, &Props::new()).expect("Should render");
    assert_eq!(chars, "[a][b]");
}

#[test]
fn test_nested_loops_shadow_names() {
    let input = r#"<for item="x" of="2"><for item="x" of="'ab'">{{ x }}</for>{{ x }};</for>"#;
    let html = render(input, &Props::new()).expect("Should render");
    assert_eq!(html, "ab0;ab1;");
}

#[test]
fn test_loop_item_is_not_visible_after_loop() {
    let err = render(r#"<for item="x" of="1">.</for>{{ x }}"#, &Props::new()).unwrap_err();
    assert!(err.to_string().starts_with(r#""x is not defined""#), "got: {}", err);
}

#[test]
fn test_for_not_iterable() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics(r#"<p><for item="x" of="null">{{ x }}</for></p>"#, &Props::new())
        .expect("Should render");
    assert_eq!(html, "<p></p>");
    assert_eq!(diagnostics[0].category, DiagnosticCategory::Loop);
    assert_eq!(diagnostics[0].message, r#"<ssr-for> invalid "of" property (not iterable)"#);
}

#[test]
fn test_for_negative_length_fails() {
    let err = render(r#"<for item="x" of="-1">{{ x }}</for>"#, &Props::new()).unwrap_err();
    match err {
        RenderError::Expression { message, .. } => assert_eq!(message, "invalid array length"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_for_over_string_with_leading_integer() {
    let render_of = |of: &str| {
        render(&format!(r#"<for item="n" of="{}">[{{{{ n }}}}]</for>"#, of), &Props::new())
            .expect("Should render")
    };
    assert_eq!(render_of("'2.0'"), "[0][1]");
    assert_eq!(render_of("'1.5'"), "[0]");
    assert_eq!(render_of("'3px'"), "[0][1][2]");
    assert_eq!(render_of("'px'"), "[p][x]");
}

#[test]
fn test_oversized_lengths_fail() {
    let cases = [
        (r#"<for item="n" of="1e19">x</for>"#, "invalid array length"),
        (r#"<for item="n" of="'4294967296'">x</for>"#, "invalid array length"),
        ("{{ 'ab'.repeat(1e19) }}", "Invalid string length"),
        ("{{ 'a'.padStart(1e19) }}", "Invalid string length"),
    ];
    for (markup, expected) in cases {
        match render(markup, &Props::new()).unwrap_err() {
            RenderError::Expression { message, .. } => assert_eq!(message, expected, "{}", markup),
            other => panic!("unexpected error: {}", other),
        }
    }
}

#[test]
fn test_for_invalid_attributes_are_removed() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics(
            r#"<for of="3">a</for><for item="1x" of="3">b</for><for item="x" of="3"></for>done"#,
            &Props::new(),
        )
        .expect("Should render");
    assert_eq!(html, "done");
    let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            r#"<ssr-for> invalid "item" property"#,
            r#"<ssr-for> invalid "item" property"#,
            "<ssr-for> with no statement",
        ]
    );
}

#[test]
fn test_for_rejects_keywords_and_reserved_names() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics(
            r#"<for item="$local" of="2">a</for><for item="true" of="2">b</for><for item="x" index="globalProps" of="2">c</for><for item="x" index="const" of="2">d</for>done"#,
            &Props::new(),
        )
        .expect("Should render");
    assert_eq!(html, "done");
    let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            r#"<ssr-for> invalid "item" property"#,
            r#"<ssr-for> invalid "item" property"#,
            r#"<ssr-for> invalid "index" property"#,
            r#"<ssr-for> invalid "index" property"#,
        ]
    );
}

#[test]
fn test_loop_in_attribute_context() {
    let input = r#"<for item="c" of="colors"><span class="c-{{ c }}">{{ c }}</span></for>"#;
    let html = render(input, &with("colors", strings(&["red", "blue"]))).expect("Should render");
    insta::assert_snapshot!(html, @r#"<span class="c-red">red</span><span class="c-blue">blue</span>"#);
}
