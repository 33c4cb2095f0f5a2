//! Integration tests for plain markup rendering: interpolation, attributes,
//! whitespace and expression errors

use markup_ssr::{render, DiagnosticCategory, Engine, Options, Props, RenderError, Value};
use pretty_assertions::assert_eq;

fn props(entries: &[(&str, Value)]) -> Props {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_interpolation_is_escaped() {
    let props = props(&[("name", Value::from("<b>Tom & Jerry</b>"))]);
    let html = render("<p>{{ name }}</p>", &props).expect("Should render");
    assert_eq!(html, "<p>&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;</p>");
}

#[test]
fn test_auto_escape_disabled() {
    let engine = Engine::with_options(Options::new().with_auto_escape(false)).expect("Valid options");
    let props = props(&[("name", Value::from("<b>bold</b>"))]);
    let html = engine.render("<p>{{ name }}</p>", &props).expect("Should render");
    assert_eq!(html, "<p><b>bold</b></p>");
}

#[test]
fn test_values_print_like_strings() {
    let props = props(&[
        ("n", Value::from(2.5)),
        ("whole", Value::from(3)),
        ("items", Value::array(vec![Value::from(1), Value::Null, Value::from("x")])),
        ("flag", Value::from(false)),
    ]);
    let html = render("{{ n }}|{{ whole }}|{{ items }}|{{ flag }}|{{ undefined }}", &props)
        .expect("Should render");
    assert_eq!(html, "2.5|3|1,,x|false|undefined");
}

#[test]
fn test_large_and_small_numbers() {
    let html = render("{{ 123456789012345680000 }} {{ 1e21 }} {{ 1 / 10000000 }}", &Props::new())
        .expect("Should render");
    assert_eq!(html, "123456789012345680000 1e+21 1e-7");
}

#[test]
fn test_attribute_values() {
    let props = props(&[
        ("value", Value::from("say \"hi\"")),
        ("color", Value::from("red")),
        ("missing", Value::Null),
    ]);
    let html = render(
        r#"<input type="text" value="{{ value }}" data-x="{{ missing }}" hidden="{{ '' }}" class="btn btn-{{ color }}" disabled>"#,
        &props,
    )
    .expect("Should render");
    assert_eq!(
        html,
        r#"<input type="text" value="say &quot;hi&quot;" hidden class="btn btn-red" disabled/>"#
    );
}

#[test]
fn test_whole_attribute_expression_keeps_type() {
    let html = render(r#"<div tabindex="{{ 1 + 1 }}" title="{{ 1 }}{{ 1 }}"></div>"#, &Props::new())
        .expect("Should render");
    assert_eq!(html, r#"<div tabindex="2" title="11"></div>"#);
}

#[test]
fn test_failing_attribute_is_dropped() {
    let html = render(r#"<a href="{{ link.url }}" class="x">go</a>"#, &Props::new())
        .expect("Should render");
    assert_eq!(html, r#"<a class="x">go</a>"#);
}

#[test]
fn test_whitespace_collapses() {
    let input = "\n  <div>\n    <p>a</p>   <p>b</p>\n  </div>\n  <span> <b>c</b> </span>\n";
    let html = render(input, &Props::new()).expect("Should render");
    assert_eq!(html, "<div>\n<p>a</p> <p>b</p>\n</div>\n<span><b>c</b></span>");
}

#[test]
fn test_comments_and_opaque_content_are_verbatim() {
    let input = r#"<!-- note --><script>if (a < b) { x = "{{ y }}"; }</script>"#;
    let html = render(input, &Props::new()).expect("Should render");
    assert_eq!(html, input);
}

#[test]
fn test_stray_closing_tag_is_reported() {
    let engine = Engine::new();
    let (html, diagnostics) = engine
        .render_with_diagnostics("<p>a</p></div>", &Props::new())
        .expect("Should render");
    assert_eq!(html, "<p>a</p>");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].category, DiagnosticCategory::Markup);
}

#[test]
fn test_expressions() {
    let props = props(&[
        ("name", Value::from("ada")),
        ("count", Value::from(3)),
        ("tags", Value::array(vec![Value::from("a"), Value::from("b")])),
        ("user", Value::object(props_object())),
    ]);
    let input = "{{ name.toUpperCase() }} {{ count > 1 ? 'items' : 'item' }} \
                 {{ tags.join('+') }} {{ Math.max(count, 10) }} {{ user?.address?.city ?? 'none' }} \
                 {{ typeof nothing }}";
    let html = render(input, &props).expect("Should render");
    insta::assert_snapshot!(html, @"ADA items a+b 10 none undefined");
}

fn props_object() -> markup_ssr::value::Object {
    let mut user = markup_ssr::value::Object::new();
    user.insert("name".into(), Value::from("Ada"));
    user
}

#[test]
fn test_props_shadow_globals() {
    let mut globals = Props::new();
    globals.insert("site".into(), Value::from("Example"));
    globals.insert("lang".into(), Value::from("en"));
    let engine = Engine::with_options(Options::new().with_global_props(globals)).expect("Valid options");

    let props = props(&[("lang", Value::from("fr"))]);
    let html = engine
        .render("{{ site }} {{ lang }} {{ $global.lang }} {{ globalProps.site }}", &props)
        .expect("Should render");
    assert_eq!(html, "Example fr en Example");
}

#[test]
fn test_prop_names_are_camel_cased() {
    let props = props(&[("first-name", Value::from("Ada"))]);
    let html = render("{{ firstName }} {{ $local.firstName }}", &props).expect("Should render");
    assert_eq!(html, "Ada Ada");
}

#[test]
fn test_reserved_prop_is_rejected() {
    let engine = Engine::new();
    let props = props(&[("$global", Value::from(1))]);
    let (html, diagnostics) = engine
        .render_with_diagnostics("<p>ok</p>", &props)
        .expect("Should render");
    assert_eq!(html, "<p>ok</p>");
    assert_eq!(diagnostics[0].category, DiagnosticCategory::Prop);
    assert_eq!(diagnostics[0].message, r#"invalid prop "$global" is reserved"#);
}

#[test]
fn test_undefined_name_aborts_render() {
    let err = render("<div><p>{{ missing }}</p></div>", &Props::new()).unwrap_err();
    match err {
        RenderError::Expression {
            message,
            expression,
            element,
            ..
        } => {
            assert_eq!(message, "missing is not defined");
            assert_eq!(expression, "{{ missing }}");
            assert_eq!(element.as_deref(), Some("p"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_null_property_access() {
    let props = props(&[("user", Value::Null)]);
    let err = render("<p>{{ user.name }}</p>", &props).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#""cannot read properties of null (reading 'name')" in expression: "{{ user.name }}" in element: <p>"#
    );
}

#[test]
fn test_top_level_error_has_no_element() {
    let err = render("{{ nope() }}", &Props::new()).unwrap_err();
    let message = err.to_string();
    assert!(message.ends_with(r#"in expression: "{{ nope() }}""#), "got: {}", message);
}

#[test]
fn test_syntax_error_in_attribute() {
    let err = render(r#"<div title="{{ a + }}"></div>"#, &Props::new()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Expression { syntax: Some(_), ref element, .. } if element.as_deref() == Some("div")
    ));
}

#[test]
fn test_escaped_interpolation_is_literal() {
    let html = render("<p>{{!name}} {{ 1 + 1 }}</p>", &Props::new()).expect("Should render");
    assert_eq!(html, "<p>{{name}} 2</p>");
}
