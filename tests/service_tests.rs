//! Integration tests for the template service: compile, cache, run, remove,
//! and partial registration.

use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use whisker::prelude::*;
use whisker::{DocumentTransform, ParseErrorKind};
use whisker_core::{Document, Node};

// =============================================================================
// Named templates
// =============================================================================

#[test]
fn test_named_compile_is_idempotent() {
    let service = TemplateService::new();
    let first = service.compile_named("A{{x}}", "t1").unwrap();
    let second = service.compile_named("B{{x}}", "t1").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(service.run("t1", &json!({ "x": 5 })).unwrap(), "A5");
    assert_eq!(service.template_count(), 1);
}

#[test]
fn test_cache_hit_does_not_parse_source() {
    let service = TemplateService::new();
    service.compile_named("ok {{x}}", "t").unwrap();

    // Invalid source is never looked at once the name is cached.
    let render = service.compile_named("{{#if}}", "t").unwrap();
    assert_eq!(render(&json!({ "x": 1 })).unwrap(), "ok 1");
}

#[test]
fn test_anonymous_compile_is_uncached() {
    let service = TemplateService::new();
    let render = service.compile("Hi {{name}}").unwrap();

    assert_eq!(render(&json!({ "name": "Ada" })).unwrap(), "Hi Ada");
    assert_eq!(service.template_count(), 0);

    let text = service
        .compile_and_run("{{n}}", &json!({ "n": 3 }), None)
        .unwrap();
    assert_eq!(text, "3");
    assert_eq!(service.template_count(), 0);
}

#[test]
fn test_compile_and_run_with_name_caches() {
    let service = TemplateService::new();
    let text = service
        .compile_and_run("[{{v}}]", &json!({ "v": "a" }), Some("wrap"))
        .unwrap();

    assert_eq!(text, "[a]");
    assert!(service.contains_template("wrap"));
    assert_eq!(service.run("wrap", &json!({ "v": "b" })).unwrap(), "[b]");
}

#[test]
fn test_run_unknown_template() {
    let service = TemplateService::new();
    let error = service.run("nope", &json!({})).unwrap_err();

    assert!(matches!(&error, TemplateError::UnknownTemplate { name } if name == "nope"));
    assert_eq!(error.to_string(), "no template called 'nope' has been compiled");
}

#[test]
fn test_names_are_case_sensitive() {
    let service = TemplateService::new();
    service.compile_named("lower", "page").unwrap();

    assert!(service.run("Page", &json!({})).is_err());
    assert_eq!(service.run("page", &json!({})).unwrap(), "lower");
}

#[test]
fn test_removal_round_trip() {
    let service = TemplateService::new();
    service.compile_named("one", "t").unwrap();

    assert!(service.remove_compiled_template("t"));
    assert!(!service.contains_template("t"));
    assert!(matches!(
        service.run("t", &json!({})),
        Err(TemplateError::UnknownTemplate { .. })
    ));

    // Removing again is a no-op.
    assert!(!service.remove_compiled_template("t"));

    service.compile_named("two", "t").unwrap();
    assert_eq!(service.run("t", &json!({})).unwrap(), "two");
}

#[test]
fn test_removed_function_keeps_working() {
    let service = TemplateService::new();
    let render = service.compile_named("still {{x}}", "t").unwrap();
    service.remove_compiled_template("t");

    assert_eq!(render(&json!({ "x": "here" })).unwrap(), "still here");
}

// =============================================================================
// Serializable models
// =============================================================================

#[derive(Serialize)]
struct Order {
    id: u32,
    customer: Customer,
    lines: Vec<&'static str>,
}

#[derive(Serialize)]
struct Customer {
    name: String,
}

#[test]
fn test_serializable_models() {
    let service = TemplateService::new();
    let order = Order {
        id: 7,
        customer: Customer { name: "Ada".into() },
        lines: vec!["tea", "cake"],
    };

    let text = service
        .compile_and_run_with(
            "#{{id}} for {{customer.name}}: {{#each lines}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}",
            &order,
            Some("order"),
        )
        .unwrap();
    assert_eq!(text, "#7 for Ada: tea, cake");
    assert_eq!(service.run_with("order", &order).unwrap(), text);
}

#[test]
fn test_unserializable_model_is_a_model_error() {
    use std::collections::BTreeMap;

    let service = TemplateService::new();
    service.compile_named("x", "t").unwrap();

    // Non-string map keys cannot become JSON object keys.
    let mut model = BTreeMap::new();
    model.insert(vec![1u8], 1);
    assert!(matches!(
        service.run_with("t", &model),
        Err(TemplateError::Model(_))
    ));
}

// =============================================================================
// Syntax errors
// =============================================================================

#[test]
fn test_malformed_input_reports_every_error() {
    let service = TemplateService::new();
    let error = service.compile("{{}} fine {{a b}}").err().expect("syntax error");

    let TemplateError::Syntax(diagnostics) = &error else {
        panic!("expected a syntax error, got {error:?}");
    };
    assert_eq!(diagnostics.len(), 2);

    let message = error.to_string();
    let lines: Vec<&str> = message.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("1:1: "));
    assert!(lines[1].starts_with("1:11: "));
}

#[test]
fn test_failed_named_compile_caches_nothing() {
    let service = TemplateService::new();
    assert!(service.compile_named("{{#each}}", "bad").is_err());
    assert!(!service.contains_template("bad"));

    // The name stays free for a good template.
    service.compile_named("good", "bad").unwrap();
    assert_eq!(service.run("bad", &json!({})).unwrap(), "good");
}

#[test]
fn test_diagnostics_are_exposed() {
    let service = TemplateService::new();
    let error = service.compile("{{#if a}}open").err().expect("syntax error");
    let kinds: Vec<_> = error
        .diagnostics()
        .unwrap()
        .iter()
        .map(|diagnostic| diagnostic.kind)
        .collect();

    assert_eq!(kinds, [ParseErrorKind::UnclosedBlock]);
}

// =============================================================================
// Partials
// =============================================================================

#[test]
fn test_first_partial_registration_wins() {
    let service = TemplateService::new();
    service.register_partial("greet", "Hi {{name}}").unwrap();
    service.register_partial("greet", "Bye {{name}}").unwrap();

    assert_eq!(
        service.render_partial("greet", &json!({ "name": "Sam" })).unwrap(),
        "Hi Sam"
    );
    assert_eq!(service.partial_count(), 1);
}

#[test]
fn test_reregistration_does_not_parse_source() {
    let service = TemplateService::new();
    service.register_partial("p", "fine").unwrap();
    service.register_partial("p", "{{#broken").unwrap();

    assert_eq!(service.render_partial("p", &json!({})).unwrap(), "fine");
}

#[test]
fn test_function_partials() {
    let service = TemplateService::new();
    service.register_partial_fn(
        "shout",
        partial_fn(|context| Ok(context.metadata().display(context.value()).to_uppercase())),
    );
    // First-wins applies to functions too.
    service.register_partial("shout", "quiet").unwrap();

    let text = service
        .compile_and_run("{{> shout name}}!", &json!({ "name": "hey" }), None)
        .unwrap();
    assert_eq!(text, "HEY!");
}

#[test]
fn test_run_unknown_partial() {
    let service = TemplateService::new();
    let error = service.render_partial("missing", &json!({})).unwrap_err();

    assert!(matches!(&error, TemplateError::UnknownPartial { name } if name == "missing"));
    assert_eq!(
        error.to_string(),
        "no partial template called 'missing' has been registered"
    );
}

#[test]
fn test_failed_partial_registration_leaves_no_entry() {
    let service = TemplateService::new();
    assert!(service.register_partial("p", "{{/if}}").is_err());
    assert!(!service.contains_partial("p"));
}

#[test]
fn test_compile_partial_does_not_register() {
    let service = TemplateService::new();
    let render = service.compile_partial("<{{this}}>", "loose").unwrap();
    assert!(!service.contains_partial("loose"));

    let model = json!("x");
    let context = service.root_context(&model);
    assert_eq!(render(&context).unwrap(), "<x>");
}

#[test]
fn test_nested_partials() {
    let service = TemplateService::new();
    service.register_partial("row", "<tr>{{> cell}}</tr>").unwrap();
    service.register_partial("cell", "<td>{{this}}</td>").unwrap();

    let text = service
        .compile_and_run(
            "{{#each rows}}{{> row}}{{/each}}",
            &json!({ "rows": [1, 2] }),
            Some("table"),
        )
        .unwrap();
    assert_eq!(text, "<tr><td>1</td></tr><tr><td>2</td></tr>");
}

#[test]
fn test_missing_nested_partial_fails_the_render() {
    let service = TemplateService::new();
    service.compile_named("a {{> ghost}} b", "page").unwrap();

    assert!(matches!(
        service.run("page", &json!({})),
        Err(TemplateError::UnknownPartial { name }) if name == "ghost"
    ));
}

#[test]
fn test_recursive_partial_is_bounded() {
    let service = TemplateService::builder().max_partial_depth(10).build();
    service.register_partial("forever", "{{> forever}}").unwrap();

    let error = service.render_partial("forever", &json!({})).unwrap_err();
    assert!(matches!(
        error,
        TemplateError::PartialDepthExceeded { ref name, limit: 10 } if name == "forever"
    ));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_escape_html_can_be_disabled() {
    let model = json!({ "html": "<i>x</i>" });

    let escaping = TemplateService::new();
    assert_eq!(
        escaping.compile_and_run("{{html}}", &model, None).unwrap(),
        "&lt;i&gt;x&lt;/i&gt;"
    );

    let raw = ServiceBuilder::new().escape_html(false).build();
    assert_eq!(raw.compile_and_run("{{html}}", &model, None).unwrap(), "<i>x</i>");
}

/// Upper-cases every text node.
struct Shout;

impl DocumentTransform for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn transform(&self, mut document: Document) -> Document {
        for node in &mut document.nodes {
            if let Node::Text(text) = node {
                text.content = text.content.to_uppercase();
            }
        }
        document
    }
}

#[test]
fn test_extra_transform_runs_after_whitespace_collapse() {
    let service = ServiceBuilder::new().transform(Shout).build();
    let text = service
        .compile_and_run("hello  {{~name}} there", &json!({ "name": "ada" }), None)
        .unwrap();

    assert_eq!(text, "HELLOada THERE");
}

#[test]
fn test_custom_metadata_provider() {
    use std::borrow::Cow;
    use whisker::{DefaultMetadataProvider, MetadataProvider};
    use serde_json::Value;

    /// JSON semantics plus an `upper` member on strings.
    struct Computed;

    impl MetadataProvider for Computed {
        fn member<'v>(&self, value: &'v Value, name: &str) -> Option<Cow<'v, Value>> {
            match (value, name) {
                (Value::String(text), "upper") => Some(Cow::Owned(Value::String(text.to_uppercase()))),
                _ => DefaultMetadataProvider.member(value, name),
            }
        }

        fn is_truthy(&self, value: &Value) -> bool {
            DefaultMetadataProvider.is_truthy(value)
        }

        fn write_display(&self, value: &Value, out: &mut String) {
            DefaultMetadataProvider.write_display(value, out);
        }
    }

    let service = ServiceBuilder::new().metadata_provider(Computed).build();
    let text = service
        .compile_and_run("{{name.upper}}", &json!({ "name": "ada" }), None)
        .unwrap();
    assert_eq!(text, "ADA");
}

// =============================================================================
// Nesting limit
// =============================================================================

fn nested_ifs(depth: usize) -> String {
    format!("{}x{}", "{{#if a}}".repeat(depth), "{{/if}}".repeat(depth))
}

#[test]
fn test_deeply_nested_blocks_are_a_syntax_error() {
    let service = TemplateService::new();

    let error = service.compile(&nested_ifs(10_000)).err().expect("syntax error");
    let kinds: Vec<_> = error
        .diagnostics()
        .expect("syntax error")
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds, [ParseErrorKind::NestingTooDeep]);
}

#[test]
fn test_nesting_at_the_limit_compiles_and_renders() {
    let service = TemplateService::new();
    let source = nested_ifs(whisker::whisker_parser::MAX_BLOCK_DEPTH);

    let text = service.compile_and_run(&source, &json!({ "a": true }), None).unwrap();
    assert_eq!(text, "x");
}

// =============================================================================
// Block helpers
// =============================================================================

/// `{{#repeat n}}` renders its body `n` times, with `@index` set.
struct Repeat;

impl BlockHelper for Repeat {
    fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
        let times = block.argument().and_then(serde_json::Value::as_u64).unwrap_or(0);
        if times == 0 {
            return block.render_inverse(block.context(), out);
        }
        for index in 0..times as usize {
            let row = block
                .context()
                .child(std::borrow::Cow::Borrowed(block.context().value()))
                .with_data(whisker::whisker_render::IterationData::new(index, times as usize, None));
            block.render_body(&row, out)?;
        }
        Ok(())
    }
}

/// `{{#upper}}` upper-cases its rendered body; no argument needed.
struct Upper;

impl BlockHelper for Upper {
    fn argument(&self) -> BlockArgument {
        BlockArgument::Optional
    }

    fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
        let mut body = String::new();
        block.render_body(block.context(), &mut body)?;
        out.push_str(&body.to_uppercase());
        Ok(())
    }
}

#[test]
fn test_registered_block_helpers_compile_and_render() {
    let service = ServiceBuilder::new()
        .block_helper("repeat", Repeat)
        .block_helper("upper", Upper)
        .build();
    service.register_partial("tag", "<{{name}}>").unwrap();

    let text = service
        .compile_and_run(
            "{{#repeat n}}{{@index}}{{> tag}}{{/repeat}}|{{#upper}}{{name}}{{/upper}}|{{#repeat zero}}x{{else}}none{{/repeat}}",
            &json!({ "n": 2, "zero": 0, "name": "ada" }),
            Some("custom"),
        )
        .unwrap();
    assert_eq!(text, "0<ada>1<ada>|ADA|none");
}

#[test]
fn test_unregistered_block_helper_is_rejected() {
    let service = TemplateService::new();
    let error = service.compile("{{#repeat n}}x{{/repeat}}").err().expect("syntax error");

    let kinds: Vec<_> = error.diagnostics().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [ParseErrorKind::UnknownBlock]);
}

#[test]
fn test_block_helper_requires_argument_unless_optional() {
    let service = ServiceBuilder::new()
        .block_helper("repeat", Repeat)
        .block_helper("upper", Upper)
        .build();

    assert!(service.compile("{{#upper}}ok{{/upper}}").is_ok());
    let error = service.compile("{{#repeat}}x{{/repeat}}").err().expect("syntax error");
    let kinds: Vec<_> = error.diagnostics().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [ParseErrorKind::MissingArgument]);
}
