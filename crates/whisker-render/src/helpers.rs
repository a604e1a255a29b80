//! Block helpers.
//!
//! A `{{#name arg}}…{{else}}…{{/name}}` block is rendered by the
//! [`BlockHelper`] registered as `name`. The helper receives a [`HelperBlock`]
//! holding the resolved argument and decides which section to render, how
//! often, and in which context. `if`, `unless`, `each` and `with` are
//! helpers like any other and can be replaced.
//!
//! ## Usage
//!
//! ```ignore
//! use whisker_render::{BlockHelper, HelperBlock};
//!
//! /// `{{#repeat n}}` renders its body `n` times.
//! struct Repeat;
//!
//! impl BlockHelper for Repeat {
//!     fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
//!         let times = block.argument().and_then(Value::as_u64).unwrap_or(0);
//!         for _ in 0..times {
//!             block.render_body(block.context(), out)?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;
use whisker_core::{BlockArgument, BlockNode, BlockTable, TemplateError};

use crate::context::{IterationData, RenderContext};
use crate::renderer::DocumentRenderer;

/// Renders one kind of block.
pub trait BlockHelper: Send + Sync {
    /// Whether `{{#name}}` must be given an argument.
    fn argument(&self) -> BlockArgument {
        BlockArgument::Required
    }

    /// Write the block's output to `out`.
    fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError>;
}

/// A block being rendered, as seen by its helper.
pub struct HelperBlock<'r, 'c> {
    renderer: &'r DocumentRenderer,
    node: &'r BlockNode,
    context: &'r RenderContext<'c>,
    argument: Option<Cow<'r, Value>>,
}

impl<'r, 'c> HelperBlock<'r, 'c> {
    pub(crate) fn new(
        renderer: &'r DocumentRenderer,
        node: &'r BlockNode,
        context: &'r RenderContext<'c>,
    ) -> Self {
        Self {
            renderer,
            node,
            context,
            argument: context.lookup(&node.argument),
        }
    }

    /// The helper name the block was opened with.
    pub fn name(&self) -> &str {
        &self.node.helper
    }

    /// The argument's value; `None` when its path resolves to nothing.
    /// A block written without an argument gets the current value.
    pub fn argument(&self) -> Option<&Value> {
        self.argument.as_deref()
    }

    /// Whether the argument is truthy under the context's metadata.
    pub fn is_truthy(&self) -> bool {
        self.argument()
            .is_some_and(|value| self.context.metadata().is_truthy(value))
    }

    /// The context the block appears in.
    pub fn context(&self) -> &'r RenderContext<'c> {
        self.context
    }

    pub fn has_inverse(&self) -> bool {
        self.node.inverse.is_some()
    }

    /// Render the main section in `context`.
    pub fn render_body(&self, context: &RenderContext<'_>, out: &mut String) -> Result<(), TemplateError> {
        self.renderer.render_nodes(&self.node.body, context, out)
    }

    /// Render the `{{else}}` section in `context`; nothing if there is none.
    pub fn render_inverse(&self, context: &RenderContext<'_>, out: &mut String) -> Result<(), TemplateError> {
        match &self.node.inverse {
            Some(inverse) => self.renderer.render_nodes(inverse, context, out),
            None => Ok(()),
        }
    }

    /// The body when `main` holds, otherwise the inverse, both in the
    /// block's own context.
    pub fn render_section(&self, main: bool, out: &mut String) -> Result<(), TemplateError> {
        if main {
            self.render_body(self.context, out)
        } else {
            self.render_inverse(self.context, out)
        }
    }
}

// ============================================================================
// Built-in helpers
// ============================================================================

/// `{{#if x}}`: body when `x` is truthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfHelper;

impl BlockHelper for IfHelper {
    fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
        block.render_section(block.is_truthy(), out)
    }
}

/// `{{#unless x}}`: body when `x` is falsy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlessHelper;

impl BlockHelper for UnlessHelper {
    fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
        block.render_section(!block.is_truthy(), out)
    }
}

/// `{{#with x}}`: body with `x` as the current value, when truthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithHelper;

impl BlockHelper for WithHelper {
    fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
        match block.argument() {
            Some(value) if block.is_truthy() => {
                let scope = block.context().child(Cow::Borrowed(value));
                block.render_body(&scope, out)
            }
            _ => block.render_inverse(block.context(), out),
        }
    }
}

/// `{{#each xs}}`: body once per array item or object member, with
/// `@index`, `@key`, `@first` and `@last` set.
#[derive(Debug, Clone, Copy, Default)]
pub struct EachHelper;

impl BlockHelper for EachHelper {
    fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
        let context = block.context();
        match block.argument() {
            Some(Value::Array(items)) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    let row = context
                        .child(Cow::Borrowed(item))
                        .with_data(IterationData::new(index, items.len(), None));
                    block.render_body(&row, out)?;
                }
                Ok(())
            }
            Some(Value::Object(map)) if !map.is_empty() => {
                for (index, (key, item)) in map.iter().enumerate() {
                    let row = context
                        .child(Cow::Borrowed(item))
                        .with_data(IterationData::new(index, map.len(), Some(key.clone())));
                    block.render_body(&row, out)?;
                }
                Ok(())
            }
            _ => block.render_inverse(context, out),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Block helpers by name.
///
/// Fixed once handed to a renderer; configure it before building.
#[derive(Clone)]
pub struct BlockHelpers {
    helpers: FxHashMap<String, Arc<dyn BlockHelper>>,
}

impl BlockHelpers {
    /// No helpers at all.
    pub fn empty() -> Self {
        Self {
            helpers: FxHashMap::default(),
        }
    }

    /// `if`, `unless`, `each` and `with`.
    pub fn builtin() -> Self {
        let mut helpers = Self::empty();
        helpers.register("if", IfHelper);
        helpers.register("unless", UnlessHelper);
        helpers.register("each", EachHelper);
        helpers.register("with", WithHelper);
        helpers
    }

    /// Register `helper` as `name`, replacing any helper already there.
    pub fn register(&mut self, name: impl Into<String>, helper: impl BlockHelper + 'static) {
        self.register_arc(name, Arc::new(helper));
    }

    /// Register a shared helper as `name`, replacing any helper already there.
    pub fn register_arc(&mut self, name: impl Into<String>, helper: Arc<dyn BlockHelper>) {
        self.helpers.insert(name.into(), helper);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn BlockHelper>> {
        self.helpers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// The names and argument rules a parser needs to accept these helpers.
    pub fn table(&self) -> BlockTable {
        let mut table = BlockTable::empty();
        for (name, helper) in &self.helpers {
            table.insert(name.clone(), helper.argument());
        }
        table
    }
}

impl Default for BlockHelpers {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for BlockHelpers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("BlockHelpers").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoPartials;
    use crate::metadata::DefaultMetadataProvider;
    use crate::renderer::{RenderOptions, Renderer};
    use serde_json::json;
    use whisker_parser::HandlebarsParser;

    /// `{{#repeat n}}` renders its body `n` times; `{{else}}` when `n` is 0.
    struct Repeat;

    impl BlockHelper for Repeat {
        fn render(&self, block: &HelperBlock<'_, '_>, out: &mut String) -> Result<(), TemplateError> {
            let times = block.argument().and_then(Value::as_u64).unwrap_or(0);
            if times == 0 {
                return block.render_inverse(block.context(), out);
            }
            for _ in 0..times {
                block.render_body(block.context(), out)?;
            }
            Ok(())
        }
    }

    /// `{{#shout}}` upper-cases whatever its body renders.
    struct Shout;

    impl BlockHelper for Shout {
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

    fn render_with(helpers: BlockHelpers, source: &str, model: &Value) -> Result<String, TemplateError> {
        let document = HandlebarsParser::with_blocks(helpers.table())
            .parse_template(source)
            .unwrap();
        let renderer = DocumentRenderer::with_helpers(RenderOptions::default(), helpers);
        let context = RenderContext::new(model, &NoPartials, &DefaultMetadataProvider);
        renderer.render(&document, &context)
    }

    #[test]
    fn builtin_table_matches_parser_default() {
        assert_eq!(BlockHelpers::builtin().table(), BlockTable::builtin());
    }

    #[test]
    fn custom_helpers_render() {
        let mut helpers = BlockHelpers::builtin();
        helpers.register("repeat", Repeat);
        helpers.register("shout", Shout);

        let model = json!({ "n": 3, "zero": 0, "name": "ada" });
        assert_eq!(
            render_with(helpers.clone(), "{{#repeat n}}{{name}};{{/repeat}}", &model).unwrap(),
            "ada;ada;ada;"
        );
        assert_eq!(
            render_with(helpers.clone(), "{{#repeat zero}}x{{else}}none{{/repeat}}", &model).unwrap(),
            "none"
        );
        assert_eq!(
            render_with(helpers, "{{#shout}}hi {{#if name}}{{name}}{{/if}}{{/shout}}!", &model).unwrap(),
            "HI ADA!"
        );
    }

    #[test]
    fn helpers_can_replace_builtins() {
        let mut helpers = BlockHelpers::builtin();
        helpers.register("if", UnlessHelper);

        let text = render_with(helpers, "{{#if on}}yes{{else}}no{{/if}}", &json!({ "on": true })).unwrap();
        assert_eq!(text, "no");
    }

    #[test]
    fn block_without_a_renderer_helper_fails() {
        let mut table = BlockTable::builtin();
        table.insert("repeat", BlockArgument::Required);
        let document = HandlebarsParser::with_blocks(table)
            .parse_template("{{#repeat n}}x{{/repeat}}")
            .unwrap();

        let model = json!({ "n": 1 });
        let context = RenderContext::new(&model, &NoPartials, &DefaultMetadataProvider);
        let error = DocumentRenderer::default().render(&document, &context).unwrap_err();
        assert!(matches!(error, TemplateError::UnknownHelper { name } if name == "repeat"));
    }
}
