//! Service configuration.

use std::fmt;
use std::sync::Arc;

use whisker_compiler::{DocumentCompiler, DocumentTransform, TransformPipeline};
use whisker_parser::{HandlebarsParser, TemplateParser};
use whisker_render::{BlockHelper, BlockHelpers, DocumentRenderer, MetadataProvider, RenderOptions, Renderer};

use crate::service::TemplateService;

/// Configures a [`TemplateService`].
///
/// Every setting has a default, so `ServiceBuilder::new().build()` gives the
/// same service as [`TemplateService::new`]: the Handlebars parser, the
/// whitespace-collapsing pipeline, the built-in renderer with HTML escaping
/// and the `if`/`unless`/`each`/`with` helpers, and JSON metadata.
///
/// # Example
///
/// ```ignore
/// let service = ServiceBuilder::new()
///     .escape_html(false)
///     .max_partial_depth(16)
///     .block_helper("repeat", Repeat)
///     .build();
/// ```
pub struct ServiceBuilder {
    parser: Option<Arc<dyn TemplateParser>>,
    helpers: BlockHelpers,
    pipeline: TransformPipeline,
    renderer: Option<Arc<dyn Renderer>>,
    metadata: Option<Arc<dyn MetadataProvider>>,
    options: RenderOptions,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            parser: None,
            helpers: BlockHelpers::builtin(),
            pipeline: TransformPipeline::default(),
            renderer: None,
            metadata: None,
            options: RenderOptions::default(),
        }
    }

    /// Replace the template parser.
    ///
    /// The built-in parser accepts exactly the registered block helpers; a
    /// replacement decides for itself which blocks it accepts.
    pub fn parser(mut self, parser: impl TemplateParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Register a block helper for `{{#name}}`, replacing any helper of the
    /// same name, built-ins included.
    ///
    /// Both the built-in parser and the built-in renderer pick it up.
    pub fn block_helper(mut self, name: impl Into<String>, helper: impl BlockHelper + 'static) -> Self {
        self.helpers.register(name, helper);
        self
    }

    /// Append a transform stage after whitespace collapsing.
    pub fn transform(mut self, stage: impl DocumentTransform + 'static) -> Self {
        self.pipeline.push(stage);
        self
    }

    /// Replace the transform pipeline, including the default stage.
    pub fn pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Render through `renderer` instead of the built-in one.
    ///
    /// [`escape_html`](Self::escape_html) and
    /// [`max_partial_depth`](Self::max_partial_depth) only configure the
    /// built-in renderer and are ignored once this is set.
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Look into models through `provider` instead of plain JSON semantics.
    pub fn metadata_provider(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.metadata = Some(Arc::new(provider));
        self
    }

    /// Whether `{{path}}` output is HTML-escaped. Defaults to `true`.
    pub fn escape_html(mut self, escape: bool) -> Self {
        self.options.escape_html = escape;
        self
    }

    /// Deepest allowed partial nesting. Defaults to 64.
    pub fn max_partial_depth(mut self, depth: usize) -> Self {
        self.options.max_partial_depth = depth;
        self
    }

    /// Build the service. Configuration is fixed from here on.
    pub fn build(self) -> TemplateService {
        let parser: Arc<dyn TemplateParser> = match self.parser {
            Some(parser) => parser,
            None => Arc::new(HandlebarsParser::with_blocks(self.helpers.table())),
        };
        let compiler = DocumentCompiler::new(parser, self.pipeline);
        let renderer: Arc<dyn Renderer> = match self.renderer {
            Some(renderer) => renderer,
            None => Arc::new(DocumentRenderer::with_helpers(self.options, self.helpers)),
        };
        TemplateService::from_parts(compiler, renderer, self.metadata)
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("custom_parser", &self.parser.is_some())
            .field("helpers", &self.helpers)
            .field("pipeline", &self.pipeline)
            .field("custom_renderer", &self.renderer.is_some())
            .field("custom_metadata", &self.metadata.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
