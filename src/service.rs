//! The template compilation service.
//!
//! A [`TemplateService`] turns template source into render functions and
//! keeps two caches: named templates and partials. Compilation (parse, then
//! the transform pipeline) happens once per name; afterwards the cached
//! function renders any number of models, from any number of threads.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use whisker::TemplateService;
//!
//! let service = TemplateService::new();
//! service.register_partial("user", "<b>{{name}}</b>")?;
//! service.compile_named("Hello {{> user}}!", "greeting")?;
//!
//! let text = service.run("greeting", &json!({ "name": "Ada" }))?;
//! assert_eq!(text, "Hello <b>Ada</b>!");
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use whisker_compiler::DocumentCompiler;
use whisker_core::{Document, TemplateError, TemplateResult};
use whisker_render::{
    DefaultMetadataProvider, MetadataProvider, PartialResolver, RenderContext, Renderer,
};

use crate::builder::ServiceBuilder;
use crate::registry::{
    Insertion, PartialRegistry, PartialRenderFn, RenderFn, TemplateRegistry, partial_fn, render_fn,
};

static DEFAULT_METADATA: DefaultMetadataProvider = DefaultMetadataProvider;

/// The model used when a caller passes none.
static NULL_MODEL: Value = Value::Null;

/// The configured provider, or JSON semantics when none was given.
fn metadata_or_default(metadata: &Option<Arc<dyn MetadataProvider>>) -> &dyn MetadataProvider {
    match metadata {
        Some(provider) => provider.as_ref(),
        None => &DEFAULT_METADATA,
    }
}

/// Compiles templates and caches them by name.
///
/// Named templates and partials are both first-wins: once a name holds a
/// function, compiling or registering under that name again returns or keeps
/// the existing one. Only [`remove_compiled_template`] frees a template name.
///
/// [`remove_compiled_template`]: TemplateService::remove_compiled_template
pub struct TemplateService {
    compiler: DocumentCompiler,
    renderer: Arc<dyn Renderer>,
    metadata: Option<Arc<dyn MetadataProvider>>,
    templates: TemplateRegistry,
    partials: Arc<PartialRegistry>,
}

impl TemplateService {
    /// A service with the default configuration.
    pub fn new() -> Self {
        ServiceBuilder::new().build()
    }

    /// Start configuring a service.
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    pub(crate) fn from_parts(
        compiler: DocumentCompiler,
        renderer: Arc<dyn Renderer>,
        metadata: Option<Arc<dyn MetadataProvider>>,
    ) -> Self {
        Self {
            compiler,
            renderer,
            metadata,
            templates: TemplateRegistry::new(),
            partials: Arc::new(PartialRegistry::new()),
        }
    }

    /// Parse and transform `source` into a shareable document.
    fn compile_document(&self, source: &str) -> TemplateResult<Arc<Document>> {
        let document = self.compiler.compile(source)?;
        Ok(Arc::new(document))
    }

    /// Compile `source` into a render function without caching it.
    ///
    /// The function renders against this service's partials, so partials
    /// registered later are visible to it.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] with every diagnostic if `source`
    /// does not parse.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, source: &str) -> TemplateResult<RenderFn> {
        let document = self.compile_document(source)?;
        let renderer = Arc::clone(&self.renderer);
        let partials = Arc::clone(&self.partials);
        let metadata = self.metadata.clone();

        Ok(render_fn(move |model| {
            let context = RenderContext::new(
                model,
                partials.as_ref(),
                metadata_or_default(&metadata),
            );
            renderer.render(&document, &context)
        }))
    }

    /// Compile `source` and cache it as `name`, or return the cached function.
    ///
    /// On a cache hit `source` is not parsed at all. On a miss the template is
    /// compiled without holding any lock and then inserted if the name is
    /// still free; when another thread got there first, its function is
    /// returned instead, so every caller sees the same function for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] if `source` has to be compiled and
    /// does not parse. Nothing is cached in that case.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_named(&self, source: &str, name: &str) -> TemplateResult<RenderFn> {
        if let Some(render) = self.templates.get(name) {
            tracing::trace!(name, "template cache hit");
            return Ok(render);
        }

        tracing::debug!(name, "template cache miss, compiling");
        let compiled = self.compile(source)?;
        let (render, insertion) = self.templates.get_or_insert(name, compiled);
        match insertion {
            Insertion::Inserted => tracing::debug!(name, "template cached"),
            Insertion::Existing => {
                tracing::debug!(name, "template compiled concurrently, keeping cached entry")
            }
        }
        Ok(render)
    }

    /// Compile then render in one call.
    ///
    /// A non-empty `name` goes through [`compile_named`](Self::compile_named)
    /// and caches; `None` or `""` compiles anonymously. `model` is either a
    /// `&Value` or `None`, which renders against `null`.
    pub fn compile_and_run<'m>(
        &self,
        source: &str,
        model: impl Into<Option<&'m Value>>,
        name: Option<&str>,
    ) -> TemplateResult<String> {
        let render = match name.filter(|name| !name.is_empty()) {
            Some(name) => self.compile_named(source, name)?,
            None => self.compile(source)?,
        };
        render(model.into().unwrap_or(&NULL_MODEL))
    }

    /// [`compile_and_run`](Self::compile_and_run) for any serializable model.
    ///
    /// # Errors
    ///
    /// Also returns [`TemplateError::Model`] if `model` cannot be converted
    /// to a JSON value.
    pub fn compile_and_run_with<T>(
        &self,
        source: &str,
        model: &T,
        name: Option<&str>,
    ) -> TemplateResult<String>
    where
        T: Serialize + ?Sized,
    {
        let model = serde_json::to_value(model)?;
        self.compile_and_run(source, &model, name)
    }

    /// Render the template cached as `name`. `model` is either a `&Value` or
    /// `None`, which renders against `null`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownTemplate`] if nothing is cached under
    /// `name`, otherwise whatever rendering returns.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run<'m>(&self, name: &str, model: impl Into<Option<&'m Value>>) -> TemplateResult<String> {
        let render = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::unknown_template(name))?;
        render(model.into().unwrap_or(&NULL_MODEL))
    }

    /// [`run`](Self::run) for any serializable model.
    pub fn run_with<T>(&self, name: &str, model: &T) -> TemplateResult<String>
    where
        T: Serialize + ?Sized,
    {
        let model = serde_json::to_value(model)?;
        self.run(name, &model)
    }

    /// Drop the template cached as `name`. Returns whether one was cached.
    ///
    /// Functions already handed out keep working; the name is simply free
    /// for the next [`compile_named`](Self::compile_named).
    pub fn remove_compiled_template(&self, name: &str) -> bool {
        let removed = self.templates.remove(name);
        if removed {
            tracing::debug!(name, "template removed");
        }
        removed
    }

    /// Compile `source` into a partial render function without registering
    /// it. `name` only labels trace output.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] if `source` does not parse.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_partial(&self, source: &str, name: &str) -> TemplateResult<PartialRenderFn> {
        tracing::trace!(name, "compiling partial");
        let document = self.compile_document(source)?;
        let renderer = Arc::clone(&self.renderer);

        Ok(partial_fn(move |context| renderer.render(&document, context)))
    }

    /// Register `source` as the partial `name`.
    ///
    /// First registration wins: if `name` is taken this does nothing, and
    /// `source` is not parsed.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] if `source` has to be compiled and
    /// does not parse. Nothing is registered in that case.
    pub fn register_partial(&self, name: &str, source: &str) -> TemplateResult<()> {
        if self.partials.contains(name) {
            tracing::trace!(name, "partial already registered");
            return Ok(());
        }

        let render = self.compile_partial(source, name)?;
        self.insert_partial(name, render);
        Ok(())
    }

    /// Register a host-built function as the partial `name`.
    ///
    /// First registration wins, as with [`register_partial`](Self::register_partial).
    pub fn register_partial_fn(&self, name: &str, render: PartialRenderFn) {
        self.insert_partial(name, render);
    }

    fn insert_partial(&self, name: &str, render: PartialRenderFn) {
        match self.partials.insert_if_absent(name, render) {
            Insertion::Inserted => tracing::debug!(name, "partial registered"),
            Insertion::Existing => tracing::debug!(name, "partial already registered, keeping it"),
        }
    }

    /// Render the partial `name` in `context`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownPartial`] if nothing is registered
    /// under `name`.
    pub fn run_partial(&self, name: &str, context: &RenderContext<'_>) -> TemplateResult<String> {
        self.partials.resolve_partial(name, context)
    }

    /// Render the partial `name` with `model` as its whole context.
    pub fn render_partial(&self, name: &str, model: &Value) -> TemplateResult<String> {
        let context = self.root_context(model);
        self.run_partial(name, &context)
    }

    /// A root render context for `model` backed by this service's partials
    /// and metadata provider.
    pub fn root_context<'a>(&'a self, model: &'a Value) -> RenderContext<'a> {
        RenderContext::new(model, self.partials.as_ref(), self.metadata())
    }

    /// The metadata provider renders use.
    pub fn metadata(&self) -> &dyn MetadataProvider {
        metadata_or_default(&self.metadata)
    }

    pub fn contains_template(&self, name: &str) -> bool {
        self.templates.contains(name)
    }

    pub fn contains_partial(&self, name: &str) -> bool {
        self.partials.contains(name)
    }

    /// Number of cached named templates.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of registered partials.
    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }
}

impl Default for TemplateService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateService")
            .field("compiler", &self.compiler)
            .field("templates", &self.templates)
            .field("partials", &self.partials)
            .finish_non_exhaustive()
    }
}
