//! Render contexts.
//!
//! A [`RenderContext`] is what a render pass sees at any point: the current
//! value, the chain of enclosing contexts (for `../`), the root model (for
//! `@root`), iteration data (for `@index` and friends), and the two
//! capabilities a render needs from its host: partial resolution and model
//! metadata. Contexts borrow from their parents, so nested renders allocate
//! nothing beyond the values they compute.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;
use whisker_core::{Path, PathRoot, TemplateError};

use crate::metadata::MetadataProvider;

/// Resolves `{{> name}}` during a render.
///
/// The compilation service implements this over its partial registry and
/// hands it to every render through the root context.
pub trait PartialResolver: Send + Sync {
    /// Render the partial `name` in `context`.
    fn resolve_partial(&self, name: &str, context: &RenderContext<'_>) -> Result<String, TemplateError>;
}

/// A resolver with no partials; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPartials;

impl PartialResolver for NoPartials {
    fn resolve_partial(&self, name: &str, _context: &RenderContext<'_>) -> Result<String, TemplateError> {
        Err(TemplateError::unknown_partial(name))
    }
}

/// Per-item data set by `{{#each}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IterationData {
    pub index: usize,
    /// Object key when iterating an object.
    pub key: Option<String>,
    pub first: bool,
    pub last: bool,
}

impl IterationData {
    /// Data for item `index` of `len`.
    pub fn new(index: usize, len: usize, key: Option<String>) -> Self {
        Self {
            index,
            key,
            first: index == 0,
            last: index + 1 == len,
        }
    }
}

/// The state a render pass resolves paths against.
#[derive(Clone)]
pub struct RenderContext<'a> {
    value: Cow<'a, Value>,
    parent: Option<&'a RenderContext<'a>>,
    root: &'a Value,
    data: Option<IterationData>,
    partials: &'a dyn PartialResolver,
    metadata: &'a dyn MetadataProvider,
    depth: usize,
}

impl<'a> RenderContext<'a> {
    /// A root context for rendering `model`.
    pub fn new(
        model: &'a Value,
        partials: &'a dyn PartialResolver,
        metadata: &'a dyn MetadataProvider,
    ) -> Self {
        Self {
            value: Cow::Borrowed(model),
            parent: None,
            root: model,
            data: None,
            partials,
            metadata,
            depth: 0,
        }
    }

    /// A context for `value` nested inside this one.
    pub fn child<'b>(&'b self, value: Cow<'b, Value>) -> RenderContext<'b> {
        RenderContext {
            value,
            parent: Some(self),
            root: self.root,
            data: None,
            partials: self.partials,
            metadata: self.metadata,
            depth: self.depth,
        }
    }

    /// The context a partial renders in: `value` if given, otherwise the
    /// current value, one partial level deeper.
    pub fn for_partial<'b>(&'b self, value: Option<Cow<'b, Value>>) -> RenderContext<'b> {
        let mut context = match value {
            Some(value) => self.child(value),
            None => RenderContext {
                value: Cow::Borrowed(self.value()),
                parent: self.parent,
                root: self.root,
                data: self.data.clone(),
                partials: self.partials,
                metadata: self.metadata,
                depth: self.depth,
            },
        };
        context.depth += 1;
        context
    }

    /// Attach iteration data.
    pub fn with_data(mut self, data: IterationData) -> Self {
        self.data = Some(data);
        self
    }

    /// The current value (`this`).
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The top-level model.
    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// The enclosing context, if any.
    pub fn parent(&self) -> Option<&'a RenderContext<'a>> {
        self.parent
    }

    /// Iteration data of the nearest enclosing `{{#each}}`.
    pub fn data(&self) -> Option<&IterationData> {
        let mut context = self;
        loop {
            if let Some(data) = &context.data {
                return Some(data);
            }
            context = context.parent?;
        }
    }

    /// Partial nesting depth; zero for a template's own body.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The partial resolution capability.
    pub fn partials(&self) -> &'a dyn PartialResolver {
        self.partials
    }

    /// The model metadata capability.
    pub fn metadata(&self) -> &'a dyn MetadataProvider {
        self.metadata
    }

    /// Resolve `path` against this context. `None` if any step is missing.
    pub fn lookup(&self, path: &Path) -> Option<Cow<'_, Value>> {
        let mut context = self;
        for _ in 0..path.parents {
            context = context.parent?;
        }

        let start = match &path.root {
            PathRoot::Context => Cow::Borrowed(context.value()),
            PathRoot::Data(name) => context.lookup_data(name)?,
        };

        let mut current = start;
        for segment in &path.segments {
            current = match current {
                Cow::Borrowed(value) => self.metadata.member(value, segment)?,
                Cow::Owned(value) => Cow::Owned(self.metadata.member(&value, segment)?.into_owned()),
            };
        }
        Some(current)
    }

    fn lookup_data(&self, name: &str) -> Option<Cow<'_, Value>> {
        if name == "root" {
            return Some(Cow::Borrowed(self.root));
        }

        let data = self.data()?;
        let value = match name {
            "index" => Value::from(data.index),
            "first" => Value::Bool(data.first),
            "last" => Value::Bool(data.last),
            "key" => Value::String(data.key.clone()?),
            _ => return None,
        };
        Some(Cow::Owned(value))
    }
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("value", &self.value)
            .field("data", &self.data)
            .field("depth", &self.depth)
            .field("has_parent", &self.parent.is_some())
            .finish_non_exhaustive()
    }
}
