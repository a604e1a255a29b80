//! Name-indexed caches of compiled templates and partials.
//!
//! Both registries are get-or-add: the first function stored under a name
//! stays until it is explicitly removed, and later inserts hand back the
//! stored function instead of replacing it. Lookups clone the `Arc` out of
//! the map, so no shard lock is held while a template renders.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use whisker_core::TemplateError;
use whisker_render::{PartialResolver, RenderContext};

/// A compiled template: renders a model to text.
pub type RenderFn = Arc<dyn Fn(&Value) -> Result<String, TemplateError> + Send + Sync>;

/// A compiled partial: renders within the context of the invoking template.
pub type PartialRenderFn =
    Arc<dyn Fn(&RenderContext<'_>) -> Result<String, TemplateError> + Send + Sync>;

/// Wrap a closure as a [`RenderFn`].
pub fn render_fn<F>(render: F) -> RenderFn
where
    F: Fn(&Value) -> Result<String, TemplateError> + Send + Sync + 'static,
{
    Arc::new(render)
}

/// Wrap a closure as a [`PartialRenderFn`].
///
/// ```ignore
/// service.register_partial_fn("year", partial_fn(|_context| Ok("2024".into())));
/// ```
pub fn partial_fn<F>(render: F) -> PartialRenderFn
where
    F: Fn(&RenderContext<'_>) -> Result<String, TemplateError> + Send + Sync + 'static,
{
    Arc::new(render)
}

/// Outcome of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The name was free; the new function is now stored.
    Inserted,
    /// Another function already held the name and was kept.
    Existing,
}

/// Concurrent name → function map shared by both registries.
struct NamedFns<F> {
    entries: DashMap<String, F>,
}

impl<F: Clone> NamedFns<F> {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    fn get(&self, name: &str) -> Option<F> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    fn get_or_insert(&self, name: &str, value: F) -> (F, Insertion) {
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), Insertion::Existing),
            Entry::Vacant(entry) => {
                entry.insert(value.clone());
                (value, Insertion::Inserted)
            }
        }
    }

    fn remove(&self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

/// Compiled templates by name.
pub struct TemplateRegistry {
    templates: NamedFns<RenderFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            templates: NamedFns::new(),
        }
    }

    /// The template stored under `name`.
    pub fn get(&self, name: &str) -> Option<RenderFn> {
        self.templates.get(name)
    }

    /// Store `render` under `name` unless the name is taken.
    ///
    /// Returns the function that is stored after the call, which is `render`
    /// only when the name was free.
    pub fn get_or_insert(&self, name: &str, render: RenderFn) -> (RenderFn, Insertion) {
        self.templates.get_or_insert(name, render)
    }

    /// Drop the template stored under `name`. Returns whether one existed.
    pub fn remove(&self, name: &str) -> bool {
        self.templates.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.templates.names()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Partials by name. First registration wins.
///
/// Also the [`PartialResolver`] every template rendered by the owning
/// service receives, so `{{> name}}` resolves here.
pub struct PartialRegistry {
    partials: NamedFns<PartialRenderFn>,
}

impl PartialRegistry {
    pub fn new() -> Self {
        Self {
            partials: NamedFns::new(),
        }
    }

    /// The partial stored under `name`.
    pub fn get(&self, name: &str) -> Option<PartialRenderFn> {
        self.partials.get(name)
    }

    /// Store `render` under `name` unless the name is taken.
    pub fn insert_if_absent(&self, name: &str, render: PartialRenderFn) -> Insertion {
        self.partials.get_or_insert(name, render).1
    }

    pub fn contains(&self, name: &str) -> bool {
        self.partials.contains(name)
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.partials.names()
    }
}

impl Default for PartialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialResolver for PartialRegistry {
    fn resolve_partial(
        &self,
        name: &str,
        context: &RenderContext<'_>,
    ) -> Result<String, TemplateError> {
        let render = self
            .get(name)
            .ok_or_else(|| TemplateError::unknown_partial(name))?;
        render(context)
    }
}

impl fmt::Debug for PartialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialRegistry")
            .field("names", &self.names())
            .finish()
    }
}
