//! Document transform passes.
//!
//! - [`whitespace`]: `~` whitespace control
//!
//! A [`TransformPipeline`] runs its stages in order, exactly once each, after
//! a successful parse and before the document is captured for rendering.

pub mod whitespace;

pub use whitespace::WhitespaceCollapser;

use std::fmt;

use whisker_core::Document;

/// A document-to-document rewrite applied before a template is render-ready.
///
/// Stages must be pure: no side effects outside the returned document, and
/// they must terminate.
pub trait DocumentTransform: Send + Sync {
    /// Short identifier used in traces.
    fn name(&self) -> &str;

    /// Rewrite the document.
    fn transform(&self, document: Document) -> Document;
}

/// Ordered transform stages.
pub struct TransformPipeline {
    stages: Vec<Box<dyn DocumentTransform>>,
}

impl TransformPipeline {
    /// A pipeline with no stages; documents pass through untouched.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage after the existing ones.
    pub fn push(&mut self, stage: impl DocumentTransform + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Append a stage, builder style.
    pub fn with_stage(mut self, stage: impl DocumentTransform + 'static) -> Self {
        self.push(stage);
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.name())
    }

    /// Run every stage over `document`, in order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn apply(&self, document: Document) -> Document {
        self.stages.iter().fold(document, |document, stage| {
            tracing::trace!(stage = stage.name(), "applying document transform");
            stage.transform(document)
        })
    }
}

impl Default for TransformPipeline {
    /// The standard pipeline: whitespace collapsing only.
    fn default() -> Self {
        Self::empty().with_stage(WhitespaceCollapser)
    }
}

impl fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}
