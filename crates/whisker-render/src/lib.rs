//! Whisker renderer.
//!
//! Executes compiled documents against JSON models.
//!
//! ## Architecture
//!
//! - [`Renderer`] is the seam the service renders through; [`DocumentRenderer`]
//!   is the built-in implementation.
//! - [`RenderContext`] carries everything a render needs, including the
//!   [`PartialResolver`] used for `{{> name}}` and the [`MetadataProvider`]
//!   used to look into model values. Both are injected by the caller, so the
//!   renderer holds no reference back to whoever owns the partials.
//! - Blocks are rendered by the [`BlockHelper`] registered under their name in
//!   the renderer's [`BlockHelpers`].
//!
//! ## Modules
//!
//! - [`context`]: Render contexts, iteration data and partial resolution
//! - [`escape`]: HTML escaping
//! - [`helpers`]: Block helpers, built-in and host-supplied
//! - [`metadata`]: Member lookup, truthiness and display of model values
//! - [`renderer`]: The renderer trait and the built-in renderer

pub mod context;
pub mod escape;
pub mod helpers;
pub mod metadata;
pub mod renderer;

pub use context::{IterationData, NoPartials, PartialResolver, RenderContext};
pub use escape::escape_html;
pub use helpers::{
    BlockHelper, BlockHelpers, EachHelper, HelperBlock, IfHelper, UnlessHelper, WithHelper,
};
pub use metadata::{DefaultMetadataProvider, MetadataProvider};
pub use renderer::{DEFAULT_MAX_PARTIAL_DEPTH, DocumentRenderer, RenderOptions, Renderer};
