//! Whisker: compile-once template host.
//!
//! Turns Handlebars-style template source into reusable render functions,
//! caches them under logical names, and resolves named partials while
//! rendering.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use whisker::prelude::*;
//!
//! let service = TemplateService::new();
//! service.register_partial("item", "<li>{{this}}</li>")?;
//!
//! let text = service.compile_and_run(
//!     "<ul>{{#each items}}{{> item}}{{/each}}</ul>",
//!     &json!({ "items": ["a", "b"] }),
//!     Some("list"),
//! )?;
//! assert_eq!(text, "<ul><li>a</li><li>b</li></ul>");
//!
//! // Cached: later runs skip parsing entirely.
//! service.run("list", &json!({ "items": [] }))?;
//! ```
//!
//! The building blocks live in their own crates and are re-exported here:
//! [`whisker_core`] (document tree, errors), [`whisker_parser`],
//! [`whisker_compiler`] (transform pipeline) and [`whisker_render`].

mod builder;
mod registry;
mod service;

pub use builder::ServiceBuilder;
pub use registry::{
    Insertion, PartialRegistry, PartialRenderFn, RenderFn, TemplateRegistry, partial_fn, render_fn,
};
pub use service::TemplateService;

pub use whisker_compiler::{DocumentCompiler, DocumentTransform, TransformPipeline, WhitespaceCollapser};
pub use whisker_core::{
    BlockArgument, BlockTable, Document, ParseError, ParseErrorKind, ParseErrors, Span,
    TemplateError, TemplateResult,
};
pub use whisker_parser::{HandlebarsParser, TemplateParser};
pub use whisker_render::{
    BlockHelper, BlockHelpers, DefaultMetadataProvider, DocumentRenderer, HelperBlock,
    MetadataProvider, NoPartials, PartialResolver, RenderContext, RenderOptions, Renderer,
};

pub use whisker_compiler;
pub use whisker_core;
pub use whisker_parser;
pub use whisker_render;

/// Everything needed to compile and run templates.
pub mod prelude {
    pub use crate::{
        BlockArgument, BlockHelper, HelperBlock, PartialRenderFn, RenderContext, RenderFn,
        ServiceBuilder, TemplateError, TemplateResult, TemplateService, partial_fn, render_fn,
    };
}
