//! Whisker compiler.
//!
//! Produces render-ready documents from template source.
//!
//! ## Architecture
//!
//! - **Parse**: source text goes through a [`TemplateParser`]; any diagnostic
//!   aborts compilation with the full diagnostic list.
//! - **Transform**: the parsed document runs through a [`TransformPipeline`],
//!   each stage exactly once.
//!
//! The result is a plain [`Document`]; wrapping it into a render closure and
//! caching it is the service's job.
//!
//! ## Modules
//!
//! - [`passes`]: Transform stages and the pipeline that runs them

pub mod passes;

use std::fmt;
use std::sync::Arc;

pub use passes::{DocumentTransform, TransformPipeline, WhitespaceCollapser};

use whisker_core::{Document, ParseErrors};
use whisker_parser::{HandlebarsParser, TemplateParser};

/// Parse + transform, as one step.
#[derive(Clone)]
pub struct DocumentCompiler {
    parser: Arc<dyn TemplateParser>,
    pipeline: Arc<TransformPipeline>,
}

impl DocumentCompiler {
    /// Create a compiler from a parser and a transform pipeline.
    pub fn new(parser: Arc<dyn TemplateParser>, pipeline: TransformPipeline) -> Self {
        Self {
            parser,
            pipeline: Arc::new(pipeline),
        }
    }

    /// The transform pipeline applied after parsing.
    pub fn pipeline(&self) -> &TransformPipeline {
        &self.pipeline
    }

    /// Compile source into a render-ready document.
    ///
    /// A failed parse returns every diagnostic and never reaches the
    /// transform stages.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, source: &str) -> Result<Document, ParseErrors> {
        let document = self.parser.parse(source)?;
        Ok(self.pipeline.apply(document))
    }
}

impl Default for DocumentCompiler {
    /// Handlebars parser with the default pipeline.
    fn default() -> Self {
        Self::new(Arc::new(HandlebarsParser::new()), TransformPipeline::default())
    }
}

impl fmt::Debug for DocumentCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCompiler")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use whisker_core::{Node, ParseError, ParseErrorKind, Span};

    struct Rejecting;

    impl TemplateParser for Rejecting {
        fn parse(&self, _source: &str) -> Result<Document, ParseErrors> {
            Err(ParseError::new(ParseErrorKind::EmptyTag, Span::new(1, 1, 0), "nope").into())
        }
    }

    struct Counting(Arc<AtomicUsize>);

    impl DocumentTransform for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn transform(&self, document: Document) -> Document {
            self.0.fetch_add(1, Ordering::SeqCst);
            document
        }
    }

    #[test]
    fn compile_parses_then_collapses() {
        let compiler = DocumentCompiler::default();
        let document = compiler.compile("a  {{~x}}").unwrap();

        assert!(matches!(&document.nodes[0], Node::Text(t) if t.content == "a"));
    }

    #[test]
    fn failed_parse_skips_transforms() {
        let calls = Arc::new(AtomicUsize::new(0));
        let compiler = DocumentCompiler::new(
            Arc::new(Rejecting),
            TransformPipeline::empty().with_stage(Counting(calls.clone())),
        );

        let errors = compiler.compile("anything").unwrap_err();
        assert_eq!(errors.to_string(), "1:1: nope");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn successful_parse_runs_transforms_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let compiler = DocumentCompiler::new(
            Arc::new(HandlebarsParser::new()),
            TransformPipeline::default().with_stage(Counting(calls.clone())),
        );

        compiler.compile("{{x}}").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(compiler.pipeline().len(), 2);
    }
}
