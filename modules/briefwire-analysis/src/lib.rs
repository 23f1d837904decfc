//! Classification and insight stages of the pipeline.
//!
//! Per (project, article) pair: staged relevance ([`relevance`]), thematic
//! tagging ([`thematic`]), global field extraction ([`fields`]), and the
//! per-article composition of the three ([`pipeline`]). Per project:
//! insight synthesis ([`insight`]). [`batch`] drives bulk runs in the
//! background with per-batch progress. Provider seams live in [`traits`].

pub mod batch;
pub mod fields;
pub mod insight;
pub mod pipeline;
pub mod relevance;
pub mod taxonomy;
pub mod thematic;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use batch::BatchCoordinator;
pub use fields::FieldExtractor;
pub use insight::InsightSynthesizer;
pub use pipeline::{AnalysisPipeline, ArticleReport, ProjectOutcome};
pub use relevance::{RelevanceClassifier, RelevanceOutcome};
pub use taxonomy::TaxonomyGenerator;
pub use thematic::ThematicClassifier;
