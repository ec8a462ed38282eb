//! Core ETL (Extract, Transform, Load) stages.
//!
//! Each stage consumes the previous stage's tabular-text payload and hands
//! its own to the next; [`Pipeline`] sequences the three for one batch
//! date. Outcomes that end a run without being failures (missing source
//! object, already-loaded batch) are explicit enum variants, not errors.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::{BatchExtractor, ExtractOutcome, Extractor};
pub use load::{DEST_TABLE, LoadOutcome, Loader, PostgresLoader};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use transform::{BatchTransformer, Transformer};
