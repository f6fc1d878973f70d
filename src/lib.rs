//! Build a face / non-face patch dataset from annotated images.
//!
//! Every annotated face is cropped and saved, and for each face a few
//! same-size background patches that overlap no face in the image are drawn
//! by rejection sampling.

pub mod annotations;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod sampler;
pub mod store;

pub use annotations::{Annotations, ImageAnnotations};
pub use config::{DatasetConfig, SourceSpec};
pub use dataset::{DatasetBuilder, IdAllocator, RunSummary, SourceSummary};
pub use error::{DatasetError, Result};
pub use geometry::{ImageBounds, LabeledRect, PatchSize, Rect, disjoint};
pub use sampler::{NonFaceSampler, SampleOutcome, sample_nonface};
pub use store::{FsImageStore, ImageStore};
