use std::path::Path;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::annotations::{Annotations, ImageAnnotations};
use crate::config::{DatasetConfig, SourceSpec};
use crate::error::{DatasetError, Result};
use crate::geometry::PatchSize;
use crate::sampler::{NonFaceSampler, SampleOutcome};
use crate::store::ImageStore;

/// Hands out output file numbers for face and non-face patches.
///
/// Both sequences are monotonically increasing and shared across every
/// source of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next_face: u64,
    next_nonface: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl IdAllocator {
    pub fn new(first_face: u64, first_nonface: u64) -> Self {
        Self { next_face: first_face, next_nonface: first_nonface }
    }

    pub fn next_face(&mut self) -> Result<u64> {
        take(&mut self.next_face, "face")
    }

    pub fn next_nonface(&mut self) -> Result<u64> {
        take(&mut self.next_nonface, "non-face")
    }

    pub fn peek_face(&self) -> u64 {
        self.next_face
    }

    pub fn peek_nonface(&self) -> u64 {
        self.next_nonface
    }
}

fn take(next: &mut u64, kind: &'static str) -> Result<u64> {
    let id = *next;
    *next = id.checked_add(1).ok_or(DatasetError::IdOverflow { kind })?;
    Ok(id)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub images: usize,
    pub images_skipped: usize,
    pub faces_written: usize,
    pub faces_skipped: usize,
    pub nonfaces_written: usize,
    /// Sampler calls that returned no patch.
    pub nonfaces_exhausted: usize,
    /// Faces whose box is larger than the image, so no background patch fits.
    pub nonfaces_too_large: usize,
}

impl SourceSummary {
    fn absorb(&mut self, other: &SourceSummary) {
        self.images += other.images;
        self.images_skipped += other.images_skipped;
        self.faces_written += other.faces_written;
        self.faces_skipped += other.faces_skipped;
        self.nonfaces_written += other.nonfaces_written;
        self.nonfaces_exhausted += other.nonfaces_exhausted;
        self.nonfaces_too_large += other.nonfaces_too_large;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,
    pub totals: SourceSummary,
    pub next_face_id: u64,
    pub next_nonface_id: u64,
}

/// Drives face cropping and background sampling over configured sources.
pub struct DatasetBuilder<'a, S, R> {
    config: &'a DatasetConfig,
    store: S,
    rng: R,
    sampler: NonFaceSampler,
}

impl<'a, S, R> DatasetBuilder<'a, S, R>
where
    S: ImageStore,
    R: Rng,
{
    pub fn new(config: &'a DatasetConfig, store: S, rng: R) -> Self {
        Self {
            config,
            store,
            rng,
            sampler: NonFaceSampler::new(config.max_attempts),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process every configured source in order, threading `ids` through.
    pub fn run(&mut self, ids: &mut IdAllocator) -> Result<RunSummary> {
        self.config.validate()?;
        self.store.prepare_dir(&self.config.faces_dir())?;
        self.store.prepare_dir(&self.config.non_faces_dir())?;

        let mut sources = Vec::with_capacity(self.config.sources.len());
        let mut totals = SourceSummary { source: "total".to_string(), ..Default::default() };
        for source in &self.config.sources {
            let summary = self.process_source(source, ids)?;
            totals.absorb(&summary);
            sources.push(summary);
        }

        info!(
            "event" = "run.done",
            faces = totals.faces_written,
            non_faces = totals.nonfaces_written,
            images_skipped = totals.images_skipped,
            faces_skipped = totals.faces_skipped
        );
        Ok(RunSummary {
            sources,
            totals,
            next_face_id: ids.peek_face(),
            next_nonface_id: ids.peek_nonface(),
        })
    }

    /// Crop faces and sample non-faces for one image folder.
    ///
    /// Output directories must already exist.
    pub fn process_source(&mut self, source: &SourceSpec, ids: &mut IdAllocator) -> Result<SourceSummary> {
        let ann_path = self.config.annotation_path(source);
        info!("event" = "source.start", folder = %source.folder.display(), annotations = %ann_path.display());
        let annotations = Annotations::load(&ann_path)?;

        let mut summary = SourceSummary { source: source.to_string(), ..Default::default() };
        for image in annotations.iter() {
            summary.images += 1;
            self.process_image(source, image, ids, &mut summary)?;
        }

        info!(
            "event" = "source.done",
            folder = %source.folder.display(),
            images = summary.images,
            faces = summary.faces_written,
            non_faces = summary.nonfaces_written
        );
        Ok(summary)
    }

    fn process_image(
        &mut self,
        source: &SourceSpec,
        entry: &ImageAnnotations,
        ids: &mut IdAllocator,
        summary: &mut SourceSummary,
    ) -> Result<()> {
        let path = self.config.image_path(source, &entry.file_name);
        let image = match self.store.load(&path) {
            Ok(img) => img,
            Err(err) => {
                warn!("event" = "image.unreadable", path = %path.display(), error = %err);
                summary.images_skipped += 1;
                return Ok(());
            }
        };
        let bounds = self.store.bounds(&image);
        let faces_dir = self.config.faces_dir();
        let non_faces_dir = self.config.non_faces_dir();

        for (idx, face) in entry.faces.iter().enumerate() {
            let crop = face.rect.clamp_to(bounds);
            if crop.is_empty() {
                warn!("event" = "face.degenerate", image = %entry.file_name, index = idx, rect = ?face.rect);
                summary.faces_skipped += 1;
                continue;
            }

            let id = ids.next_face()?;
            let dest = faces_dir.join(format!("{id}.jpg"));
            self.store.write_patch(&image, crop, self.config.resize, &dest)?;
            debug!("event" = "face.saved", image = %entry.file_name, label = %face.label, path = %dest.display());
            summary.faces_written += 1;

            // a non-empty clamp implies a positive-size box, so `None` means
            // the box is too large to express as a patch size
            let Some(patch) = PatchSize::of(&face.rect) else {
                warn!("event" = "nonface.patch_too_large", image = %entry.file_name, rect = ?face.rect);
                summary.nonfaces_too_large += 1;
                continue;
            };
            self.sample_nonfaces(&image, entry, patch, &non_faces_dir, ids, summary)?;
        }
        Ok(())
    }

    fn sample_nonfaces(
        &mut self,
        image: &S::Image,
        entry: &ImageAnnotations,
        patch: PatchSize,
        non_faces_dir: &Path,
        ids: &mut IdAllocator,
        summary: &mut SourceSummary,
    ) -> Result<()> {
        let bounds = self.store.bounds(image);
        for _ in 0..self.config.patches_per_face {
            let outcome = match self.sampler.sample(&mut self.rng, bounds, patch, entry.faces.as_slice()) {
                Ok(outcome) => outcome,
                Err(err @ DatasetError::PatchExceedsImage { .. }) => {
                    warn!("event" = "nonface.patch_too_large", image = %entry.file_name, error = %err);
                    summary.nonfaces_too_large += 1;
                    return Ok(());
                }
                Err(err) => return Err(err),
            };

            match outcome {
                SampleOutcome::Found { rect, attempt } => {
                    let id = ids.next_nonface()?;
                    let dest = non_faces_dir.join(format!("{id}.jpg"));
                    self.store.write_patch(image, rect, self.config.resize, &dest)?;
                    debug!("event" = "nonface.saved", image = %entry.file_name, attempt, path = %dest.display());
                    summary.nonfaces_written += 1;
                }
                SampleOutcome::Exhausted { attempts } => {
                    debug!("event" = "nonface.exhausted", image = %entry.file_name, attempts);
                    summary.nonfaces_exhausted += 1;
                }
            }
        }
        Ok(())
    }
}
