use rand::Rng;

use crate::error::{DatasetError, Result};
use crate::geometry::{ImageBounds, PatchSize, Rect};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Result of one sampling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// `attempt` is 1-based.
    Found { rect: Rect, attempt: u32 },
    Exhausted { attempts: u32 },
}

impl SampleOutcome {
    pub fn rect(&self) -> Option<Rect> {
        match self {
            SampleOutcome::Found { rect, .. } => Some(*rect),
            SampleOutcome::Exhausted { .. } => None,
        }
    }
}

/// Rejection sampler for background patches.
///
/// Each call proposes up to `max_attempts` uniformly placed candidates of the
/// requested size and returns the first one that is disjoint from every
/// exclusion rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonFaceSampler {
    pub max_attempts: u32,
}

impl Default for NonFaceSampler {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

impl NonFaceSampler {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn sample<R, T>(
        &self,
        rng: &mut R,
        bounds: ImageBounds,
        patch: PatchSize,
        exclusions: &[T],
    ) -> Result<SampleOutcome>
    where
        R: Rng + ?Sized,
        T: AsRef<Rect>,
    {
        if patch.width == 0 || patch.height == 0 {
            return Err(DatasetError::EmptyPatch);
        }
        if !patch.fits(bounds) {
            return Err(DatasetError::PatchExceedsImage {
                patch_width: patch.width,
                patch_height: patch.height,
                width: bounds.width,
                height: bounds.height,
            });
        }

        let max_x = i64::from(bounds.width - patch.width);
        let max_y = i64::from(bounds.height - patch.height);
        let (pw, ph) = (i64::from(patch.width), i64::from(patch.height));

        for attempt in 1..=self.max_attempts {
            let xmin = rng.gen_range(0..=max_x);
            let ymin = rng.gen_range(0..=max_y);
            let candidate = Rect::new(xmin, ymin, xmin + pw, ymin + ph);

            if exclusions.iter().all(|r| candidate.disjoint(r.as_ref())) {
                return Ok(SampleOutcome::Found { rect: candidate, attempt });
            }
        }
        Ok(SampleOutcome::Exhausted { attempts: self.max_attempts })
    }
}

/// Sample with the default attempt budget.
pub fn sample_nonface<R, T>(
    rng: &mut R,
    bounds: ImageBounds,
    patch: PatchSize,
    exclusions: &[T],
) -> Result<Option<Rect>>
where
    R: Rng + ?Sized,
    T: AsRef<Rect>,
{
    NonFaceSampler::default()
        .sample(rng, bounds, patch, exclusions)
        .map(|outcome| outcome.rect())
}
