use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::sampler::DEFAULT_MAX_ATTEMPTS;

pub const DEFAULT_PATCHES_PER_FACE: u32 = 3;
pub const DEFAULT_RESIZE: [u32; 2] = [64, 64];

/// One image folder and the annotation file describing it, both relative to
/// `DatasetConfig::base_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub folder: PathBuf,
    pub annotations: PathBuf,
}

impl SourceSpec {
    pub fn new(folder: impl Into<PathBuf>, annotations: impl Into<PathBuf>) -> Self {
        Self { folder: folder.into(), annotations: annotations.into() }
    }

    /// `<folder>` with annotations in `<folder>_annotations.txt`.
    pub fn from_folder(folder: &str) -> Self {
        Self::new(folder, format!("{folder}_annotations.txt"))
    }
}

/// Accepts `folder` or `folder:annotations.txt`.
impl FromStr for SourceSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((folder, ann)) if !folder.is_empty() && !ann.is_empty() => {
                Ok(SourceSpec::new(folder, ann))
            }
            Some(_) => Err(format!("expected folder[:annotations], got {s:?}")),
            None if !s.is_empty() => Ok(SourceSpec::from_folder(s)),
            None => Err("empty source".to_string()),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.folder.display(), self.annotations.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DatasetConfig {
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sources: Vec<SourceSpec>,
    /// Output patch size as `[width, height]`.
    pub resize: [u32; 2],
    pub max_attempts: u32,
    pub patches_per_face: u32,
    pub seed: Option<u64>,
    pub first_face_id: u64,
    pub first_nonface_id: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            sources: Vec::new(),
            resize: DEFAULT_RESIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            patches_per_face: DEFAULT_PATCHES_PER_FACE,
            seed: None,
            first_face_id: 1,
            first_nonface_id: 1,
        }
    }
}

impl DatasetConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        serde_json::from_str(&data).map_err(|source| DatasetError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(DatasetError::InvalidConfig("no sources configured".into()));
        }
        if self.resize[0] == 0 || self.resize[1] == 0 {
            return Err(DatasetError::InvalidConfig(format!(
                "resize must be non-zero, got {}x{}",
                self.resize[0], self.resize[1]
            )));
        }
        if self.max_attempts == 0 {
            return Err(DatasetError::InvalidConfig("max_attempts must be > 0".into()));
        }
        Ok(())
    }

    pub fn annotation_path(&self, source: &SourceSpec) -> PathBuf {
        self.base_dir.join(&source.annotations)
    }

    pub fn image_path(&self, source: &SourceSpec, file_name: &str) -> PathBuf {
        self.base_dir.join(&source.folder).join(file_name)
    }

    pub fn faces_dir(&self) -> PathBuf {
        self.output_dir.join("faces")
    }

    pub fn non_faces_dir(&self) -> PathBuf {
        self.output_dir.join("non_faces")
    }
}

/// Parse `64x64` (or a single `64` for a square).
pub fn parse_resize(s: &str) -> std::result::Result<[u32; 2], String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid dimension {v:?} in {s:?}"))
    };
    match s.split_once(['x', 'X']) {
        Some((w, h)) => Ok([parse(w)?, parse(h)?]),
        None => {
            let side = parse(s)?;
            Ok([side, side])
        }
    }
}
