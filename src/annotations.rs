use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DatasetError, Result};
use crate::geometry::{LabeledRect, Rect};

pub const DEFAULT_LABEL: &str = "unknown";

/// Face rectangles of a single image, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnnotations {
    pub file_name: String,
    pub faces: Vec<LabeledRect>,
}

/// Annotations grouped by image file name.
///
/// Images keep the order in which they first appear in the file.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    images: Vec<ImageAnnotations>,
    index: HashMap<String, usize>,
}

impl Annotations {
    /// Read and parse an annotation file.
    ///
    /// Each non-blank line is `<filename> <xmin> <ymin> <xmax> <ymax> [label]`.
    /// Any malformed line fails the whole file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// `origin` is only used to label errors.
    pub fn parse(text: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let origin = origin.into();
        let mut out = Self::default();
        for (idx, line) in text.lines().enumerate() {
            match parse_line(line) {
                Ok(Some((file_name, face))) => out.push(file_name, face),
                Ok(None) => {}
                Err(reason) => {
                    return Err(DatasetError::MalformedAnnotation {
                        path: origin,
                        line: idx + 1,
                        reason,
                    });
                }
            }
        }
        Ok(out)
    }

    pub fn push(&mut self, file_name: impl Into<String>, face: LabeledRect) {
        let file_name = file_name.into();
        match self.index.get(&file_name) {
            Some(&i) => self.images[i].faces.push(face),
            None => {
                self.index.insert(file_name.clone(), self.images.len());
                self.images.push(ImageAnnotations { file_name, faces: vec![face] });
            }
        }
    }

    pub fn get(&self, file_name: &str) -> Option<&ImageAnnotations> {
        self.index.get(file_name).map(|&i| &self.images[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageAnnotations> {
        self.images.iter()
    }

    /// Number of distinct images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.images.iter().map(|i| i.faces.len()).sum()
    }
}

fn parse_line(line: &str) -> std::result::Result<Option<(String, LabeledRect)>, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(None);
    }
    if parts.len() < 5 {
        return Err(format!("expected at least 5 fields, found {}", parts.len()));
    }

    let mut coords = [0i64; 4];
    for (slot, (name, raw)) in coords
        .iter_mut()
        .zip(["xmin", "ymin", "xmax", "ymax"].iter().zip(&parts[1..5]))
    {
        *slot = raw
            .parse::<i64>()
            .map_err(|_| format!("{name} is not an integer: {raw:?}"))?;
    }

    let label = parts.get(5).copied().unwrap_or(DEFAULT_LABEL);
    let rect = Rect::new(coords[0], coords[1], coords[2], coords[3]);
    Ok(Some((parts[0].to_string(), LabeledRect::new(rect, label))))
}
