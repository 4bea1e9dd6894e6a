use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, ViewerError};

/// Intended usage context for a rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenditionRole {
    /// Thumbnail / list preview
    Grid,
    /// Full-size viewer
    Detail,
}

impl RenditionRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Detail => "detail",
        }
    }
}

/// A pre-generated resized copy of a source image at a specific pixel width
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    pub width: u32,
    pub url: String,
    pub role: RenditionRole,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_encoding() -> String {
    crate::PREFERRED_ENCODING.to_string()
}

/// One listing photo with its pre-generated resolution variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    /// Opaque unique identifier, stable across renders
    pub id: String,

    #[serde(default)]
    pub original_path: String,

    #[serde(default)]
    pub thumbnail_path: String,

    #[serde(default)]
    pub original_width: Option<u32>,

    #[serde(default)]
    pub original_height: Option<u32>,

    /// Kept sorted ascending by width; widths are unique per (role, encoding)
    #[serde(default)]
    pub renditions: Vec<Rendition>,
}

impl ImageDescriptor {
    /// True when at least one path or rendition can be resolved to a URL
    pub fn has_source(&self) -> bool {
        !self.original_path.is_empty()
            || !self.thumbnail_path.is_empty()
            || !self.renditions.is_empty()
    }

    /// Natural pixel dimensions, when the backend supplied them
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        match (self.original_width, self.original_height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Some((width, height)),
            _ => None,
        }
    }

    /// Sorts renditions ascending by width. The resolver relies on this
    /// ordering; manifests from the backend already satisfy it, but hosts
    /// assembling descriptors by hand may not.
    pub fn normalize(&mut self) {
        self.renditions.sort_by_key(|r| r.width);
    }

    /// Validates the descriptor invariants: a displayable source exists,
    /// every rendition width is positive, and widths are unique within one
    /// (role, encoding) pair.
    pub fn validate(&self) -> Result<()> {
        if !self.has_source() {
            return Err(ViewerError::NoDisplayableSource {
                id: self.id.clone(),
            });
        }

        let mut seen: HashSet<(RenditionRole, &str, u32)> = HashSet::new();
        for rendition in &self.renditions {
            if rendition.width == 0 {
                return Err(ViewerError::InvalidDescriptor(format!(
                    "image {}: rendition width must be positive",
                    self.id
                )));
            }
            if rendition.url.is_empty() {
                return Err(ViewerError::InvalidDescriptor(format!(
                    "image {}: rendition url must be non-empty",
                    self.id
                )));
            }
            if !seen.insert((rendition.role, rendition.encoding.as_str(), rendition.width)) {
                return Err(ViewerError::InvalidDescriptor(format!(
                    "image {}: duplicate {}x{} rendition for encoding {}",
                    self.id,
                    rendition.role.as_str(),
                    rendition.width,
                    rendition.encoding
                )));
            }
        }

        Ok(())
    }
}
