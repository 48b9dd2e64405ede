//! Draft data for registering a new collection point.

use std::fs;
use std::path::Path;

use crate::geo::Coordinates;

/// A fully validated submission for a new collection point.
///
/// Construction goes through the registration flow so every field has
/// already been checked, the transport layer only encodes it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoint {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub position: Coordinates,
    pub city: String,
    pub uf: String,
    pub items: Vec<u64>,
    pub image: Option<ImageAttachment>,
}

impl NewPoint {
    /// The `items` form value, ids joined with commas.
    pub fn items_param(&self) -> String {
        self.items
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// An image file loaded from disk, ready to be attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("failed to read image `{path}`: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("`{0}` is not a supported image type (png, jpg, jpeg, gif or webp)")]
    UnsupportedType(String),
}

impl ImageAttachment {
    /// Load an attachment from disk, inferring the content type from the
    /// file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let content_type = content_type_for(&extension)
            .ok_or_else(|| AttachmentError::UnsupportedType(file_name.clone()))?;
        let bytes = fs::read(path).map_err(|source| AttachmentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

fn content_type_for(extension: &str) -> Option<&'static str> {
    match extension {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
