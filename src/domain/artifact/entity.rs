use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infrastructure::PreviewHandle;

/// Raster formats the scoring backend stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMime {
    Jpeg,
    Png,
}

/// How the image entered the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    /// Picked from disk or an upload control
    FileSelection,

    /// Sampled from a live camera session
    CameraCapture,
}

/// The in-memory image payload awaiting scoring.
///
/// Owned exclusively by the workflow. Dropping it revokes its preview.
pub struct ImageArtifact {
    pub id: Uuid,
    pub file_name: String,
    pub mime: ImageMime,
    pub origin: ImageOrigin,
    pub acquired_at: DateTime<Utc>,
    bytes: Arc<[u8]>,
    preview: PreviewHandle,
}

impl ImageMime {
    /// Parse a MIME string. `image/jpg` is accepted as an alias.
    pub fn from_mime_str(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageMime::Jpeg),
            "image/png" => Some(ImageMime::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpg",
            ImageMime::Png => "png",
        }
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageOrigin::FileSelection => write!(f, "file_selection"),
            ImageOrigin::CameraCapture => write!(f, "camera_capture"),
        }
    }
}

impl ImageArtifact {
    pub fn new(
        file_name: String,
        mime: ImageMime,
        origin: ImageOrigin,
        bytes: Arc<[u8]>,
        preview: PreviewHandle,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            mime,
            origin,
            acquired_at: Utc::now(),
            bytes,
            preview,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared view of the payload, for handing to a transport.
    pub fn payload(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn preview_uri(&self) -> String {
        self.preview.uri()
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    /// Release the preview ahead of drop.
    pub fn release(&mut self) {
        self.preview.revoke();
    }

    /// Inline `data:` URL for presentation layers without a registry.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime.as_str(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

impl std::fmt::Debug for ImageArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageArtifact")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("origin", &self.origin)
            .field("size", &self.bytes.len())
            .field("preview", &self.preview)
            .finish()
    }
}
