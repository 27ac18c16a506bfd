// src/services/image_source.rs
//
// Image Source Adapter
//
// Normalizes the two acquisition paths into one ImageArtifact:
// - File selection: MIME, content and size are validated, bytes kept as given
// - Camera capture: the framed bitmap is re-encoded locally as PNG
//
// CRITICAL RULES:
// - Validation happens before any bytes reach the workflow
// - Oversized files are rejected without being read when a path is known
// - Every artifact owns exactly one preview handle

use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::domain::{validate_artifact, ImageArtifact, ImageMime, ImageOrigin};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{encode_png, PreviewRegistry};

/// A file picked by the user, before validation
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,

    /// MIME type as reported by the picker, if any
    pub mime: Option<String>,

    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime,
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            file_name: file_name_of(path),
            mime: guess_mime(path),
            bytes,
        })
    }
}

pub struct ImageSourceAdapter {
    previews: PreviewRegistry,
    max_upload_bytes: u64,
}

impl ImageSourceAdapter {
    pub fn new(previews: PreviewRegistry, max_upload_bytes: u64) -> Self {
        Self {
            previews,
            max_upload_bytes,
        }
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Validate a selected file and wrap it in an artifact.
    ///
    /// Type is checked before size. The declared type only gates entry;
    /// the artifact carries the type sniffed from the content.
    pub fn accept_file(&self, file: SelectedFile) -> AppResult<ImageArtifact> {
        let declared = self.check_type(file.mime.as_deref(), &file.file_name)?;

        if file.bytes.is_empty() {
            return Err(AppError::UnsupportedType(format!(
                "{} is empty",
                file.file_name
            )));
        }
        let mime = sniff_mime(&file.bytes).ok_or_else(|| {
            AppError::UnsupportedType(format!(
                "{} is not a JPEG or PNG image",
                file.file_name
            ))
        })?;
        if mime != declared {
            log::debug!(
                "{} declared as {} but contains {}",
                file.file_name,
                declared.as_str(),
                mime.as_str()
            );
        }
        self.check_size(file.bytes.len() as u64)?;

        let bytes: Arc<[u8]> = Arc::from(file.bytes);
        self.build(file.file_name, mime, ImageOrigin::FileSelection, bytes)
    }

    /// Like `accept_file`, but checks type and size from the path and
    /// metadata first so an oversized file is never loaded.
    pub fn accept_path(&self, path: &Path) -> AppResult<ImageArtifact> {
        let file_name = file_name_of(path);
        self.check_type(guess_mime(path).as_deref(), &file_name)?;

        let size = std::fs::metadata(path)?.len();
        self.check_size(size)?;

        self.accept_file(SelectedFile::from_path(path)?)
    }

    /// Wrap a framed camera bitmap. Exempt from the size limit.
    pub fn accept_captured_frame(&self, frame: &RgbaImage) -> AppResult<ImageArtifact> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(AppError::DeviceUnavailable(
                "Camera delivered an empty frame".to_string(),
            ));
        }

        let png = encode_png(frame)?;
        let file_name = format!("capture-{}.png", chrono::Utc::now().format("%Y%m%d-%H%M%S"));
        log::debug!(
            "Captured frame {}x{} encoded to {} bytes",
            frame.width(),
            frame.height(),
            png.len()
        );

        self.build(
            file_name,
            ImageMime::Png,
            ImageOrigin::CameraCapture,
            Arc::from(png),
        )
    }

    fn check_type(&self, mime: Option<&str>, file_name: &str) -> AppResult<ImageMime> {
        match mime {
            Some(raw) => ImageMime::from_mime_str(raw).ok_or_else(|| {
                AppError::UnsupportedType(format!(
                    "{} has type {}, only JPEG and PNG are accepted",
                    file_name, raw
                ))
            }),
            None => Err(AppError::UnsupportedType(format!(
                "Cannot determine the type of {}",
                file_name
            ))),
        }
    }

    fn check_size(&self, size: u64) -> AppResult<()> {
        if size > self.max_upload_bytes {
            return Err(AppError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    fn build(
        &self,
        file_name: String,
        mime: ImageMime,
        origin: ImageOrigin,
        bytes: Arc<[u8]>,
    ) -> AppResult<ImageArtifact> {
        let preview = self.previews.allocate(Arc::clone(&bytes));
        let artifact = ImageArtifact::new(file_name, mime, origin, bytes, preview);
        validate_artifact(&artifact)?;
        Ok(artifact)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn sniff_mime(bytes: &[u8]) -> Option<ImageMime> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Some(ImageMime::Jpeg),
        Ok(ImageFormat::Png) => Some(ImageMime::Png),
        _ => None,
    }
}

fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
}
