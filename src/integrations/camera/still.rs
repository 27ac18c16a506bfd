// src/integrations/camera/still.rs
//
// Still-frame camera backend
//
// Serves one fixed image as a live stream. Used for headless runs and
// demos where no physical camera is available.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::capture_session::{CameraBackend, FrameSlot, MediaStream};

pub struct StillFrameCamera {
    frame: Arc<RgbaImage>,
    permission_granted: bool,
    streams: Mutex<HashMap<Uuid, watch::Sender<FrameSlot>>>,
}

impl StillFrameCamera {
    pub fn new(frame: RgbaImage) -> Self {
        Self {
            frame: Arc::new(frame),
            permission_granted: true,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Decode an image file and serve it as the camera feed
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let frame = image::open(path)?.to_rgba8();
        log::debug!(
            "Still camera loaded {} ({}x{})",
            path.display(),
            frame.width(),
            frame.height()
        );
        Ok(Self::new(frame))
    }

    /// Behave like a camera the user refused access to
    pub fn denied(mut self) -> Self {
        self.permission_granted = false;
        self
    }

    /// Streams started and not yet stopped
    pub fn active_streams(&self) -> usize {
        self.streams.lock().unwrap().len()
    }
}

#[async_trait]
impl CameraBackend for StillFrameCamera {
    async fn start(&self) -> AppResult<MediaStream> {
        if !self.permission_granted {
            return Err(AppError::PermissionDenied);
        }
        if self.frame.width() == 0 || self.frame.height() == 0 {
            return Err(AppError::DeviceUnavailable(
                "Still camera has an empty frame".to_string(),
            ));
        }

        let (sender, receiver) = watch::channel(Some(Arc::clone(&self.frame)));
        let stream = MediaStream::new(receiver);
        self.streams.lock().unwrap().insert(stream.id(), sender);
        Ok(stream)
    }

    fn stop(&self, stream_id: Uuid) {
        if self.streams.lock().unwrap().remove(&stream_id).is_some() {
            log::debug!("Still camera stream {} stopped", stream_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::capture_session::{CameraDevice, CaptureState};
    use image::Rgba;

    #[tokio::test]
    async fn test_session_over_still_camera() {
        let camera = Arc::new(StillFrameCamera::new(RgbaImage::from_pixel(
            300,
            200,
            Rgba([1, 2, 3, 255]),
        )));
        let device = CameraDevice::new("still", camera.clone());
        let session = device.session();

        session.open().await.unwrap();
        session.wait_for_frame().await.unwrap();
        let frame = session.capture_frame().unwrap();
        assert_eq!(frame.dimensions(), (200, 200));
        assert_eq!(camera.active_streams(), 1);

        session.close();
        assert_eq!(camera.active_streams(), 0);
        assert_eq!(session.state(), CaptureState::Closed);
    }

    #[tokio::test]
    async fn test_denied_camera() {
        let camera = StillFrameCamera::new(RgbaImage::new(4, 4)).denied();
        assert!(matches!(camera.start().await, Err(AppError::PermissionDenied)));
    }
}
