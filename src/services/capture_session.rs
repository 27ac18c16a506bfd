// src/services/capture_session.rs
//
// Capture Session - Camera device lifecycle
//
// State machine: Closed -> Opening -> Live -> Closed
//                Opening -> Closed (permission denied / device error)
//
// CRITICAL RULES:
// - The camera is exclusive: one open session per device at a time
// - close() stops every track and is idempotent
// - close() runs on every exit path, including drop
// - Closing cancels pending frame waits and in-progress opens

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use image::RgbaImage;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::frame_processing;

/// Latest frame published by a camera stream
pub type FrameSlot = Option<Arc<RgbaImage>>;

/// A started camera stream.
///
/// The backend keeps the sending side and publishes frames into it.
#[derive(Debug)]
pub struct MediaStream {
    id: Uuid,
    frames: watch::Receiver<FrameSlot>,
}

impl MediaStream {
    pub fn new(frames: watch::Receiver<FrameSlot>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frames,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn current_frame(&self) -> FrameSlot {
        self.frames.borrow().clone()
    }
}

/// Platform camera access. A test double can simulate frame delivery.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Acquire the device and start streaming.
    ///
    /// Fails with `PermissionDenied` or `DeviceUnavailable`.
    async fn start(&self) -> AppResult<MediaStream>;

    /// Stop every track of the stream. Unknown ids are ignored.
    fn stop(&self, stream_id: Uuid);
}

/// A camera shared by every session opened on it.
#[derive(Clone)]
pub struct CameraDevice {
    label: String,
    backend: Arc<dyn CameraBackend>,
    in_use: Arc<AtomicBool>,
}

impl CameraDevice {
    pub fn new(label: impl Into<String>, backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            label: label.into(),
            backend,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }

    /// New session in `Closed`. Nothing is acquired until `open()`.
    pub fn session(&self) -> CaptureSession {
        CaptureSession {
            device: self.clone(),
            inner: Mutex::new(SessionInner::default()),
        }
    }

    fn claim(&self) -> bool {
        self.in_use
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.in_use.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraDevice")
            .field("label", &self.label)
            .field("in_use", &self.is_in_use())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaptureState {
    Closed,
    Opening,
    Live,
}

struct SessionInner {
    state: CaptureState,
    stream: Option<MediaStream>,
    cancel: CancellationToken,
    holds_device: bool,

    /// Bumped by every open and close; an open only finishes its own attempt
    attempt: u64,
}

impl Default for SessionInner {
    fn default() -> Self {
        Self {
            state: CaptureState::Closed,
            stream: None,
            cancel: CancellationToken::new(),
            holds_device: false,
            attempt: 0,
        }
    }
}

pub struct CaptureSession {
    device: CameraDevice,
    inner: Mutex<SessionInner>,
}

impl CaptureSession {
    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    /// Acquire the device and start the stream.
    ///
    /// Opening an already live session is a no-op.
    pub async fn open(&self) -> AppResult<()> {
        let (attempt, cancel) = {
            let mut inner = self.lock();
            match inner.state {
                CaptureState::Live => return Ok(()),
                CaptureState::Opening => {
                    return Err(AppError::DeviceUnavailable(format!(
                        "{} is already being opened",
                        self.device.label
                    )))
                }
                CaptureState::Closed => {}
            }

            if !self.device.claim() {
                return Err(AppError::DeviceUnavailable(format!(
                    "{} is in use by another session",
                    self.device.label
                )));
            }

            inner.holds_device = true;
            inner.cancel = CancellationToken::new();
            inner.state = CaptureState::Opening;
            inner.attempt += 1;
            (inner.attempt, inner.cancel.clone())
        };

        log::info!("Opening camera {}", self.device.label);

        let started = tokio::select! {
            started = self.device.backend.start() => started,
            _ = cancel.cancelled() => Err(AppError::DeviceUnavailable(
                "Capture session closed while opening".to_string(),
            )),
        };

        let mut inner = self.lock();
        let current = inner.attempt == attempt && inner.state == CaptureState::Opening;
        match started {
            Ok(stream) if current => {
                inner.stream = Some(stream);
                inner.state = CaptureState::Live;
                log::info!("Camera {} is live", self.device.label);
                Ok(())
            }
            Ok(stream) => {
                // close() won the race; the session may already belong to a newer open
                self.device.backend.stop(stream.id());
                Err(AppError::DeviceUnavailable(
                    "Capture session closed while opening".to_string(),
                ))
            }
            Err(_) if !current => {
                log::debug!(
                    "Stale open attempt {} on {} ended after close",
                    attempt,
                    self.device.label
                );
                Err(AppError::DeviceUnavailable(
                    "Capture session closed while opening".to_string(),
                ))
            }
            Err(e) => {
                if inner.holds_device {
                    inner.holds_device = false;
                    self.device.release();
                }
                inner.state = CaptureState::Closed;
                log::warn!("Camera {} failed to open: {}", self.device.label, e);
                Err(e)
            }
        }
    }

    /// Sample the current frame, cropped to a centered square and masked
    /// to a circle.
    pub fn capture_frame(&self) -> AppResult<RgbaImage> {
        let frame = {
            let inner = self.lock();
            if inner.state != CaptureState::Live {
                return Err(AppError::DeviceUnavailable(format!(
                    "Camera is {:?}, not live",
                    inner.state
                )));
            }
            inner
                .stream
                .as_ref()
                .and_then(MediaStream::current_frame)
                .ok_or_else(|| {
                    AppError::DeviceUnavailable("Camera has not delivered a frame yet".to_string())
                })?
        };

        Ok(frame_processing::frame_portrait(&frame))
    }

    /// Wait until the stream has delivered at least one frame.
    ///
    /// Resolves to `DeviceUnavailable` if the session is closed meanwhile.
    pub async fn wait_for_frame(&self) -> AppResult<()> {
        let (mut frames, cancel) = {
            let inner = self.lock();
            match (&inner.stream, inner.state) {
                (Some(stream), CaptureState::Live) => (stream.frames.clone(), inner.cancel.clone()),
                _ => {
                    return Err(AppError::DeviceUnavailable(
                        "Camera is not live".to_string(),
                    ))
                }
            }
        };

        tokio::select! {
            delivered = async move { frames.wait_for(|frame| frame.is_some()).await.map(|_| ()) } => {
                delivered.map_err(|_| AppError::DeviceUnavailable("Camera stream ended".to_string()))
            }
            _ = cancel.cancelled() => Err(AppError::DeviceUnavailable(
                "Capture session closed".to_string(),
            )),
        }
    }

    /// Stop all tracks and release the device. Safe to call in any state.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.state == CaptureState::Closed && !inner.holds_device {
            return;
        }

        inner.cancel.cancel();
        inner.attempt += 1;
        if let Some(stream) = inner.stream.take() {
            self.device.backend.stop(stream.id());
        }
        if inner.holds_device {
            inner.holds_device = false;
            self.device.release();
        }
        inner.state = CaptureState::Closed;
        log::info!("Camera {} closed", self.device.label);
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("device", &self.device.label)
            .field("state", &self.state())
            .finish()
    }
}
