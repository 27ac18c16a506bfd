// src/integrations/mod.rs
//
// External Integrations Module
//
// - api: HTTP transport for the scoring and match services
// - camera: camera backends for capture sessions

pub mod api;
pub mod camera;

pub use api::ApiClient;
pub use camera::StillFrameCamera;
