// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Implementation details that support the workflow
// but are not part of its state machine.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates workflow transitions
// - Infrastructure is replaceable

pub mod frame_processing;
pub mod preview_registry;

pub use frame_processing::{crop_center_square, encode_png, frame_portrait, mask_circle};
pub use preview_registry::{PreviewHandle, PreviewRegistry};
