pub mod entity;
pub mod invariants;

pub use entity::{ImageArtifact, ImageMime, ImageOrigin};
pub use invariants::validate_artifact;
