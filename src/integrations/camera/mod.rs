pub mod still;

pub use still::StillFrameCamera;
