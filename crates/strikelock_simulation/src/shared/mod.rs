//! Shared domain: cross-cutting типы
//!
//! - Camera (CameraFrame, CameraMode, ActiveCamera)

pub mod camera;

pub use camera::*;
