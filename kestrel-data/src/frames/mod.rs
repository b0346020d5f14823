//! Frame images and the decoders that fill them.

mod buffers;
mod loader;
pub mod pfm;

pub use buffers::{DepthImage, FrameBuffers, GrayImage, RgbImage, copy_into};
pub use loader::{FrameError, read_color, read_depth, read_depth_scaled, read_gray};
