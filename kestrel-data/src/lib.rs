//! Kestrel Data Crate
//!
//! Plain values and decoders for stereo SLAM datasets stored on disk: layout
//! descriptors with presets for known conventions, calibration values, printf-style
//! filename patterns and per-modality frame decoders. Nothing here keeps a cursor;
//! that lives in `kestrel-input`.

pub mod calibration;
pub mod frames;
pub mod layout;
pub mod pattern;

pub use calibration::{Intrinsics, RgbdCalibration, StereoCalibration};
pub use frames::{
    DepthImage, FrameBuffers, FrameError, GrayImage, RgbImage, copy_into, read_color,
    read_depth, read_depth_scaled, read_gray,
};
pub use layout::{DatasetLayout, DepthEncoding, FrameStream, LayoutError, OdometryFormat};
pub use pattern::{PatternError, render_frame_name};
