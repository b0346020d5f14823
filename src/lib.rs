//! Kestrel
//!
//! Frame-indexed stereo dataset input for dense SLAM pipelines. This umbrella
//! crate re-exports the workspace members.

pub use kestrel_data as data;
pub use kestrel_input as input;

pub use kestrel_data::{DatasetLayout, RgbdCalibration, StereoCalibration};
pub use kestrel_input::{DepthProvider, Input, InputError};
