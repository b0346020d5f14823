//! Kestrel Input - frame-indexed input over recorded stereo datasets
//!
//! This crate owns the frame cursor of a dense SLAM pipeline. An [`Input`] resolves
//! every modality of a frame (stereo grayscale, stereo color and, when precomputed,
//! depth) through a [`DatasetLayout`](kestrel_data::DatasetLayout), loads them into
//! reusable buffers and hands out views of the current frame.
//!
//! Depth that is not stored on disk comes from a [`DepthProvider`] lent by the
//! pipeline.
//!
//! ## Example
//!
//! ```ignore
//! use kestrel_data::{DatasetLayout, Intrinsics, RgbdCalibration, StereoCalibration};
//! use kestrel_input::Input;
//!
//! let calib = RgbdCalibration::shared(Intrinsics::new(721.5, 721.5, 609.6, 172.9, 1241, 376));
//! let stereo = StereoCalibration::new(0.54, 721.5);
//! let mut input = Input::new("/data/kitti/06", DatasetLayout::kitti_odometry(), None, calib, stereo, 0);
//! while input.has_more_images() && input.read_next_frame() {
//!     let (rgb, depth) = input.images();
//!     // Fuse frame...
//! }
//! ```

mod depth;
mod input;

pub use depth::{DepthProvider, DepthProviderError};
pub use input::{Input, InputError, Modality};
