//! Depth provider interface.

use kestrel_data::{DepthImage, GrayImage, StereoCalibration};
use thiserror::Error;

/// Errors reported by a [`DepthProvider`].
#[derive(Debug, Error)]
pub enum DepthProviderError {
    #[error("Depth computation failed: {0}")]
    Failed(String),

    #[error("Stereo pair is {input:?} but the depth map is {output:?}")]
    SizeMismatch {
        input: (u32, u32),
        output: (u32, u32),
    },
}

/// Computes a depth map from a rectified stereo pair.
///
/// Providers are owned by the pipeline, which lends them to [`Input`](crate::Input)
/// and may swap them between frames. They are shared across threads by the
/// random-access path, hence `&self` and the `Send + Sync` bound.
pub trait DepthProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fill `out` from the grayscale pair. `out` keeps its size.
    fn compute_depth(
        &self,
        left: &GrayImage,
        right: &GrayImage,
        stereo: &StereoCalibration,
        out: &mut DepthImage,
    ) -> Result<(), DepthProviderError>;
}
