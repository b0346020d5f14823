//! Camera calibration values.
//!
//! These are plain values handed to the input layer. Parsing calibration files is
//! left to whoever builds them; the input layer only reads image sizes from here.

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics plus the image size they apply to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub width: u32,
    pub height: u32,
}

impl Intrinsics {
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32, width: u32, height: u32) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
        }
    }

    /// Image size as (width, height).
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn focal(&self) -> Vec2 {
        Vec2::new(self.fx, self.fy)
    }

    pub fn principal_point(&self) -> Vec2 {
        Vec2::new(self.cx, self.cy)
    }
}

/// Calibration of a color + depth sensor pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbdCalibration {
    pub rgb: Intrinsics,
    pub depth: Intrinsics,
    /// Rigid transform from the depth frame into the color frame.
    #[serde(default = "identity")]
    pub depth_to_rgb: Mat4,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl RgbdCalibration {
    pub fn new(rgb: Intrinsics, depth: Intrinsics) -> Self {
        Self {
            rgb,
            depth,
            depth_to_rgb: Mat4::IDENTITY,
        }
    }

    /// Depth computed from a rectified stereo pair lives in the color camera frame.
    pub fn shared(intrinsics: Intrinsics) -> Self {
        Self::new(intrinsics, intrinsics)
    }

    pub fn rgb_size(&self) -> (u32, u32) {
        self.rgb.size()
    }

    pub fn depth_size(&self) -> (u32, u32) {
        self.depth.size()
    }
}

/// Geometry of a rectified stereo rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoCalibration {
    /// Distance between the two camera centers, in meters.
    pub baseline: f32,
    /// Focal length of the rectified cameras, in pixels.
    pub focal_length: f32,
}

impl StereoCalibration {
    pub fn new(baseline: f32, focal_length: f32) -> Self {
        Self {
            baseline,
            focal_length,
        }
    }

    /// Depth in meters for a disparity in pixels. `None` for non-positive disparities.
    pub fn depth_from_disparity(&self, disparity: f32) -> Option<f32> {
        (disparity > 0.0).then(|| self.baseline * self.focal_length / disparity)
    }
}
