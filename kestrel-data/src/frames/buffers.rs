//! Image types and the reusable per-frame buffer set.

use image::{ImageBuffer, Luma, Pixel};

use crate::frames::FrameError;

pub use image::{GrayImage, RgbImage};

/// Single channel, 16-bit signed depth (or disparity) map.
pub type DepthImage = ImageBuffer<Luma<i16>, Vec<i16>>;

/// The five buffers holding the current frame.
///
/// Sizes are fixed at construction. Reads overwrite the contents through
/// [`copy_into`] and never reallocate.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    pub left_color: RgbImage,
    pub right_color: RgbImage,
    pub left_gray: GrayImage,
    pub right_gray: GrayImage,
    pub depth: DepthImage,
}

impl FrameBuffers {
    /// Allocate zeroed buffers. Grayscale buffers share the color size.
    pub fn new(rgb_size: (u32, u32), depth_size: (u32, u32)) -> Self {
        let (rgb_w, rgb_h) = rgb_size;
        let (depth_w, depth_h) = depth_size;
        Self {
            left_color: RgbImage::new(rgb_w, rgb_h),
            right_color: RgbImage::new(rgb_w, rgb_h),
            left_gray: GrayImage::new(rgb_w, rgb_h),
            right_gray: GrayImage::new(rgb_w, rgb_h),
            depth: DepthImage::new(depth_w, depth_h),
        }
    }

    pub fn rgb_size(&self) -> (u32, u32) {
        self.left_color.dimensions()
    }

    pub fn depth_size(&self) -> (u32, u32) {
        self.depth.dimensions()
    }
}

/// Overwrite `dst` with `src` in place. Fails instead of reallocating if the sizes differ.
pub fn copy_into<P: Pixel>(
    dst: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
) -> Result<(), FrameError> {
    if dst.dimensions() != src.dimensions() {
        return Err(FrameError::SizeMismatch {
            expected: dst.dimensions(),
            actual: src.dimensions(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_buffer_sizes() {
        let buffers = FrameBuffers::new((1242, 375), (640, 480));
        assert_eq!(buffers.rgb_size(), (1242, 375));
        assert_eq!(buffers.right_gray.dimensions(), (1242, 375));
        assert_eq!(buffers.depth_size(), (640, 480));
        assert!(buffers.depth.iter().all(|&d| d == 0));
    }

    #[test]
    fn test_copy_into_keeps_allocation() {
        let mut dst = RgbImage::new(4, 3);
        let ptr = dst.as_raw().as_ptr();
        let src = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));

        copy_into(&mut dst, &src).unwrap();
        assert_eq!(dst, src);
        assert_eq!(dst.as_raw().as_ptr(), ptr);
    }

    #[test]
    fn test_copy_into_size_mismatch() {
        let mut dst = DepthImage::new(4, 3);
        let src = DepthImage::from_pixel(3, 4, Luma([7]));

        let err = copy_into(&mut dst, &src).unwrap_err();
        assert!(matches!(
            err,
            FrameError::SizeMismatch {
                expected: (4, 3),
                actual: (3, 4),
            }
        ));
        assert!(dst.iter().all(|&d| d == 0));
    }
}
