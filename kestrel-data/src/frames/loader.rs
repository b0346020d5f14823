//! Per-modality frame decoders.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageError};
use thiserror::Error;
use tracing::debug;

use crate::frames::pfm::{self, PfmError, PfmImage};
use crate::frames::{DepthImage, GrayImage, RgbImage};

/// Errors that can occur while decoding a frame file.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid PFM file {}: {source}", .path.display())]
    Pfm {
        path: PathBuf,
        #[source]
        source: PfmError,
    },

    #[error("Unsupported depth pixel format in {}: {color}", .path.display())]
    UnsupportedDepth { path: PathBuf, color: String },

    #[error("Image size mismatch: expected {expected:?}, got {actual:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

fn decode(path: &Path) -> Result<DynamicImage, FrameError> {
    image::open(path).map_err(|source| FrameError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read any supported image as 8-bit grayscale.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_gray(path: &Path) -> Result<GrayImage, FrameError> {
    let img = decode(path)?;
    debug!("Decoded {}x{} {:?}", img.width(), img.height(), img.color());
    Ok(img.into_luma8())
}

/// Read any supported image as 8-bit RGB.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_color(path: &Path) -> Result<RgbImage, FrameError> {
    let img = decode(path)?;
    debug!("Decoded {}x{} {:?}", img.width(), img.height(), img.color());
    Ok(img.into_rgb8())
}

/// Read a depth or disparity map, keeping float maps in whole units.
pub fn read_depth(path: &Path) -> Result<DepthImage, FrameError> {
    read_depth_scaled(path, None)
}

/// Read a depth or disparity map.
///
/// `.pfm` files hold float samples. They are multiplied by `float_scale` (when
/// given), then rounded and saturated to `i16`; non-finite values become 0. With
/// a scale of 256 a DispNet disparity keeps 1/256 pixel steps up to 127 pixels.
/// Anything else goes through `image` and must be single channel: 16-bit values
/// saturate at `i16::MAX`, 8-bit values are widened. Integer files are never
/// rescaled.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_depth_scaled(
    path: &Path,
    float_scale: Option<u16>,
) -> Result<DepthImage, FrameError> {
    let is_pfm = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pfm"));

    if is_pfm {
        let bytes = std::fs::read(path).map_err(|source| FrameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pfm = pfm::parse(&bytes).map_err(|source| FrameError::Pfm {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Decoded {}x{} PFM", pfm.width, pfm.height);
        return Ok(quantize(&pfm, float_scale.map_or(1.0, f32::from)));
    }

    match decode(path)? {
        DynamicImage::ImageLuma16(luma) => {
            let (w, h) = luma.dimensions();
            let raw = luma
                .into_raw()
                .into_iter()
                .map(|v| v.min(i16::MAX as u16) as i16)
                .collect();
            Ok(from_raw(w, h, raw))
        }
        DynamicImage::ImageLuma8(luma) => {
            let (w, h) = luma.dimensions();
            let raw = luma.into_raw().into_iter().map(i16::from).collect();
            Ok(from_raw(w, h, raw))
        }
        other => Err(FrameError::UnsupportedDepth {
            path: path.to_path_buf(),
            color: format!("{:?}", other.color()),
        }),
    }
}

fn quantize(pfm: &PfmImage, scale: f32) -> DepthImage {
    let raw = pfm
        .data
        .iter()
        .map(|&v| if v.is_finite() { (v * scale).round() as i16 } else { 0 })
        .collect();
    from_raw(pfm.width, pfm.height, raw)
}

fn from_raw(width: u32, height: u32, raw: Vec<i16>) -> DepthImage {
    // Length always matches: every caller maps a buffer of exactly width * height samples.
    DepthImage::from_raw(width, height, raw).unwrap_or_else(|| DepthImage::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};
    use tempfile::tempdir;

    #[test]
    fn test_read_color_and_gray() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("000000.png");
        RgbImage::from_pixel(5, 4, Rgb([200, 100, 50])).save(&path).unwrap();

        let color = read_color(&path).unwrap();
        assert_eq!(color.dimensions(), (5, 4));
        assert_eq!(color.get_pixel(2, 2), &Rgb([200, 100, 50]));

        let gray = read_gray(&path).unwrap();
        assert_eq!(gray.dimensions(), (5, 4));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_color(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, FrameError::Decode { .. }));
    }

    #[test]
    fn test_read_depth_pgm_16bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0000.pgm");
        let mut img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(3, 2);
        img.put_pixel(0, 0, Luma([1234]));
        img.put_pixel(2, 1, Luma([60000]));
        img.save(&path).unwrap();

        let depth = read_depth(&path).unwrap();
        assert_eq!(depth.dimensions(), (3, 2));
        assert_eq!(depth.get_pixel(0, 0).0[0], 1234);
        assert_eq!(depth.get_pixel(2, 1).0[0], i16::MAX);
        assert_eq!(depth.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn test_read_depth_png_8bit_is_widened() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depth.png");
        GrayImage::from_pixel(2, 2, Luma([200])).save(&path).unwrap();

        let depth = read_depth(&path).unwrap();
        assert!(depth.iter().all(|&d| d == 200));
    }

    #[test]
    fn test_read_depth_rejects_color() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depth.png");
        RgbImage::new(2, 2).save(&path).unwrap();

        assert!(matches!(
            read_depth(&path),
            Err(FrameError::UnsupportedDepth { .. })
        ));
    }

    #[test]
    fn test_read_depth_pfm() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("000000.pfm");
        let data = vec![1.4, 2.6, f32::NAN, -3.5, 1e9, f32::INFINITY];
        pfm::write(&path, 3, 2, &data).unwrap();

        let depth = read_depth(&path).unwrap();
        assert_eq!(depth.dimensions(), (3, 2));
        let values: Vec<i16> = depth.into_raw();
        assert_eq!(values, vec![1, 3, 0, -4, i16::MAX, 0]);
    }

    #[test]
    fn test_read_depth_pfm_fixed_point() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("000000.pfm");
        pfm::write(&path, 4, 1, &[1.25, 0.5, 127.0, 200.0]).unwrap();

        let depth = read_depth_scaled(&path, Some(256)).unwrap();
        assert_eq!(depth.into_raw(), vec![320, 128, 32512, i16::MAX]);

        let whole = read_depth_scaled(&path, Some(1)).unwrap();
        assert_eq!(whole, read_depth(&path).unwrap());
    }

    #[test]
    fn test_integer_depth_ignores_float_scale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depth.png");
        GrayImage::from_pixel(2, 2, Luma([40])).save(&path).unwrap();

        let depth = read_depth_scaled(&path, Some(256)).unwrap();
        assert!(depth.iter().all(|&d| d == 40));
    }

    #[test]
    fn test_read_depth_bad_pfm() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.PFM");
        std::fs::write(&path, b"P6\n1 1\n255\n").unwrap();

        assert!(matches!(read_depth(&path), Err(FrameError::Pfm { .. })));
    }

    #[test]
    fn test_read_depth_pfm_with_oversized_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("000000.pfm");
        std::fs::write(&path, b"Pf\n4294967295 4294967295\n-1.0\n\0\0\0\0").unwrap();

        assert!(matches!(
            read_depth(&path),
            Err(FrameError::Pfm {
                source: PfmError::TooLarge(..) | PfmError::Truncated { .. },
                ..
            })
        ));
    }
}
