//! The frame cursor over a stereo dataset.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Pixel};
use kestrel_data::{
    DatasetLayout, DepthEncoding, DepthImage, FrameBuffers, FrameError, GrayImage,
    PatternError, RgbImage, RgbdCalibration, StereoCalibration, copy_into, read_color,
    read_depth_scaled, read_gray, render_frame_name,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::depth::{DepthProvider, DepthProviderError};

/// A per-frame data stream read by [`Input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    LeftGray,
    RightGray,
    LeftColor,
    RightColor,
    Depth,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::LeftGray => "left gray",
            Modality::RightGray => "right gray",
            Modality::LeftColor => "left color",
            Modality::RightColor => "right color",
            Modality::Depth => "depth",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while reading frames.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("Missing {modality} file for frame {frame}: {}", .path.display())]
    MissingFile {
        modality: Modality,
        frame: usize,
        path: PathBuf,
    },

    #[error("Failed to read {modality} for frame {frame}: {source}")]
    Frame {
        modality: Modality,
        frame: usize,
        #[source]
        source: FrameError,
    },

    #[error("{modality} for frame {frame} is {actual:?}, expected {expected:?}")]
    SizeMismatch {
        modality: Modality,
        frame: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("No precomputed depth configured and no depth provider set")]
    NoDepthProvider,

    #[error("Depth provider '{name}' failed: {source}")]
    DepthProvider {
        name: String,
        #[source]
        source: DepthProviderError,
    },
}

/// Every active modality of one frame, decoded but not yet committed.
struct StagedFrame {
    left_gray: GrayImage,
    right_gray: GrayImage,
    left_color: RgbImage,
    right_color: RgbImage,
    depth: Option<DepthImage>,
}

/// Reads synchronized stereo frames from a dataset on disk.
///
/// Files are addressed as `<root>/<folder>/<pattern rendered with the frame index>`
/// for every modality. Sequential reads go through [`read_next_frame`](Self::read_next_frame),
/// which fills buffers owned by the input; views of those buffers borrow the input
/// and therefore cannot outlive the next read. [`frame_images`](Self::frame_images)
/// reads any frame into caller buffers without touching the cursor.
pub struct Input<'p> {
    dataset_root: PathBuf,
    layout: DatasetLayout,
    depth_provider: Option<&'p dyn DepthProvider>,
    frame_idx: usize,
    calibration: RgbdCalibration,
    stereo_calibration: StereoCalibration,
    buffers: FrameBuffers,
}

impl<'p> Input<'p> {
    pub fn new(
        dataset_root: impl Into<PathBuf>,
        layout: DatasetLayout,
        depth_provider: Option<&'p dyn DepthProvider>,
        calibration: RgbdCalibration,
        stereo_calibration: StereoCalibration,
        frame_offset: usize,
    ) -> Self {
        let dataset_root = dataset_root.into();
        let buffers = FrameBuffers::new(calibration.rgb_size(), calibration.depth_size());

        let input = Self {
            dataset_root,
            layout,
            depth_provider,
            frame_idx: frame_offset,
            calibration,
            stereo_calibration,
            buffers,
        };

        info!(
            "Input {} at {} from frame {} (rgb {:?}, depth {:?}, {} depth)",
            input.dataset_identifier(),
            input.dataset_root.display(),
            frame_offset,
            input.rgb_size(),
            input.depth_size(),
            if input.layout.has_precomputed_depth() {
                "precomputed"
            } else {
                "computed"
            }
        );
        input
    }

    /// The one path rule shared by every modality.
    fn frame_path(
        &self,
        folder: &str,
        pattern: &str,
        frame_idx: usize,
    ) -> Result<PathBuf, PatternError> {
        Ok(self
            .dataset_root
            .join(folder)
            .join(render_frame_name(pattern, frame_idx)?))
    }

    pub fn left_gray_path(&self, frame_idx: usize) -> Result<PathBuf, PatternError> {
        self.frame_path(&self.layout.left_gray_folder, &self.layout.frame_pattern, frame_idx)
    }

    pub fn right_gray_path(&self, frame_idx: usize) -> Result<PathBuf, PatternError> {
        self.frame_path(&self.layout.right_gray_folder, &self.layout.frame_pattern, frame_idx)
    }

    pub fn left_color_path(&self, frame_idx: usize) -> Result<PathBuf, PatternError> {
        self.frame_path(&self.layout.left_color_folder, &self.layout.frame_pattern, frame_idx)
    }

    pub fn right_color_path(&self, frame_idx: usize) -> Result<PathBuf, PatternError> {
        self.frame_path(&self.layout.right_color_folder, &self.layout.frame_pattern, frame_idx)
    }

    /// `None` when depth is not precomputed.
    pub fn depth_path(&self, frame_idx: usize) -> Result<Option<PathBuf>, PatternError> {
        self.layout
            .depth
            .as_ref()
            .map(|stream| self.frame_path(&stream.folder, &stream.pattern, frame_idx))
            .transpose()
    }

    /// `None` when the layout has no LIDAR stream.
    pub fn velodyne_path(&self, frame_idx: usize) -> Result<Option<PathBuf>, PatternError> {
        self.layout
            .velodyne
            .as_ref()
            .map(|stream| self.frame_path(&stream.folder, &stream.pattern, frame_idx))
            .transpose()
    }

    pub fn segmentation_dir(&self) -> Option<PathBuf> {
        self.layout
            .segmentation_folder
            .as_ref()
            .map(|folder| self.dataset_root.join(folder))
    }

    pub fn odometry_path(&self) -> Option<PathBuf> {
        self.layout
            .odometry_file
            .as_ref()
            .map(|file| self.dataset_root.join(file))
    }

    pub fn calibration_path(&self) -> PathBuf {
        self.dataset_root.join(&self.layout.calibration_file)
    }

    /// Files that have to exist for `frame_idx` to be readable.
    pub fn required_paths(
        &self,
        frame_idx: usize,
    ) -> Result<Vec<(Modality, PathBuf)>, PatternError> {
        let mut paths = vec![
            (Modality::LeftGray, self.left_gray_path(frame_idx)?),
            (Modality::RightGray, self.right_gray_path(frame_idx)?),
            (Modality::LeftColor, self.left_color_path(frame_idx)?),
            (Modality::RightColor, self.right_color_path(frame_idx)?),
        ];
        if let Some(depth) = self.depth_path(frame_idx)? {
            paths.push((Modality::Depth, depth));
        }
        Ok(paths)
    }

    /// Whether every file of the current frame is present.
    pub fn has_more_images(&self) -> bool {
        match self.required_paths(self.frame_idx) {
            Ok(paths) => paths.iter().all(|(_, path)| path.is_file()),
            Err(e) => {
                debug!("Cannot resolve frame {}: {}", self.frame_idx, e);
                false
            }
        }
    }

    /// Read the current frame into the input's buffers and advance the cursor.
    ///
    /// Returns false if any active modality could not be read; in that case the
    /// buffers and the cursor are left exactly as they were.
    pub fn read_next_frame(&mut self) -> bool {
        match self.try_read_next_frame() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to read frame {}: {}", self.frame_idx, e);
                false
            }
        }
    }

    /// [`read_next_frame`](Self::read_next_frame), reporting why a read failed.
    pub fn try_read_next_frame(&mut self) -> Result<(), InputError> {
        let frame_idx = self.frame_idx;
        let staged = self.stage_frame(frame_idx)?;

        // Sizes were checked while staging, so none of these copies can fail halfway.
        let buffers = &mut self.buffers;
        commit(&mut buffers.left_gray, &staged.left_gray, Modality::LeftGray, frame_idx)?;
        commit(&mut buffers.right_gray, &staged.right_gray, Modality::RightGray, frame_idx)?;
        commit(&mut buffers.left_color, &staged.left_color, Modality::LeftColor, frame_idx)?;
        commit(&mut buffers.right_color, &staged.right_color, Modality::RightColor, frame_idx)?;
        if let Some(depth) = &staged.depth {
            commit(&mut buffers.depth, depth, Modality::Depth, frame_idx)?;
        }

        self.frame_idx += 1;
        debug!("Read frame {}", frame_idx);
        Ok(())
    }

    /// Decode every active modality of `frame_idx` and check it against the buffer sizes.
    fn stage_frame(&self, frame_idx: usize) -> Result<StagedFrame, InputError> {
        let rgb_size = self.rgb_size();
        let left_gray = self.load(
            Modality::LeftGray,
            frame_idx,
            self.left_gray_path(frame_idx)?,
            rgb_size,
            read_gray,
        )?;
        let right_gray = self.load(
            Modality::RightGray,
            frame_idx,
            self.right_gray_path(frame_idx)?,
            rgb_size,
            read_gray,
        )?;
        let left_color = self.load(
            Modality::LeftColor,
            frame_idx,
            self.left_color_path(frame_idx)?,
            rgb_size,
            read_color,
        )?;
        let right_color = self.load(
            Modality::RightColor,
            frame_idx,
            self.right_color_path(frame_idx)?,
            rgb_size,
            read_color,
        )?;

        let depth = match self.depth_path(frame_idx)? {
            Some(path) => Some(self.load(
                Modality::Depth,
                frame_idx,
                path,
                self.depth_size(),
                |p| read_depth_scaled(p, self.layout.float_depth_scale),
            )?),
            None => None,
        };

        Ok(StagedFrame {
            left_gray,
            right_gray,
            left_color,
            right_color,
            depth,
        })
    }

    /// Decode one file, failing on a missing file or an unexpected size.
    fn load<P: Pixel>(
        &self,
        modality: Modality,
        frame_idx: usize,
        path: PathBuf,
        expected: (u32, u32),
        read: impl FnOnce(&Path) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, FrameError>,
    ) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, InputError> {
        if !path.is_file() {
            return Err(InputError::MissingFile {
                modality,
                frame: frame_idx,
                path,
            });
        }
        let image = read(&path).map_err(|e| frame_error(modality, frame_idx, e))?;
        if image.dimensions() != expected {
            return Err(InputError::SizeMismatch {
                modality,
                frame: frame_idx,
                expected,
                actual: image.dimensions(),
            });
        }
        Ok(image)
    }

    /// Read the left color image and depth map of any frame into caller-owned buffers.
    ///
    /// The cursor and the input's own buffers are not touched. Caller buffers of a
    /// different size are replaced. Without precomputed depth, the depth map comes
    /// from the current depth provider run over that frame's grayscale pair.
    pub fn frame_images(
        &self,
        frame_idx: usize,
        rgb: &mut RgbImage,
        depth: &mut DepthImage,
    ) -> bool {
        match self.try_frame_images(frame_idx, rgb, depth) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to read images of frame {}: {}", frame_idx, e);
                false
            }
        }
    }

    /// [`frame_images`](Self::frame_images), reporting why a read failed.
    pub fn try_frame_images(
        &self,
        frame_idx: usize,
        rgb: &mut RgbImage,
        depth: &mut DepthImage,
    ) -> Result<(), InputError> {
        let color = self.load(
            Modality::LeftColor,
            frame_idx,
            self.left_color_path(frame_idx)?,
            self.rgb_size(),
            read_color,
        )?;

        let depth_map = match self.depth_path(frame_idx)? {
            Some(path) => self.load(
                Modality::Depth,
                frame_idx,
                path,
                self.depth_size(),
                |p| read_depth_scaled(p, self.layout.float_depth_scale),
            )?,
            None => {
                let provider = self.depth_provider.ok_or(InputError::NoDepthProvider)?;
                let rgb_size = self.rgb_size();
                let left = self.load(
                    Modality::LeftGray,
                    frame_idx,
                    self.left_gray_path(frame_idx)?,
                    rgb_size,
                    read_gray,
                )?;
                let right = self.load(
                    Modality::RightGray,
                    frame_idx,
                    self.right_gray_path(frame_idx)?,
                    rgb_size,
                    read_gray,
                )?;
                let (w, h) = self.depth_size();
                let mut map = DepthImage::new(w, h);
                run_provider(provider, &left, &right, &self.stereo_calibration, &mut map)?;
                map
            }
        };

        overwrite(rgb, color);
        overwrite(depth, depth_map);
        Ok(())
    }

    /// Run the current depth provider over the grayscale buffers into the depth buffer.
    ///
    /// Does nothing when depth is precomputed, since the read already filled it.
    pub fn fill_depth_from_provider(&mut self) -> Result<(), InputError> {
        if self.layout.has_precomputed_depth() {
            return Ok(());
        }
        let provider = self.depth_provider.ok_or(InputError::NoDepthProvider)?;
        let buffers = &mut self.buffers;
        run_provider(
            provider,
            &buffers.left_gray,
            &buffers.right_gray,
            &self.stereo_calibration,
            &mut buffers.depth,
        )
    }

    /// Left color image and depth map of the last frame read.
    pub fn images(&self) -> (&RgbImage, &DepthImage) {
        (&self.buffers.left_color, &self.buffers.depth)
    }

    /// Grayscale stereo pair of the last frame read.
    pub fn stereo_gray(&self) -> (&GrayImage, &GrayImage) {
        (&self.buffers.left_gray, &self.buffers.right_gray)
    }

    /// Color stereo pair of the last frame read.
    pub fn stereo_color(&self) -> (&RgbImage, &RgbImage) {
        (&self.buffers.left_color, &self.buffers.right_color)
    }

    /// Depth buffer, for drivers that compute depth outside of a [`DepthProvider`].
    pub fn depth_mut(&mut self) -> &mut DepthImage {
        &mut self.buffers.depth
    }

    pub fn rgb_size(&self) -> (u32, u32) {
        self.calibration.rgb_size()
    }

    pub fn depth_size(&self) -> (u32, u32) {
        self.calibration.depth_size()
    }

    /// Last component of the dataset root, e.g. `06` for `/data/kitti/sequences/06`.
    pub fn sequence_name(&self) -> &str {
        self.dataset_root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    pub fn dataset_identifier(&self) -> String {
        format!("{}-{}", self.layout.name, self.sequence_name())
    }

    /// Index of the next frame to read. Includes the starting offset.
    pub fn current_frame(&self) -> usize {
        self.frame_idx
    }

    pub fn depth_provider(&self) -> Option<&'p dyn DepthProvider> {
        self.depth_provider
    }

    /// Takes effect on the next call that needs a provider.
    pub fn set_depth_provider(&mut self, depth_provider: Option<&'p dyn DepthProvider>) {
        if let Some(provider) = depth_provider {
            debug!("Depth provider set to {}", provider.name());
        }
        self.depth_provider = depth_provider;
    }

    /// How the values of precomputed depth files are to be read downstream.
    pub fn depth_encoding(&self) -> DepthEncoding {
        self.layout.depth_encoding
    }

    /// Fixed-point multiplier applied to float depth files, 1 when unset.
    pub fn float_depth_scale(&self) -> u16 {
        self.layout.float_depth_scale.unwrap_or(1)
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn calibration(&self) -> &RgbdCalibration {
        &self.calibration
    }

    pub fn stereo_calibration(&self) -> &StereoCalibration {
        &self.stereo_calibration
    }

    pub fn dataset_root(&self) -> &Path {
        &self.dataset_root
    }
}

fn frame_error(modality: Modality, frame: usize, source: FrameError) -> InputError {
    InputError::Frame {
        modality,
        frame,
        source,
    }
}

fn run_provider(
    provider: &dyn DepthProvider,
    left: &GrayImage,
    right: &GrayImage,
    stereo: &StereoCalibration,
    out: &mut DepthImage,
) -> Result<(), InputError> {
    provider
        .compute_depth(left, right, stereo, out)
        .map_err(|source| InputError::DepthProvider {
            name: provider.name().to_string(),
            source,
        })
}

fn commit<P: Pixel>(
    dst: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    modality: Modality,
    frame: usize,
) -> Result<(), InputError> {
    copy_into(dst, src).map_err(|e| frame_error(modality, frame, e))
}

/// Copy in place when the caller's buffer already has the right size, replace it otherwise.
fn overwrite<P: Pixel>(
    dst: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    src: ImageBuffer<P, Vec<P::Subpixel>>,
) {
    if dst.dimensions() == src.dimensions() {
        dst.copy_from_slice(&src);
    } else {
        *dst = src;
    }
}
