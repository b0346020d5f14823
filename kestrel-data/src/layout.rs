//! Dataset layout descriptors.
//!
//! A [`DatasetLayout`] names the per-modality folders and filename patterns of one
//! on-disk dataset convention. Presets only fill in fields; nothing here touches
//! the filesystem and construction never validates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::{PatternError, check_pattern};

/// How the values stored in a precomputed depth file should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthEncoding {
    /// Metric depth.
    #[default]
    Metric,
    /// Disparity expressed in pixels.
    Disparity,
}

/// Where ground truth odometry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OdometryFormat {
    /// A single file with one pose per frame (kitti-odometry style).
    #[default]
    PoseFile,
    /// A folder of OxTS GPS/IMU dumps (raw KITTI style).
    OxtsDump,
}

/// An optional per-frame stream: a folder plus its own filename pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameStream {
    pub folder: String,
    pub pattern: String,
}

impl FrameStream {
    pub fn new(folder: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            pattern: pattern.into(),
        }
    }
}

/// Describes one dataset convention.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Convention name, used as the prefix of dataset identifiers.
    pub name: String,
    pub left_gray_folder: String,
    pub right_gray_folder: String,
    pub left_color_folder: String,
    pub right_color_folder: String,
    /// Filename pattern shared by the four camera folders.
    pub frame_pattern: String,
    /// Calibration file, relative to the dataset root.
    #[serde(default)]
    pub calibration_file: String,

    /// Precomputed depth. `None` means depth has to be computed from the stereo pair.
    #[serde(default)]
    pub depth: Option<FrameStream>,
    #[serde(default)]
    pub depth_encoding: DepthEncoding,
    /// Fixed-point multiplier for float depth files. `None` keeps whole units.
    #[serde(default)]
    pub float_depth_scale: Option<u16>,

    /// Precomputed segmentation results. Entries are named after the left color frames.
    #[serde(default)]
    pub segmentation_folder: Option<String>,

    #[serde(default)]
    pub odometry_format: OdometryFormat,
    /// Ground truth odometry file (or OxTS folder), relative to the dataset root.
    #[serde(default)]
    pub odometry_file: Option<String>,

    /// Velodyne scans, only consumed by evaluation.
    #[serde(default)]
    pub velodyne: Option<FrameStream>,
}

/// Problems reported by [`DatasetLayout::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Layout field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("Layout field '{0}' must not be zero")]
    ZeroScale(&'static str),

    #[error("Layout field '{field}' has a bad pattern: {source}")]
    BadPattern {
        field: &'static str,
        #[source]
        source: PatternError,
    },
}

impl DatasetLayout {
    /// Name of the [`kitti_odometry`](Self::kitti_odometry) preset.
    pub const KITTI_ODOMETRY: &'static str = "kitti-odometry";
    /// Name of the [`kitti_odometry_dispnet`](Self::kitti_odometry_dispnet) preset.
    pub const KITTI_ODOMETRY_DISPNET: &'static str = "kitti-odometry-dispnet";

    /// The KITTI odometry benchmark: four cameras, ELAS depth precomputed as 16-bit PGM.
    pub fn kitti_odometry() -> Self {
        Self {
            name: Self::KITTI_ODOMETRY.to_string(),
            left_gray_folder: "image_0".to_string(),
            right_gray_folder: "image_1".to_string(),
            left_color_folder: "image_2".to_string(),
            right_color_folder: "image_3".to_string(),
            frame_pattern: "%06d.png".to_string(),
            calibration_file: "itm-calib.txt".to_string(),

            depth: Some(FrameStream::new("precomputed-depth/Frames", "%04d.pgm")),
            depth_encoding: DepthEncoding::Metric,
            float_depth_scale: None,

            segmentation_folder: Some("seg_image_2/mnc".to_string()),

            odometry_format: OdometryFormat::PoseFile,
            odometry_file: Some("ground-truth-poses.txt".to_string()),

            velodyne: Some(FrameStream::new("velodyne", "%06d.bin")),
        }
    }

    /// Same as [`kitti_odometry`](Self::kitti_odometry), but reads DispNet disparity maps.
    ///
    /// The dataset name is kept so identifiers stay comparable across depth sources.
    pub fn kitti_odometry_dispnet() -> Self {
        Self {
            depth: Some(FrameStream::new("precomputed-depth-dispnet", "%06d.pfm")),
            depth_encoding: DepthEncoding::Disparity,
            ..Self::kitti_odometry()
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            Self::KITTI_ODOMETRY => Some(Self::kitti_odometry()),
            Self::KITTI_ODOMETRY_DISPNET => Some(Self::kitti_odometry_dispnet()),
            _ => None,
        }
    }

    /// Names accepted by [`preset`](Self::preset).
    pub fn preset_names() -> &'static [&'static str] {
        &[Self::KITTI_ODOMETRY, Self::KITTI_ODOMETRY_DISPNET]
    }

    /// Whether depth is loaded from disk rather than computed.
    pub fn has_precomputed_depth(&self) -> bool {
        self.depth.is_some()
    }

    /// Opt-in check for mistakes that would otherwise only show up as failed reads.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let required = [
            ("left_gray_folder", &self.left_gray_folder),
            ("right_gray_folder", &self.right_gray_folder),
            ("left_color_folder", &self.left_color_folder),
            ("right_color_folder", &self.right_color_folder),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(LayoutError::EmptyField(field));
            }
        }

        check_pattern(&self.frame_pattern).map_err(|source| LayoutError::BadPattern {
            field: "frame_pattern",
            source,
        })?;

        validate_stream(self.depth.as_ref(), "depth.folder", "depth.pattern")?;
        validate_stream(self.velodyne.as_ref(), "velodyne.folder", "velodyne.pattern")?;

        if self.float_depth_scale == Some(0) {
            return Err(LayoutError::ZeroScale("float_depth_scale"));
        }

        if matches!(&self.segmentation_folder, Some(folder) if folder.is_empty()) {
            return Err(LayoutError::EmptyField("segmentation_folder"));
        }
        if matches!(&self.odometry_file, Some(file) if file.is_empty()) {
            return Err(LayoutError::EmptyField("odometry_file"));
        }

        Ok(())
    }
}

fn validate_stream(
    stream: Option<&FrameStream>,
    folder_field: &'static str,
    pattern_field: &'static str,
) -> Result<(), LayoutError> {
    let Some(stream) = stream else {
        return Ok(());
    };
    if stream.folder.is_empty() {
        return Err(LayoutError::EmptyField(folder_field));
    }
    check_pattern(&stream.pattern).map_err(|source| LayoutError::BadPattern {
        field: pattern_field,
        source,
    })
}
