//! Run configuration, loaded from JSON and overridden from the command line.

use std::path::{Path, PathBuf};

use kestrel_data::{DatasetLayout, Intrinsics, RgbdCalibration, StereoCalibration};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;

/// Everything needed to build an input over one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Dataset root, e.g. `/data/kitti/sequences/06`.
    pub dataset: Option<PathBuf>,
    /// Name of a built-in layout. Ignored when `layout` is set.
    pub preset: String,
    /// Inline layout for conventions without a preset.
    pub layout: Option<DatasetLayout>,
    pub calibration: RgbdCalibration,
    pub stereo: StereoCalibration,
    pub frame_offset: usize,
    /// Stop after this many frames.
    pub max_frames: Option<usize>,
    /// Treat a failed read as a replay error instead of the end of the run.
    pub fail_on_error: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        // KITTI odometry sequences 00-02, rectified grayscale cameras.
        let intrinsics = Intrinsics::new(718.856, 718.856, 607.1928, 185.2157, 1241, 376);
        Self {
            dataset: None,
            preset: DatasetLayout::KITTI_ODOMETRY.to_string(),
            layout: None,
            calibration: RgbdCalibration::shared(intrinsics),
            stereo: StereoCalibration::new(0.5372, 718.856),
            frame_offset: 0,
            max_frames: None,
            fail_on_error: false,
        }
    }
}

impl RunConfig {
    /// Load a config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        debug!("Loading run config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The inline layout if there is one, the named preset otherwise.
    pub fn resolve_layout(&self) -> Result<DatasetLayout, AppError> {
        if let Some(layout) = &self.layout {
            return Ok(layout.clone());
        }
        DatasetLayout::preset(&self.preset).ok_or_else(|| {
            AppError::UnknownPreset(
                self.preset.clone(),
                DatasetLayout::preset_names().join(", "),
            )
        })
    }

    pub fn dataset_root(&self) -> Result<&Path, AppError> {
        let root = self.dataset.as_deref().ok_or(AppError::MissingDataset)?;
        if !root.is_dir() {
            return Err(AppError::DatasetNotFound(root.to_path_buf()));
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_data::DepthEncoding;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.calibration.rgb_size(), (1241, 376));
        assert_eq!(config.calibration.depth_size(), (1241, 376));
        assert_eq!(config.resolve_layout().unwrap(), DatasetLayout::kitti_odometry());
        assert!(matches!(config.dataset_root(), Err(AppError::MissingDataset)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{ "dataset": "/data/kitti/06", "preset": "kitti-odometry-dispnet", "frame_offset": 10 }"#,
        )
        .unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("/data/kitti/06")));
        assert_eq!(config.frame_offset, 10);
        assert_eq!(config.max_frames, None);
        assert!(!config.fail_on_error);
        assert_eq!(config.stereo, RunConfig::default().stereo);
        let layout = config.resolve_layout().unwrap();
        assert_eq!(layout.depth_encoding, DepthEncoding::Disparity);
    }

    #[test]
    fn test_inline_layout_wins() {
        let config: RunConfig = serde_json::from_str(
            r#"{
                "preset": "does-not-exist",
                "layout": {
                    "name": "stereo-rig",
                    "left_gray_folder": "cam0",
                    "right_gray_folder": "cam1",
                    "left_color_folder": "cam0_rgb",
                    "right_color_folder": "cam1_rgb",
                    "frame_pattern": "%05d.png",
                    "depth": { "folder": "disp", "pattern": "%05d.pfm" },
                    "depth_encoding": "disparity"
                },
                "calibration": {
                    "rgb": { "fx": 500.0, "fy": 500.0, "cx": 320.0, "cy": 240.0, "width": 640, "height": 480 },
                    "depth": { "fx": 500.0, "fy": 500.0, "cx": 320.0, "cy": 240.0, "width": 640, "height": 480 }
                }
            }"#,
        )
        .unwrap();
        let layout = config.resolve_layout().unwrap();
        assert_eq!(layout.name, "stereo-rig");
        assert_eq!(layout.depth.unwrap().pattern, "%05d.pfm");
        assert_eq!(config.calibration.rgb_size(), (640, 480));
    }

    #[test]
    fn test_unknown_preset() {
        let config = RunConfig {
            preset: "tum-rgbd".to_string(),
            ..Default::default()
        };
        let err = config.resolve_layout().unwrap_err();
        assert!(err.to_string().contains("kitti-odometry-dispnet"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(RunConfig::load(&missing), Err(AppError::ConfigRead { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(RunConfig::load(&broken), Err(AppError::ConfigParse { .. })));

        let good = dir.path().join("run.json");
        std::fs::write(&good, r#"{ "max_frames": 5 }"#).unwrap();
        assert_eq!(RunConfig::load(&good).unwrap().max_frames, Some(5));
    }

    #[test]
    fn test_dataset_must_exist() {
        let config = RunConfig {
            dataset: Some(PathBuf::from("/definitely/not/here")),
            ..Default::default()
        };
        assert!(matches!(config.dataset_root(), Err(AppError::DatasetNotFound(_))));
    }
}
