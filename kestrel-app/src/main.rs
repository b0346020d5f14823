//! Kestrel
//!
//! Replays a recorded stereo sequence through the input layer the way a dense
//! SLAM pipeline would, and reports what could be read.

mod app;
mod config;
mod errors;

use clap::Parser;
use std::path::PathBuf;

use crate::app::LoggingConfig;
use crate::config::RunConfig;
use crate::errors::AppError;

/// Kestrel - stereo dataset replay
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset root (overrides the config)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Layout preset (overrides the config)
    #[arg(short, long)]
    preset: Option<String>,

    /// First frame to read (overrides the config)
    #[arg(long)]
    offset: Option<usize>,

    /// Stop after this many frames (overrides the config)
    #[arg(long)]
    max_frames: Option<usize>,

    /// Exit with an error when a frame fails to read
    #[arg(long)]
    fail_on_error: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Only check the configuration and the first frame's files
    #[arg(long)]
    validate_only: bool,
}

impl Args {
    fn run_config(&self) -> Result<RunConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(dataset) = &self.dataset {
            config.dataset = Some(dataset.clone());
        }
        if let Some(preset) = &self.preset {
            config.preset = preset.clone();
            config.layout = None;
        }
        if let Some(offset) = self.offset {
            config.frame_offset = offset;
        }
        if let Some(max_frames) = self.max_frames {
            config.max_frames = Some(max_frames);
        }
        if self.fail_on_error {
            config.fail_on_error = true;
        }
        Ok(config)
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let config = args.run_config()?;
    if args.validate_only {
        return app::validate(&config);
    }
    let summary = app::replay(&config)?;
    if summary.stopped_on_error {
        tracing::warn!(
            "Replay of {} ended early at frame {}",
            summary.dataset_identifier,
            summary.next_frame
        );
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    LoggingConfig {
        level: args.log_level.clone(),
    }
    .init();

    if let Err(e) = run(&args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "kestrel",
            "--dataset",
            "/data/kitti/06",
            "--preset",
            "kitti-odometry-dispnet",
            "--offset",
            "12",
            "--max-frames",
            "100",
            "--fail-on-error",
        ]);
        let config = args.run_config().unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("/data/kitti/06")));
        assert_eq!(config.preset, "kitti-odometry-dispnet");
        assert_eq!(config.frame_offset, 12);
        assert_eq!(config.max_frames, Some(100));
        assert!(config.fail_on_error);
        assert!(!args.validate_only);
    }

    #[test]
    fn test_preset_flag_drops_inline_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let config = RunConfig {
            layout: Some(kestrel_data::DatasetLayout::kitti_odometry_dispnet()),
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let args = Args::parse_from([
            "kestrel",
            "--config",
            path.to_str().unwrap(),
            "--preset",
            "kitti-odometry",
        ]);
        let config = args.run_config().unwrap();
        assert!(config.layout.is_none());
        assert_eq!(
            config.resolve_layout().unwrap(),
            kestrel_data::DatasetLayout::kitti_odometry()
        );
    }
}
