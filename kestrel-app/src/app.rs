//! Replay driver: polls the input the way a SLAM pipeline does.

use std::time::Instant;

use kestrel_data::DepthEncoding;
use kestrel_input::Input;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::errors::AppError;

/// Logging configuration.
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
    pub fn init(&self) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.level)),
            )
            .init();
    }
}

/// What a replay went through.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub dataset_identifier: String,
    pub first_frame: usize,
    pub frames_read: usize,
    /// Cursor position after the last successful read.
    pub next_frame: usize,
    /// Depth pixels with a positive value, summed over all frames.
    pub valid_depth_pixels: u64,
    /// Whether the replay stopped on a failed read rather than the end of the data.
    pub stopped_on_error: bool,
}

/// Check the configuration without reading any frame.
pub fn validate(config: &RunConfig) -> Result<(), AppError> {
    let layout = config.resolve_layout()?;
    layout.validate()?;
    let root = config.dataset_root()?;
    let input = Input::new(
        root,
        layout,
        None,
        config.calibration,
        config.stereo,
        config.frame_offset,
    );
    if !input.has_more_images() {
        warn!(
            "No readable frame at index {} in {}",
            config.frame_offset,
            root.display()
        );
    }
    info!("Configuration for {} is valid", input.dataset_identifier());
    Ok(())
}

/// Read frames sequentially until the data runs out, a read fails or `max_frames` is hit.
///
/// A failed read ends the run normally unless `fail_on_error` is set, in which
/// case it is returned as [`AppError::Input`].
pub fn replay(config: &RunConfig) -> Result<ReplaySummary, AppError> {
    let layout = config.resolve_layout()?;
    let root = config.dataset_root()?;
    let mut input = Input::new(
        root,
        layout,
        None,
        config.calibration,
        config.stereo,
        config.frame_offset,
    );

    if !input.layout().has_precomputed_depth() {
        info!("No precomputed depth configured; depth is left to an external provider");
    } else if input.depth_encoding() == DepthEncoding::Disparity {
        info!("Depth files hold disparities in pixels");
    }

    let mut summary = ReplaySummary {
        dataset_identifier: input.dataset_identifier(),
        first_frame: input.current_frame(),
        frames_read: 0,
        next_frame: input.current_frame(),
        valid_depth_pixels: 0,
        stopped_on_error: false,
    };

    let start = Instant::now();
    while input.has_more_images() {
        if config.max_frames.is_some_and(|max| summary.frames_read >= max) {
            break;
        }
        if let Err(e) = input.try_read_next_frame() {
            if config.fail_on_error {
                return Err(e.into());
            }
            warn!("Stopping at frame {}: {}", input.current_frame(), e);
            summary.stopped_on_error = true;
            break;
        }

        let (_, depth) = input.images();
        let valid = depth.iter().filter(|&&d| d > 0).count() as u64;
        summary.valid_depth_pixels += valid;
        summary.frames_read += 1;
        debug!(
            "Frame {}: {} valid depth pixels",
            input.current_frame() - 1,
            valid
        );
    }
    summary.next_frame = input.current_frame();

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "Read {} frames of {} in {:.2}s ({:.1} fps)",
        summary.frames_read,
        summary.dataset_identifier,
        elapsed,
        if elapsed > 0.0 {
            summary.frames_read as f64 / elapsed
        } else {
            0.0
        }
    );

    Ok(summary)
}
