//! Sequence replay example
//!
//! Walks a KITTI odometry sequence with precomputed depth, the way a fusion
//! pipeline consumes it, then reads the first frame again through the
//! random-access path.
//!
//! Usage:
//!   cargo run --example replay_sequence -- <path_to_sequence> [dispnet]

use std::error::Error;
use std::path::PathBuf;

use kestrel::data::{DepthImage, Intrinsics, RgbImage};
use kestrel::{DatasetLayout, Input, RgbdCalibration, StereoCalibration};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let root = args
        .next()
        .map(PathBuf::from)
        .ok_or("Please provide a sequence path")?;
    let layout = match args.next().as_deref() {
        Some("dispnet") => DatasetLayout::kitti_odometry_dispnet(),
        _ => DatasetLayout::kitti_odometry(),
    };

    let intrinsics = Intrinsics::new(718.856, 718.856, 607.1928, 185.2157, 1241, 376);
    let calibration = RgbdCalibration::shared(intrinsics);
    let stereo = StereoCalibration::new(0.5372, intrinsics.fx);

    let mut input = Input::new(&root, layout, None, calibration, stereo, 0);
    info!("Replaying {}", input.dataset_identifier());

    while input.has_more_images() {
        if !input.read_next_frame() {
            warn!("Stopping at frame {}", input.current_frame());
            break;
        }
        let (rgb, depth) = input.images();
        let valid: Vec<i16> = depth.iter().copied().filter(|&d| d > 0).collect();
        let mean = if valid.is_empty() {
            0.0
        } else {
            valid.iter().map(|&d| d as f64).sum::<f64>() / valid.len() as f64
        };
        info!(
            "Frame {}: {}x{} color, {} depth samples, mean raw value {:.1}",
            input.current_frame() - 1,
            rgb.width(),
            rgb.height(),
            valid.len(),
            mean
        );
    }

    let mut rgb = RgbImage::new(1, 1);
    let mut depth = DepthImage::new(1, 1);
    if input.frame_images(0, &mut rgb, &mut depth) {
        info!(
            "Frame 0 again: {:?} color, {:?} depth, cursor still at {}",
            rgb.dimensions(),
            depth.dimensions(),
            input.current_frame()
        );
    }

    Ok(())
}
