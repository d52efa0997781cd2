use crate::io::{FrameReport, TrackReport, VistrackConfig};
use crate::{core, DotTrackError, DotTracker};
use log::{info, warn};
use nalgebra::Point2;
use std::iter;
use vistrack_dot::ScriptedClicks;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the image-sequence helpers.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("config has no image paths")]
    NoImages,
    #[error("config has no seed position")]
    MissingSeed,
    #[error("failed to load {path}")]
    Image {
        path: String,
        #[source]
        source: ::image::ImageError,
    },
    #[error(transparent)]
    Seed(#[from] DotTrackError),
}

/// Convert an `image::GrayImage` into the lightweight `vistrack-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Track the dot in one `image::GrayImage`.
pub fn track_frame(
    tracker: &mut DotTracker,
    img: &::image::GrayImage,
) -> Result<Point2<f64>, DotTrackError> {
    tracker.track(&gray_view(img))
}

/// Seed `tracker` at `[u, v]` in `img`, taking thresholds from that pixel.
pub fn seed_tracker(
    tracker: &mut DotTracker,
    img: &::image::GrayImage,
    [u, v]: [usize; 2],
) -> Result<(), DotTrackError> {
    let mut click = ScriptedClicks(iter::once((v, u)));
    tracker.init_tracking_from_click(&gray_view(img), &mut click)
}

fn load_gray(path: &str) -> Result<::image::GrayImage, TrackError> {
    ::image::open(path)
        .map(|img| img.to_luma8())
        .map_err(|source| TrackError::Image {
            path: path.to_string(),
            source,
        })
}

/// Run the tracker over `cfg.image_paths`, seeded at `cfg.seed` in the first frame.
///
/// A lost dot is recorded in the report and tracking continues from the last
/// good centre on the next frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(cfg), fields(frames = cfg.image_paths.len()))
)]
pub fn track_image_sequence(cfg: &VistrackConfig) -> Result<TrackReport, TrackError> {
    let first = cfg.image_paths.first().ok_or(TrackError::NoImages)?;
    let seed = cfg.seed.ok_or(TrackError::MissingSeed)?;

    let mut tracker = DotTracker::new(cfg.dot.clone());
    seed_tracker(&mut tracker, &load_gray(first)?, seed)?;

    let mut report = TrackReport::default();
    for (frame, path) in cfg.image_paths.iter().enumerate() {
        let img = load_gray(path)?;
        let result = track_frame(&mut tracker, &img);
        if let Err(err) = &result {
            warn!("frame {frame} ({path}): {err}");
        }
        report
            .frames
            .push(FrameReport::new(frame, Some(path.clone()), &tracker, &result));
    }
    info!(
        "tracked {} frames, dot lost in {}",
        report.frames.len(),
        report.lost_frames()
    );
    Ok(report)
}
