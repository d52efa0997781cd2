//! Bright dot tracking by region growing.
//!
//! The tracker follows one bright, roughly convex spot across a sequence of
//! grayscale frames:
//! - the intensity threshold is re-derived every frame from the pixel under
//!   the last known centre (80 % of it, floored at 60 %),
//! - the dot is the 4-connected set of pixels at or above that threshold,
//! - its centre is the arithmetic mean of the member coordinates,
//! - a seed that falls off the dot is recovered by a 9-offset spiral search.
//!
//! Coordinates follow the image convention used across the workspace:
//! `u`/`x` is the column, `v`/`y` is the row.

mod display;
mod error;
mod moments;
mod params;
mod region;
mod tracker;

pub use display::{ClickSource, DisplaySink, PlotColor, ScriptedClicks};
pub use error::DotTrackError;
pub use moments::DotMoments;
pub use params::DotParams;
pub use tracker::DotTracker;
