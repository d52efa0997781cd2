//! Facade crate for the `vistrack-*` workspace.
//!
//! This crate provides:
//! - re-exports of the dot tracker and the LD-MRS scanner client
//! - JSON configuration and tracking reports ([`io`])
//! - (feature `image`) helpers that run the tracker over `image::GrayImage`
//!   frames loaded from disk.
//!
//! ## Quickstart
//!
//! ```no_run
//! use vistrack::dot::{DotParams, DotTracker};
//! use vistrack::track::gray_view;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("frame_000.png")?.to_luma8();
//! let mut tracker = DotTracker::at(DotParams::default(), 320.0, 240.0);
//! let centre = tracker.track(&gray_view(&img))?;
//! println!("dot at {centre}");
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `vistrack::core`: grayscale images, `PixelSource`, logging setup.
//! - `vistrack::dot`: region-growing dot tracker.
//! - `vistrack::ldmrs`: LD-MRS TCP client and wire format.
//! - `vistrack::track` (feature `image`): tracking over image files.

pub use vistrack_core as core;
pub use vistrack_dot as dot;
pub use vistrack_ldmrs as ldmrs;

pub use vistrack_dot::{DotParams, DotTrackError, DotTracker};
pub use vistrack_ldmrs::{LaserScan, ScanPoint, ScannerConfig, ScannerDecoder, ScannerError};

pub mod io;

#[cfg(feature = "image")]
pub mod track;
