//! Core types shared by the vistrack trackers.
//!
//! This crate is intentionally small. It provides a borrowed/owned grayscale
//! image pair, the `PixelSource` read interface used by the dot tracker, and
//! the logging setup used by the demo programs.

mod image;
mod logger;

pub use image::{GrayImage, GrayImageView, PixelSource};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, LOG_ENV};
