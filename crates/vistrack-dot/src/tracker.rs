use crate::display::{ClickSource, DisplaySink, NoDisplay};
use crate::region::{RegionAccumulator, RegionGrower, Seed};
use crate::{DotMoments, DotParams, DotTrackError};
use log::{debug, warn};
use nalgebra::Point2;
use vistrack_core::PixelSource;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Stateful tracker for one bright dot.
///
/// Create it, seed it with [`DotTracker::init_tracking`] or
/// [`DotTracker::init_tracking_from_click`], then call [`DotTracker::track`]
/// once per frame.
#[derive(Debug)]
pub struct DotTracker {
    params: DotParams,
    centroid: Point2<f64>,
    rounded: (usize, usize),
    threshold: u8,
    min_threshold: u8,
    moments: Option<DotMoments>,
    region: Vec<(usize, usize)>,
    grower: RegionGrower,
    acc: RegionAccumulator,
}

impl DotTracker {
    pub fn new(params: DotParams) -> Self {
        Self {
            threshold: params.threshold,
            min_threshold: params.min_threshold,
            params,
            centroid: Point2::origin(),
            rounded: (0, 0),
            moments: None,
            region: Vec::new(),
            grower: RegionGrower::default(),
            acc: RegionAccumulator::default(),
        }
    }

    /// Tracker already seeded at column `u`, row `v`.
    pub fn at(params: DotParams, u: f64, v: f64) -> Self {
        let mut tracker = Self::new(params);
        tracker.set_centroid(Point2::new(u, v));
        tracker
    }

    #[inline]
    pub fn params(&self) -> &DotParams {
        &self.params
    }

    /// Sub-pixel centre `(u, v)` = (column, row).
    #[inline]
    pub fn centroid(&self) -> Point2<f64> {
        self.centroid
    }

    /// Centre rounded half-up, as `(u, v)`.
    #[inline]
    pub fn rounded_centroid(&self) -> (usize, usize) {
        self.rounded
    }

    #[inline]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    #[inline]
    pub fn min_threshold(&self) -> u8 {
        self.min_threshold
    }

    /// Moments of the region accepted by the latest scan.
    ///
    /// `None` when moment computation is off or the latest scan failed.
    pub fn moments(&self) -> Option<&DotMoments> {
        self.moments
            .as_ref()
            .filter(|_| self.params.compute_moments)
    }

    /// Pixels `(u, v)` of the last accepted region.
    pub fn region(&self) -> &[(usize, usize)] {
        &self.region
    }

    pub fn set_max_region_size(&mut self, max_region_size: usize) {
        self.params.max_region_size = max_region_size;
    }

    pub fn set_compute_moments(&mut self, enabled: bool) {
        self.params.compute_moments = enabled;
    }

    pub fn set_graphics(&mut self, enabled: bool) {
        self.params.graphics = enabled;
    }

    /// Override the thresholds, e.g. for unattended start with [`DotTracker::init_tracking`].
    pub fn set_thresholds(&mut self, threshold: u8, min_threshold: u8) {
        self.threshold = threshold.max(min_threshold);
        self.min_threshold = min_threshold;
    }

    /// Same rounded position as `other`.
    pub fn same_position(&self, other: &DotTracker) -> bool {
        self.rounded == other.rounded
    }

    /// Seed from a user click: thresholds come from the clicked pixel.
    ///
    /// No region is grown yet; the first [`DotTracker::track`] does that.
    pub fn init_tracking_from_click<P, C>(
        &mut self,
        image: &P,
        clicks: &mut C,
    ) -> Result<(), DotTrackError>
    where
        P: PixelSource + ?Sized,
        C: ClickSource + ?Sized,
    {
        let (row, col) = clicks.wait_for_click().ok_or(DotTrackError::NoClick)?;
        if !image.contains(col as i64, row as i64) {
            return Err(DotTrackError::SeedOutOfImage {
                x: col as i64,
                y: row as i64,
            });
        }
        self.adapt_thresholds(image.pixel(col, row));
        self.set_centroid(Point2::new(col as f64, row as f64));
        debug!(
            "dot seeded by click at ({col}, {row}), threshold {} (min {})",
            self.threshold, self.min_threshold
        );
        Ok(())
    }

    /// Seed at column `u`, row `v`, keeping the current thresholds.
    pub fn init_tracking(&mut self, u: usize, v: usize) {
        self.set_centroid(Point2::new(u as f64, v as f64));
    }

    /// Track the dot in a new frame and return its new centre.
    pub fn track<P: PixelSource + ?Sized>(
        &mut self,
        image: &P,
    ) -> Result<Point2<f64>, DotTrackError> {
        self.track_impl(image, None)
    }

    /// Like [`DotTracker::track`], plotting accepted pixels when graphics are enabled.
    pub fn track_with_display<P: PixelSource + ?Sized>(
        &mut self,
        image: &P,
        display: &mut dyn DisplaySink,
    ) -> Result<Point2<f64>, DotTrackError> {
        self.track_impl(image, Some(display))
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image, display), fields(width = image.width(), height = image.height()))
    )]
    fn track_impl<P: PixelSource + ?Sized>(
        &mut self,
        image: &P,
        display: Option<&mut dyn DisplaySink>,
    ) -> Result<Point2<f64>, DotTrackError> {
        let (u, v) = self.rounded;
        if !image.contains(u as i64, v as i64) {
            self.moments = None;
            return Err(DotTrackError::SeedOutOfImage {
                x: u as i64,
                y: v as i64,
            });
        }
        self.adapt_thresholds(image.pixel(u, v));

        let centroid = self
            .centroid_from(image, self.centroid, display)
            .inspect_err(|err| warn!("{err}"))?;
        self.set_centroid(centroid);
        debug!(
            "dot at ({:.2}, {:.2}), {} px, threshold {}",
            centroid.x,
            centroid.y,
            self.region.len(),
            self.threshold
        );
        Ok(centroid)
    }

    /// Centre of the region reached from `start` with the current threshold.
    ///
    /// Updates moments and region on success but not the tracked centre.
    pub fn compute_centroid<P: PixelSource + ?Sized>(
        &mut self,
        image: &P,
        start: Point2<f64>,
    ) -> Result<Point2<f64>, DotTrackError> {
        self.centroid_from(image, start, None)
    }

    fn centroid_from<P: PixelSource + ?Sized>(
        &mut self,
        image: &P,
        start: Point2<f64>,
        display: Option<&mut dyn DisplaySink>,
    ) -> Result<Point2<f64>, DotTrackError> {
        let limit = self.params.max_region_size;
        let seed = (start.x as i64, start.y as i64);
        let mut hidden = NoDisplay;
        let sink: &mut dyn DisplaySink = match display {
            Some(display) if self.params.graphics => display,
            _ => &mut hidden,
        };

        self.moments = None;
        self.acc.reset(self.params.compute_moments);
        let mut found =
            self.grower
                .grow(image, seed, self.threshold, limit, &mut self.acc, sink)
                == Seed::In;

        if !found {
            'spiral: for pas in self.params.search_radius_min..=self.params.search_radius_max {
                let pas = pas as i64;
                for k in -1..=1 {
                    for l in -1..=1 {
                        self.acc.reset(self.params.compute_moments);
                        let candidate = (seed.0 + k * pas, seed.1 + l * pas);
                        if self
                            .grower
                            .grow(image, candidate, self.threshold, limit, &mut self.acc, sink)
                            == Seed::In
                        {
                            debug!("dot recovered at offset ({}, {})", k * pas, l * pas);
                            found = true;
                            break 'spiral;
                        }
                    }
                }
            }
        }

        self.grower.release(&self.acc.pixels);
        if !found {
            return Err(DotTrackError::NotFound {
                threshold: self.threshold,
            });
        }

        let count = self.acc.count();
        if self.acc.overflow || count > limit {
            return Err(DotTrackError::TooLarge {
                pixels: count,
                max: limit,
            });
        }
        if count < self.params.min_region_size {
            return Err(DotTrackError::TooSmall {
                pixels: count,
                min: self.params.min_region_size,
            });
        }

        let n = count as f64;
        let centroid = Point2::new(self.acc.sum_u / n, self.acc.sum_v / n);
        self.region.clear();
        self.region.extend_from_slice(&self.acc.pixels);
        self.moments = self.acc.moments;
        Ok(centroid)
    }

    fn adapt_thresholds(&mut self, seed: u8) {
        let (threshold, min_threshold) = self.params.thresholds_for(seed);
        self.threshold = threshold;
        self.min_threshold = min_threshold;
    }

    fn set_centroid(&mut self, centroid: Point2<f64>) {
        self.centroid = centroid;
        self.rounded = (round_half_up(centroid.x), round_half_up(centroid.y));
    }
}

/// Round non-negative coordinates half-up; negatives clamp to 0.
#[inline]
fn round_half_up(x: f64) -> usize {
    (x + 0.5).floor().max(0.0) as usize
}
