//! Threshold-driven 4-connected region growing.

use crate::display::{DisplaySink, PlotColor};
use crate::moments::DotMoments;
use vistrack_core::PixelSource;

/// Whether the seed pixel itself passed the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Seed {
    In,
    Out,
}

/// Running sums over the accepted pixels of one region scan.
#[derive(Debug, Default)]
pub(crate) struct RegionAccumulator {
    pub sum_u: f64,
    pub sum_v: f64,
    /// Accepted pixels `(u, v)` in visit order.
    pub pixels: Vec<(usize, usize)>,
    pub moments: Option<DotMoments>,
    /// Growth stopped because the region passed the size limit.
    pub overflow: bool,
}

impl RegionAccumulator {
    pub fn reset(&mut self, with_moments: bool) {
        self.sum_u = 0.0;
        self.sum_v = 0.0;
        self.pixels.clear();
        self.moments = with_moments.then(DotMoments::default);
        self.overflow = false;
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    fn accept(&mut self, u: usize, v: usize) {
        self.sum_u += u as f64;
        self.sum_v += v as f64;
        self.pixels.push((u, v));
        if let Some(m) = self.moments.as_mut() {
            m.accumulate(u, v);
        }
    }
}

/// Flood fill with an explicit stack and a reusable visited bitmap.
///
/// The bitmap replaces zeroing pixels in the caller's image: the image is
/// only read, and marks are cleared again by [`RegionGrower::release`].
#[derive(Debug, Default)]
pub(crate) struct RegionGrower {
    width: usize,
    height: usize,
    visited: Vec<bool>,
    stack: Vec<(usize, usize)>,
}

impl RegionGrower {
    fn fit<P: PixelSource + ?Sized>(&mut self, image: &P) {
        if self.width != image.width() || self.height != image.height() {
            self.width = image.width();
            self.height = image.height();
            self.visited.clear();
            self.visited.resize(self.width * self.height, false);
        }
    }

    /// Grow the region containing `(u, v)` into `acc`.
    ///
    /// At most `limit + 1` pixels are accepted; reaching that sets
    /// `acc.overflow` and abandons the rest of the region.
    pub fn grow<P: PixelSource + ?Sized>(
        &mut self,
        image: &P,
        (u, v): (i64, i64),
        threshold: u8,
        limit: usize,
        acc: &mut RegionAccumulator,
        display: &mut dyn DisplaySink,
    ) -> Seed {
        self.fit(image);
        if !image.contains(u, v) {
            return Seed::Out;
        }
        let (u, v) = (u as usize, v as usize);
        if image.pixel(u, v) < threshold || self.visited[v * self.width + u] {
            return Seed::Out;
        }

        self.stack.clear();
        self.stack.push((u, v));
        while let Some((u, v)) = self.stack.pop() {
            let idx = v * self.width + u;
            if self.visited[idx] {
                continue;
            }
            self.visited[idx] = true;
            acc.accept(u, v);
            display.plot_point(v, u, PlotColor::Green);
            if acc.count() > limit {
                acc.overflow = true;
                break;
            }

            // Pushed in reverse so that left is expanded first, then right, up, down.
            if v + 1 < self.height {
                self.push_if_inside_region(image, u, v + 1, threshold);
            }
            if v > 0 {
                self.push_if_inside_region(image, u, v - 1, threshold);
            }
            if u + 1 < self.width {
                self.push_if_inside_region(image, u + 1, v, threshold);
            }
            if u > 0 {
                self.push_if_inside_region(image, u - 1, v, threshold);
            }
        }
        self.stack.clear();
        Seed::In
    }

    #[inline]
    fn push_if_inside_region<P: PixelSource + ?Sized>(
        &mut self,
        image: &P,
        u: usize,
        v: usize,
        threshold: u8,
    ) {
        if !self.visited[v * self.width + u] && image.pixel(u, v) >= threshold {
            self.stack.push((u, v));
        }
    }

    /// Clear the visited marks of `pixels`.
    pub fn release(&mut self, pixels: &[(usize, usize)]) {
        for &(u, v) in pixels {
            self.visited[v * self.width + u] = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NoDisplay;
    use vistrack_core::GrayImage;

    fn grow(
        grower: &mut RegionGrower,
        img: &GrayImage,
        seed: (i64, i64),
        threshold: u8,
        limit: usize,
    ) -> (Seed, RegionAccumulator) {
        let mut acc = RegionAccumulator::default();
        acc.reset(true);
        let seed = grower.grow(img, seed, threshold, limit, &mut acc, &mut NoDisplay);
        grower.release(&acc.pixels);
        (seed, acc)
    }

    #[test]
    fn diagonal_neighbours_are_not_connected() {
        let mut img = GrayImage::filled(5, 5, 0);
        img.set(1, 1, 255);
        img.set(2, 2, 255);
        img.set(2, 1, 255);
        img.set(4, 4, 255);
        img.set(3, 3, 255);

        let mut grower = RegionGrower::default();
        let (seed, acc) = grow(&mut grower, &img, (1, 1), 128, 100);
        assert_eq!(seed, Seed::In);
        let mut pixels = acc.pixels.clone();
        pixels.sort_unstable();
        assert_eq!(pixels, vec![(1, 1), (2, 1), (2, 2)]);
        assert_eq!(acc.moments.expect("moments").m00, 3.0);
    }

    #[test]
    fn seed_below_threshold_or_outside_is_out() {
        let img = GrayImage::filled(4, 4, 100);
        let mut grower = RegionGrower::default();
        assert_eq!(grow(&mut grower, &img, (1, 1), 101, 100).0, Seed::Out);
        assert_eq!(grow(&mut grower, &img, (-1, 1), 50, 100).0, Seed::Out);
        assert_eq!(grow(&mut grower, &img, (1, 4), 50, 100).0, Seed::Out);
    }

    #[test]
    fn growth_stops_after_limit() {
        let img = GrayImage::filled(10, 10, 255);
        let mut grower = RegionGrower::default();
        let (seed, acc) = grow(&mut grower, &img, (5, 5), 1, 20);
        assert_eq!(seed, Seed::In);
        assert!(acc.overflow);
        assert_eq!(acc.count(), 21);
    }

    #[test]
    fn release_allows_the_same_region_to_grow_again() {
        let mut img = GrayImage::filled(8, 8, 0);
        img.fill_rect(2, 2, 3, 3, 200);
        let mut grower = RegionGrower::default();
        let (_, first) = grow(&mut grower, &img, (3, 3), 150, 100);
        let (_, second) = grow(&mut grower, &img, (2, 4), 150, 100);
        assert_eq!(first.count(), 9);
        assert_eq!(second.count(), 9);
    }

    #[test]
    fn plots_accepted_pixels_in_row_col_order() {
        let mut img = GrayImage::filled(4, 3, 0);
        img.set(3, 1, 250);
        let mut grower = RegionGrower::default();
        let mut acc = RegionAccumulator::default();
        acc.reset(false);
        let mut plotted: Vec<(usize, usize, PlotColor)> = Vec::new();
        grower.grow(&img, (3, 1), 200, 10, &mut acc, &mut plotted);
        assert_eq!(plotted, vec![(1, 3, PlotColor::Green)]);
        assert!(acc.moments.is_none());
    }
}
