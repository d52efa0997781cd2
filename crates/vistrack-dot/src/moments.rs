use serde::{Deserialize, Serialize};

/// Raw image moments of a tracked region, up to order 2.
///
/// Indices follow the row/column convention: the first index counts powers
/// of the row `v`, the second powers of the column `u`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DotMoments {
    /// Area in pixels.
    pub m00: f64,
    /// `Σ v`
    pub m10: f64,
    /// `Σ u`
    pub m01: f64,
    /// `Σ u·v`
    pub m11: f64,
    /// `Σ v²`
    pub m20: f64,
    /// `Σ u²`
    pub m02: f64,
}

impl DotMoments {
    #[inline]
    pub(crate) fn accumulate(&mut self, u: usize, v: usize) {
        let (u, v) = (u as f64, v as f64);
        self.m00 += 1.0;
        self.m10 += v;
        self.m01 += u;
        self.m11 += u * v;
        self.m20 += v * v;
        self.m02 += u * u;
    }

    /// Centre of mass `(u, v)`, or `None` for an empty region.
    pub fn center(&self) -> Option<(f64, f64)> {
        (self.m00 > 0.0).then(|| (self.m01 / self.m00, self.m10 / self.m00))
    }

    /// Second-order central moments `(mu20, mu11, mu02)` normalised by area.
    pub fn central_second_order(&self) -> Option<(f64, f64, f64)> {
        let (u, v) = self.center()?;
        let mu20 = self.m20 / self.m00 - v * v;
        let mu11 = self.m11 / self.m00 - u * v;
        let mu02 = self.m02 / self.m00 - u * u;
        Some((mu20, mu11, mu02))
    }
}
