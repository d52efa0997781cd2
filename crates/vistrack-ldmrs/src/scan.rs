use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

/// One laser return in polar form.
///
/// `h_angle` is the azimuth in the scan plane, `v_angle` the elevation of
/// the layer. The scanner frame has `x` forward, `y` left, `z` up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    /// Radial distance in meters.
    pub radial_dist: f64,
    /// Horizontal angle in radians.
    pub h_angle: f64,
    /// Vertical angle in radians.
    pub v_angle: f64,
}

impl ScanPoint {
    pub fn from_polar(radial_dist: f64, h_angle: f64, v_angle: f64) -> Self {
        Self {
            radial_dist,
            h_angle,
            v_angle,
        }
    }

    pub fn set_polar(&mut self, radial_dist: f64, h_angle: f64, v_angle: f64) {
        *self = Self::from_polar(radial_dist, h_angle, v_angle);
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.radial_dist * self.v_angle.cos() * self.h_angle.cos()
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.radial_dist * self.v_angle.cos() * self.h_angle.sin()
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.radial_dist * self.v_angle.sin()
    }

    pub fn to_cartesian(&self) -> Point3<f64> {
        Point3::new(self.x(), self.y(), self.z())
    }
}

impl fmt::Display for ScanPoint {
    /// `r h v x y z`, one point per line in dump files.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.radial_dist,
            self.h_angle,
            self.v_angle,
            self.x(),
            self.y(),
            self.z()
        )
    }
}

/// One layer of one scanner revolution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaserScan {
    pub measurement_id: u16,
    /// Local-clock seconds of the first point.
    pub start_timestamp: f64,
    /// Local-clock seconds of the last point.
    pub end_timestamp: f64,
    /// Angular resolution: steps per full revolution.
    pub num_steps: u16,
    /// Start of the scanned sector, in steps.
    pub start_angle: i16,
    /// End of the scanned sector, in steps.
    pub stop_angle: i16,
    /// Points announced for the whole revolution, all layers and echoes.
    pub num_points: u16,
    pub points: Vec<ScanPoint>,
}

impl LaserScan {
    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn add_point(&mut self, point: ScanPoint) {
        self.points.push(point);
    }

    pub fn start_angle_rad(&self) -> Option<f64> {
        self.steps_to_rad(self.start_angle)
    }

    pub fn stop_angle_rad(&self) -> Option<f64> {
        self.steps_to_rad(self.stop_angle)
    }

    fn steps_to_rad(&self, steps: i16) -> Option<f64> {
        (self.num_steps > 0).then(|| TAU / self.num_steps as f64 * steps as f64)
    }
}
