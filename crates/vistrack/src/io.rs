//! JSON configuration and tracking reports.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use vistrack_dot::{DotMoments, DotParams, DotTrackError, DotTracker};
use vistrack_ldmrs::ScannerConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for the demo programs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VistrackConfig {
    #[serde(default)]
    pub dot: DotParams,
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Frames to track, in order.
    #[serde(default)]
    pub image_paths: Vec<String>,
    /// Initial dot position `[u, v]` (column, row) in the first frame.
    #[serde(default)]
    pub seed: Option<[usize; 2]>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl VistrackConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tracking_report.json"))
    }
}

/// Tracking outcome for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: usize,
    #[serde(default)]
    pub image_path: Option<String>,
    /// Sub-pixel centre `[u, v]`; `None` when the dot was lost.
    #[serde(default)]
    pub centroid: Option<[f64; 2]>,
    pub threshold: u8,
    pub region_size: usize,
    #[serde(default)]
    pub moments: Option<DotMoments>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FrameReport {
    pub fn new(
        frame: usize,
        image_path: Option<String>,
        tracker: &DotTracker,
        result: &Result<Point2<f64>, DotTrackError>,
    ) -> Self {
        let mut report = Self {
            frame,
            image_path,
            threshold: tracker.threshold(),
            ..Self::default()
        };
        match result {
            Ok(c) => {
                report.centroid = Some([c.x, c.y]);
                report.region_size = tracker.region().len();
                report.moments = tracker.moments().copied();
            }
            Err(err) => report.error = Some(err.to_string()),
        }
        report
    }

    pub fn is_lost(&self) -> bool {
        self.centroid.is_none()
    }
}

/// Per-frame results of a tracking run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackReport {
    pub frames: Vec<FrameReport>,
}

impl TrackReport {
    pub fn lost_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_lost()).count()
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vistrack_ldmrs::BodyByteOrder;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: VistrackConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, VistrackConfig::default());
        assert_eq!(cfg.output_path(), PathBuf::from("tracking_report.json"));
    }

    #[test]
    fn nested_sections_are_partial() {
        let raw = r#"{
            "dot": { "max_region_size": 400, "compute_moments": true },
            "scanner": { "ip": "10.0.0.2", "body_byte_order": "little_endian" },
            "image_paths": ["a.png", "b.png"],
            "seed": [12, 7]
        }"#;
        let cfg: VistrackConfig = serde_json::from_str(raw).expect("parse");
        assert_eq!(cfg.dot.max_region_size, 400);
        assert!(cfg.dot.compute_moments);
        assert_eq!(cfg.dot.min_region_size, DotParams::default().min_region_size);
        assert_eq!(cfg.scanner.ip, "10.0.0.2");
        assert_eq!(cfg.scanner.port, 12002);
        assert_eq!(cfg.scanner.body_byte_order, BodyByteOrder::LittleEndian);
        assert_eq!(cfg.seed, Some([12, 7]));
        assert_eq!(cfg.image_paths.len(), 2);
    }

    #[test]
    fn frame_report_records_loss() {
        let tracker = DotTracker::new(DotParams::default());
        let lost = FrameReport::new(
            3,
            None,
            &tracker,
            &Err(DotTrackError::NotFound { threshold: 200 }),
        );
        assert!(lost.is_lost());
        assert_eq!(lost.threshold, 200);
        assert!(lost.error.as_deref().is_some_and(|e| e.contains("200")));

        let report = TrackReport {
            frames: vec![lost, FrameReport::default()],
        };
        assert_eq!(report.lost_frames(), 2);
    }
}
