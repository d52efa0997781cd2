use std::fs;
use tempfile::tempdir;
use vistrack::io::{TrackReport, VistrackConfig};
use vistrack::ldmrs::BodyByteOrder;

fn sample_config() -> VistrackConfig {
    let mut cfg = VistrackConfig::default();
    cfg.dot.max_region_size = 250;
    cfg.dot.compute_moments = true;
    cfg.scanner.port = 2111;
    cfg.scanner.body_byte_order = BodyByteOrder::LittleEndian;
    cfg.seed = Some([20, 12]);
    cfg.image_paths = vec!["frames/000.png".into(), "frames/001.png".into()];
    cfg.output_path = Some("out/report.json".into());
    cfg
}

#[test]
fn config_survives_a_json_round_trip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("vistrack.json");
    let cfg = sample_config();
    cfg.write_json(&path).expect("write");
    let loaded = VistrackConfig::load_json(&path).expect("load");
    assert_eq!(loaded, cfg);
    assert_eq!(loaded.output_path(), std::path::PathBuf::from("out/report.json"));
}

#[test]
fn malformed_config_is_a_json_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"dot\": ").expect("write");
    let err = VistrackConfig::load_json(&path).expect_err("broken");
    assert!(matches!(err, vistrack::io::ConfigError::Json(_)));

    let err = VistrackConfig::load_json(dir.path().join("absent.json")).expect_err("absent");
    assert!(matches!(err, vistrack::io::ConfigError::Io(_)));
}

#[cfg(feature = "image")]
#[test]
fn tracks_a_dot_across_image_files() {
    use approx::assert_relative_eq;
    use image::{GrayImage, Luma};

    let dir = tempdir().expect("tempdir");
    let mut cfg = VistrackConfig {
        seed: Some([11, 9]),
        ..VistrackConfig::default()
    };
    cfg.dot.compute_moments = true;
    cfg.dot.max_region_size = 100;

    // 5x5 dot moving 2 px right per frame; the blank last frame floods past max_region_size
    for i in 0..4u32 {
        let mut img = GrayImage::from_pixel(48, 32, Luma([15]));
        if i < 3 {
            for y in 7..12 {
                for x in 9 + 2 * i..14 + 2 * i {
                    img.put_pixel(x, y, Luma([250]));
                }
            }
        }
        let path = dir.path().join(format!("frame_{i:03}.png"));
        img.save(&path).expect("save png");
        cfg.image_paths.push(path.to_string_lossy().into_owned());
    }

    let report = vistrack::track::track_image_sequence(&cfg).expect("track");
    assert_eq!(report.frames.len(), 4);
    for (i, frame) in report.frames.iter().take(3).enumerate() {
        let c = frame.centroid.expect("dot found");
        assert_relative_eq!(c[0], 11.0 + 2.0 * i as f64);
        assert_relative_eq!(c[1], 9.0);
        assert_eq!(frame.region_size, 25);
        assert!(frame.moments.is_some());
    }
    assert!(report.frames[3].is_lost());
    assert_eq!(report.lost_frames(), 1);

    let out = dir.path().join("report.json");
    report.write_json(&out).expect("write report");
    assert_eq!(TrackReport::load_json(&out).expect("load report"), report);
}
