use std::{env, path::PathBuf, time::Instant};

use vistrack::io::VistrackConfig;
use vistrack::track::track_image_sequence;

#[cfg(not(feature = "tracing"))]
use log::LevelFilter;
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

fn init_logging() {
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        vistrack::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = vistrack::core::init_with_level(LevelFilter::Info);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let Some(config_path) = env::args().nth(1).map(PathBuf::from) else {
        eprintln!("Usage: track_dot <config.json>  (see testdata/track_dot.json)");
        return Ok(());
    };
    let cfg = VistrackConfig::load_json(&config_path)?;

    let t0 = Instant::now();
    let report = track_image_sequence(&cfg)?;
    log::info!("tracking took {} ms", t0.elapsed().as_millis());

    for frame in &report.frames {
        match (frame.centroid, &frame.error) {
            (Some([u, v]), _) => println!(
                "{:4}  u={u:8.3} v={v:8.3}  {:5} px  threshold {}",
                frame.frame, frame.region_size, frame.threshold
            ),
            (None, err) => println!(
                "{:4}  lost: {}",
                frame.frame,
                err.as_deref().unwrap_or("unknown")
            ),
        }
    }

    let output_path = cfg.output_path();
    report.write_json(&output_path)?;
    println!("wrote report JSON to {}", output_path.display());
    Ok(())
}
