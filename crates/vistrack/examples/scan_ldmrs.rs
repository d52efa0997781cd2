use std::{
    env,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use vistrack::io::VistrackConfig;
use vistrack::ldmrs::{LaserScan, MeasureOutcome, ScannerDecoder, NUM_LAYERS};

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

/// Usage: scan_ldmrs [config.json] [scans] [dump.txt]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let cfg = match args.get(1) {
        Some(path) => VistrackConfig::load_json(path)?,
        None => VistrackConfig::default(),
    };
    let scans: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(10);
    let mut dump = args
        .get(3)
        .map(PathBuf::from)
        .map(|p| File::create(p).map(BufWriter::new))
        .transpose()?;

    let mut decoder: ScannerDecoder = ScannerDecoder::with_config(cfg.scanner.clone());
    decoder.setup()?;

    let mut layers: [LaserScan; NUM_LAYERS] = Default::default();
    let mut done = 0;
    while done < scans {
        match decoder.measure(&mut layers) {
            Ok(MeasureOutcome::Measured {
                measurement_id,
                points,
            }) => {
                done += 1;
                let per_layer: Vec<usize> = layers.iter().map(|l| l.points.len()).collect();
                println!(
                    "scan {measurement_id}: {points} points {per_layer:?}, t = {:.3} s",
                    layers[0].start_timestamp
                );
                if let Some(out) = dump.as_mut() {
                    for (i, layer) in layers.iter().enumerate() {
                        for p in &layer.points {
                            writeln!(out, "{measurement_id} {i} {p}")?;
                        }
                    }
                }
            }
            Ok(MeasureOutcome::Skipped { msg_type }) => {
                log::debug!("ignored message {msg_type:#06x}");
            }
            Err(err) if err.is_protocol_error() => {
                log::warn!("{err}; reconnecting");
                decoder.setup()?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    if let Some(mut out) = dump {
        out.flush()?;
    }
    Ok(())
}
