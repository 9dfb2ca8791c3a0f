//! `track_replay`: run recorded detections through the tracker.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin track_replay -- frames.jsonl
//! cargo run --bin track_replay -- frames.jsonl --config tracker.json --export status.json
//! ```
//!
//! Each input line is one frame:
//! `{"width": 1920, "height": 1080, "detections": [{"label": "cup", "box": [x, y, w, h]}]}`
//!
//! A line that cannot be parsed counts as a frame with no detections at the
//! last known frame size.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use centroid_tracker::tracker::{BackgroundSink, JsonFileSink};
use centroid_tracker::{
    Detection, DetectionBuilder, ManualClock, ObjectTracker, SteeringController, TrackerConfig,
    select_target,
};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::{error, info, warn};

/// Command-line arguments for the replay binary.
#[derive(Parser, Debug)]
#[command(
    name = "track_replay",
    version,
    about = "Replay recorded detections through the centroid tracker",
    long_about = None
)]
struct Args {
    /// JSON Lines file with one frame per line.
    #[arg(value_name = "FRAMES")]
    frames: PathBuf,

    /// Tracker configuration (JSON). Defaults are used if omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the throttled status export to this file.
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Simulated frame rate driving the tracker clock.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Layout of the four numbers in each `box`.
    #[arg(long, value_enum, default_value_t = BoxFormat::Tlwh)]
    box_format: BoxFormat,

    /// Scale of the frames the boxes were recorded on, e.g. 0.8 for a
    /// detector fed 80% frames. Boxes are mapped back to full size.
    #[arg(long, default_value_t = 1.0)]
    detection_scale: f32,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BoxFormat {
    /// left, top, width, height
    Tlwh,
    /// left, top, right, bottom
    Tlbr,
    /// center x, center y, width, height
    Xywh,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    label: String,
    #[serde(rename = "box")]
    bbox: [i32; 4],
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    width: u32,
    height: u32,
    #[serde(default)]
    detections: Vec<RawDetection>,
}

#[derive(Debug, PartialEq)]
struct Frame {
    width: u32,
    height: u32,
    detections: Vec<Detection>,
}

fn parse_frame(line: &str, format: BoxFormat, scale: f32) -> serde_json::Result<Frame> {
    let raw: RawFrame = serde_json::from_str(line)?;
    let detections = raw
        .detections
        .into_iter()
        .map(|d| {
            let [a, b, c, e] = d.bbox;
            let builder = DetectionBuilder::new().label(d.label).scale(1.0 / scale);
            match format {
                BoxFormat::Tlwh => builder.tlwh(a, b, c, e),
                BoxFormat::Tlbr => builder.tlbr(a, b, c, e),
                BoxFormat::Xywh => builder.xywh(a, b, c, e),
            }
            .build()
        })
        .collect();
    Ok(Frame {
        width: raw.width,
        height: raw.height,
        detections,
    })
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level_filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(log_level_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match args.config.as_deref() {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            match TrackerConfig::from_json(path) {
                Ok(c) => c,
                Err(e) => {
                    error!("{e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => TrackerConfig::default(),
    };

    if !(args.fps.is_finite() && args.fps > 0.0) {
        error!("--fps must be positive, got {}", args.fps);
        return ExitCode::FAILURE;
    }
    if !(args.detection_scale.is_finite() && args.detection_scale > 0.0) {
        error!(
            "--detection-scale must be positive, got {}",
            args.detection_scale
        );
        return ExitCode::FAILURE;
    }

    let clock = ManualClock::default();
    let mut tracker = match ObjectTracker::with_clock(config, clock.clone()) {
        Ok(t) => t,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = args.export.as_ref() {
        match JsonFileSink::create(path) {
            Ok(sink) => {
                tracker.set_sink(Some(Box::new(BackgroundSink::spawn(
                    sink,
                    Duration::from_millis(5),
                ))));
            }
            // Tracking still runs without the export.
            Err(e) => warn!("status export disabled: {e}"),
        }
    }

    let reader = match File::open(&args.frames) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            error!("cannot open {}: {e}", args.frames.display());
            return ExitCode::FAILURE;
        }
    };

    let steering = SteeringController::default();
    let frame_period = 1.0 / args.fps;
    let mut frame_size = (0, 0);

    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("read error at line {}: {e}", index + 1);
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let frame = match parse_frame(&line, args.box_format, args.detection_scale) {
            Ok(f) => {
                frame_size = (f.width, f.height);
                f
            }
            Err(e) => {
                warn!("malformed frame at line {}, treating as empty: {e}", index + 1);
                Frame {
                    width: frame_size.0,
                    height: frame_size.1,
                    detections: Vec::new(),
                }
            }
        };

        let entities = tracker.process(frame.detections, frame.width, frame.height);
        let ids: Vec<String> = entities
            .values()
            .map(|e| {
                if e.active() {
                    e.id().to_string()
                } else {
                    format!("({})", e.id())
                }
            })
            .collect();
        let command = steering.calculate(select_target(entities), frame.width);

        print!("{index}\t[{}]\t{}", ids.join(","), command.to_wire());
        clock.advance_secs(frame_period);
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use centroid_tracker::Rect;

    const LINE: &str =
        r#"{"width": 640, "height": 480, "detections": [{"label": "cup", "box": [100, 100, 140, 160]}]}"#;

    #[test]
    fn test_parse_frame_box_formats() {
        let tlwh = parse_frame(LINE, BoxFormat::Tlwh, 1.0).unwrap();
        assert_eq!((tlwh.width, tlwh.height), (640, 480));
        assert_eq!(tlwh.detections[0].bbox, Rect::new(100, 100, 140, 160));

        let tlbr = parse_frame(LINE, BoxFormat::Tlbr, 1.0).unwrap();
        assert_eq!(tlbr.detections[0].bbox, Rect::new(100, 100, 40, 60));

        let xywh = parse_frame(LINE, BoxFormat::Xywh, 1.0).unwrap();
        assert_eq!(xywh.detections[0].bbox, Rect::new(30, 20, 140, 160));
    }

    #[test]
    fn test_parse_frame_rescales() {
        let frame = parse_frame(LINE, BoxFormat::Tlwh, 0.5).unwrap();
        assert_eq!(frame.detections[0].bbox, Rect::new(200, 200, 280, 320));
    }

    #[test]
    fn test_parse_frame_without_detections() {
        let frame = parse_frame(r#"{"width": 640, "height": 480}"#, BoxFormat::Tlwh, 1.0).unwrap();
        assert!(frame.detections.is_empty());
        assert!(parse_frame("{not json", BoxFormat::Tlwh, 1.0).is_err());
        assert!(parse_frame(r#"{"width": 640}"#, BoxFormat::Tlwh, 1.0).is_err());
    }
}
