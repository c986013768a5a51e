//! Measure tail angles in a directory of frames.

use std::path::{Path, PathBuf};

use anyhow::Context;

use boutscope_common::config::AppConfig;
use boutscope_common::FrameClock;
use boutscope_imaging::Raster8;
use boutscope_model::{tail_angles_tsv_header, tail_angles_tsv_line, PixelCoord};
use boutscope_processing::{TailTracker, TailTrackerConfig};

const FRAME_EXTENSIONS: &[&str] = &["png", "tif", "tiff"];

#[allow(clippy::too_many_arguments)]
pub fn run(
    frames: PathBuf,
    start: PixelCoord,
    end: PixelCoord,
    segments: Option<usize>,
    radius: Option<usize>,
    threshold: Option<u8>,
    frame_rate: Option<u32>,
    json: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let paths = list_frames(&frames)?;
    let Some(first) = paths.first() else {
        anyhow::bail!("No PNG or TIFF frames found in {}", frames.display());
    };
    let (width, height) = load_frame(first)?.size();

    let mut tracking = config.tracking.clone();
    if let Some(n) = segments {
        tracking.segment_count = n;
    }
    if let Some(r) = radius {
        tracking.morphology_radius = r;
    }
    if let Some(t) = threshold {
        tracking.threshold = t;
    }
    let frame_rate = frame_rate.unwrap_or(config.analysis.frame_rate);
    let clock = FrameClock::new(frame_rate)?;

    let tracker = TailTracker::new(TailTrackerConfig::with_defaults(
        width, height, start, end, &tracking, frame_rate,
    ))
    .context("Invalid tail configuration")?;
    tracing::info!(
        frames = paths.len(),
        width,
        height,
        segments = tracker.segment_count(),
        "tracking started"
    );

    if !json {
        println!("# {} tracked {}", frames.display(), clock.epoch_wall());
        println!("{}", tail_angles_tsv_header(tracker.segment_count()));
    }

    let mut undetermined = 0usize;
    for (index, path) in paths.iter().enumerate() {
        let frame = load_frame(path)?;
        let points = tracker
            .track_tail(&frame)
            .with_context(|| format!("Failed to track {}", path.display()))?;
        undetermined += points.iter().filter(|p| !p.is_determined()).count();

        if json {
            println!("{}", serde_json::to_string(&points)?);
        } else {
            println!("{}", tail_angles_tsv_line(index, &points));
        }
    }

    tracing::info!(
        frames = tracker.frames_processed(),
        seconds = clock.frame_to_secs(paths.len()),
        undetermined,
        "tracking finished"
    );
    Ok(())
}

/// Frame files in `dir`, sorted by file name.
fn list_frames(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read frame directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_frame = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_frame && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Decode a frame as 8-bit grayscale.
fn load_frame(path: &Path) -> anyhow::Result<Raster8> {
    let gray = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .to_luma8();
    let (width, height) = gray.dimensions();
    let raster = Raster8::from_packed(width as usize, height as usize, gray.as_raw())?;
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_frames_filters_and_sorts() {
        let dir = std::env::temp_dir().join(format!("boutscope-frames-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["f002.png", "f001.PNG", "f003.tiff", "notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let names: Vec<_> = list_frames(&dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(names, vec!["f001.PNG", "f002.png", "f003.tiff"]);
    }

    #[test]
    fn test_load_frame_round_trips_grayscale() {
        let path = std::env::temp_dir().join(format!("boutscope-frame-{}.png", std::process::id()));
        let img = image::GrayImage::from_fn(6, 3, |x, y| image::Luma([(x * 10 + y) as u8]));
        img.save(&path).unwrap();

        let raster = load_frame(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(raster.size(), (6, 3));
        assert_eq!(raster.get(4, 2), 42);
    }
}
