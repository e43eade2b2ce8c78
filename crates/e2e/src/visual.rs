//! Visual regression: screenshot-to-baseline comparison.
//!
//! Baselines live alongside the other comparison artifacts in the output
//! directory. A comparison first tries a cheap content-hash match, then
//! falls back to a per-pixel diff with a small channel tolerance for
//! anti-aliasing noise, and writes a red-overlay diff image when pixels
//! disagree.

use std::path::{Path, PathBuf};

use image::{GenericImageView, Pixel, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Per-channel difference below which two pixels count as equal.
const CHANNEL_TOLERANCE: i32 = 5;

#[derive(Debug, Clone)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,
    /// Allowed differing-pixel share, in percent.
    pub threshold: f64,
    /// Adopt the actual screenshot as baseline when none exists.
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            actual_dir: PathBuf::from("test-results/actual"),
            diff_dir: PathBuf::from("test-results/diffs"),
            threshold: 0.5,
            auto_update: false,
        }
    }
}

/// Outcome of one snapshot comparison.
#[derive(Debug, Clone)]
pub struct SnapshotDiff {
    pub matches: bool,
    pub diff_percent: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,
    pub diff_image_path: Option<PathBuf>,
}

pub struct VisualBaselines {
    config: VisualConfig,
}

impl VisualBaselines {
    pub fn new(config: VisualConfig) -> HarnessResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    /// Where the actual screenshot for `name` should be written.
    pub fn actual_path(&self, name: &str) -> PathBuf {
        self.config.actual_dir.join(format!("{name}.png"))
    }

    fn baseline_path(&self, name: &str) -> PathBuf {
        self.config.baseline_dir.join(format!("{name}.png"))
    }

    /// Compare the actual screenshot named `name` against its baseline.
    pub fn compare(&self, name: &str, threshold: Option<f64>) -> HarnessResult<SnapshotDiff> {
        let threshold = threshold.unwrap_or(self.config.threshold);
        let actual_path = self.actual_path(name);
        let baseline_path = self.baseline_path(name);

        if !actual_path.exists() {
            return Err(HarnessError::VisualRegression(format!(
                "actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        if !baseline_path.exists() {
            if self.config.auto_update {
                info!(name, "adopting first screenshot as baseline");
                std::fs::copy(&actual_path, &baseline_path)?;
                return Ok(SnapshotDiff {
                    matches: true,
                    diff_percent: 0.0,
                    diff_pixels: 0,
                    total_pixels: 0,
                    diff_image_path: None,
                });
            }
            return Err(HarnessError::BaselineNotFound(
                baseline_path.display().to_string(),
            ));
        }

        if file_digest(&actual_path)? == file_digest(&baseline_path)? {
            debug!(name, "snapshots are byte-identical");
            let actual = image::open(&actual_path)?;
            let total = u64::from(actual.width()) * u64::from(actual.height());
            return Ok(SnapshotDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: total,
                diff_image_path: None,
            });
        }

        let actual = image::open(&actual_path)?;
        let baseline = image::open(&baseline_path)?;
        if actual.dimensions() != baseline.dimensions() {
            warn!(
                name,
                actual = ?actual.dimensions(),
                baseline = ?baseline.dimensions(),
                "snapshot dimensions differ; comparing the overlap"
            );
        }

        let actual = actual.to_rgba8();
        let baseline = baseline.to_rgba8();
        let (width, height) = actual.dimensions();
        let total_pixels = u64::from(width) * u64::from(height);

        let mut diff_image = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;

        for y in 0..height.min(baseline.height()) {
            for x in 0..width.min(baseline.width()) {
                let a = actual.get_pixel(x, y);
                let b = baseline.get_pixel(x, y);
                if pixels_differ(a, b) {
                    diff_pixels += 1;
                    diff_image.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                } else {
                    let c = a.channels();
                    diff_image.put_pixel(x, y, image::Rgba([c[0] / 2, c[1] / 2, c[2] / 2, 128]));
                }
            }
        }

        let diff_percent = (diff_pixels as f64 / total_pixels as f64) * 100.0;
        let matches = diff_percent <= threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.config.diff_dir.join(format!("{name}-diff.png"));
            diff_image.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                name,
                diff_percent,
                threshold,
                "visual regression detected"
            );
        }

        Ok(SnapshotDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
        })
    }

    /// Fail unless `name` matches its baseline within the threshold.
    pub fn assert_matches(&self, name: &str) -> HarnessResult<()> {
        match self.compare(name, None) {
            Ok(diff) if diff.matches => Ok(()),
            Ok(diff) => Err(HarnessError::SnapshotMismatch {
                name: name.to_string(),
                diff_percent: diff.diff_percent,
                threshold: self.config.threshold,
            }),
            Err(HarnessError::BaselineNotFound(path)) => {
                // First run: record, do not fail; re-run with auto-update
                // to adopt the baseline.
                warn!(name, baseline = %path, "no baseline yet; skipping comparison");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Promote the actual screenshot to be the new baseline.
    pub fn update_baseline(&self, name: &str) -> HarnessResult<()> {
        let actual_path = self.actual_path(name);
        if !actual_path.exists() {
            return Err(HarnessError::VisualRegression(format!(
                "cannot update baseline, actual screenshot not found: {}",
                actual_path.display()
            )));
        }
        std::fs::copy(&actual_path, self.baseline_path(name))?;
        info!(name, "baseline updated");
        Ok(())
    }

    /// Promote every captured screenshot to be its baseline.
    pub fn update_all_baselines(&self) -> HarnessResult<usize> {
        let mut updated = 0;
        for entry in std::fs::read_dir(&self.config.actual_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    self.update_baseline(&name.to_string_lossy())?;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }
}

fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    a.channels()
        .iter()
        .zip(b.channels())
        .any(|(x, y)| (i32::from(*x) - i32::from(*y)).abs() > CHANNEL_TOLERANCE)
}

fn file_digest(path: &Path) -> HarnessResult<String> {
    let data = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(root: &Path) -> VisualConfig {
        VisualConfig {
            baseline_dir: root.join("baselines"),
            actual_dir: root.join("actual"),
            diff_dir: root.join("diffs"),
            threshold: 0.5,
            auto_update: false,
        }
    }

    fn solid_image(path: &Path, rgba: [u8; 4], size: u32) {
        let img = RgbaImage::from_pixel(size, size, image::Rgba(rgba));
        img.save(path).unwrap();
    }

    #[test]
    fn identical_snapshots_match() {
        let root = tempfile::tempdir().unwrap();
        let baselines = VisualBaselines::new(config_in(root.path())).unwrap();
        solid_image(&baselines.actual_path("page"), [10, 20, 30, 255], 16);
        std::fs::copy(
            baselines.actual_path("page"),
            root.path().join("baselines/page.png"),
        )
        .unwrap();

        let diff = baselines.compare("page", None).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
    }

    #[test]
    fn differing_snapshots_report_percentage_and_diff_image() {
        let root = tempfile::tempdir().unwrap();
        let baselines = VisualBaselines::new(config_in(root.path())).unwrap();
        solid_image(&baselines.actual_path("page"), [255, 255, 255, 255], 16);
        solid_image(&root.path().join("baselines/page.png"), [0, 0, 0, 255], 16);

        let diff = baselines.compare("page", None).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_pixels, 256);
        assert!((diff.diff_percent - 100.0).abs() < f64::EPSILON);
        assert!(diff.diff_image_path.unwrap().exists());
    }

    #[test]
    fn small_channel_noise_is_tolerated() {
        let root = tempfile::tempdir().unwrap();
        let baselines = VisualBaselines::new(config_in(root.path())).unwrap();
        solid_image(&baselines.actual_path("page"), [100, 100, 100, 255], 8);
        solid_image(
            &root.path().join("baselines/page.png"),
            [103, 98, 100, 255],
            8,
        );

        let diff = baselines.compare("page", None).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
    }

    #[test]
    fn missing_baseline_is_a_distinct_error() {
        let root = tempfile::tempdir().unwrap();
        let baselines = VisualBaselines::new(config_in(root.path())).unwrap();
        solid_image(&baselines.actual_path("page"), [1, 2, 3, 255], 4);

        match baselines.compare("page", None) {
            Err(HarnessError::BaselineNotFound(_)) => {}
            other => panic!("expected BaselineNotFound, got {other:?}"),
        }
    }

    #[test]
    fn auto_update_adopts_first_screenshot() {
        let root = tempfile::tempdir().unwrap();
        let mut config = config_in(root.path());
        config.auto_update = true;
        let baselines = VisualBaselines::new(config).unwrap();
        solid_image(&baselines.actual_path("page"), [1, 2, 3, 255], 4);

        let diff = baselines.compare("page", None).unwrap();
        assert!(diff.matches);
        assert!(root.path().join("baselines/page.png").exists());
    }

    #[test]
    fn assert_matches_skips_when_no_baseline_exists() {
        let root = tempfile::tempdir().unwrap();
        let baselines = VisualBaselines::new(config_in(root.path())).unwrap();
        solid_image(&baselines.actual_path("page"), [1, 2, 3, 255], 4);
        baselines.assert_matches("page").unwrap();
    }
}
