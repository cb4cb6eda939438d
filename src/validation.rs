//! Pre-patch validation.
//!
//! Provides [`validate`] which inspects an MP4 buffer and returns a
//! [`ValidationReport`] describing the timing boxes it found and anything
//! that may make a patch fail or hit the wrong track.
//!
//! # Example
//!
//! ```no_run
//! let data = std::fs::read("input.mp4")?;
//! let report = fpspatch::validate(&data);
//! if report.is_valid() {
//!     println!("File can be patched");
//! } else {
//!     for error in &report.errors {
//!         println!("Error: {error}");
//!     }
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::detect::{self, FrameRateDetection};
use crate::error::PatchError;
use crate::metadata::ContainerMetadata;

/// Summary of MP4 timing validation.
///
/// Contains lists of informational notices, warnings, and errors found during
/// validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect the patch result.
    pub warnings: Vec<String>,
    /// Fatal issues that will prevent patching.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    ///
    /// Warnings do not affect this result; only errors make the report
    /// invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Inspect `buffer` and report whether it can be patched.
pub fn validate(buffer: &[u8]) -> ValidationReport {
    validate_metadata(&ContainerMetadata::read(buffer), &detect::detect(buffer))
}

/// Run validation checks on already scanned metadata.
pub(crate) fn validate_metadata(
    metadata: &ContainerMetadata,
    detection: &Result<FrameRateDetection, PatchError>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    // ── Header presence ────────────────────────────────────────────
    if metadata.patchable_count() == 0 {
        report
            .errors
            .push("No patchable mvhd/mdhd boxes found".to_string());
    }

    if metadata.movie_headers.is_empty() {
        report
            .warnings
            .push("No usable movie header (mvhd); frame rate detection will fail".to_string());
    }

    if metadata.media_headers.is_empty() {
        report
            .warnings
            .push("No usable media header (mdhd); frame rate detection will fail".to_string());
    } else if metadata.media_headers.len() > 1 {
        report.warnings.push(format!(
            "{} media headers found; detection reads the first, patching rewrites all",
            metadata.media_headers.len(),
        ));
    }

    if metadata.movie_headers.len() > 1 {
        report.warnings.push(format!(
            "{} movie headers found; some may be false matches inside sample data",
            metadata.movie_headers.len(),
        ));
    }

    // ── Per-box checks ─────────────────────────────────────────────
    for timing in metadata.movie_headers.iter().chain(&metadata.media_headers) {
        if timing.timescale == 0 {
            report.warnings.push(format!(
                "{} @ {} has a zero timescale",
                timing.tag, timing.offset,
            ));
        }
        report.info.push(format!(
            "{} (v{}) @ {}: timescale {}, duration {}",
            timing.tag, timing.version, timing.offset, timing.timescale, timing.duration,
        ));
    }

    for skipped in &metadata.skipped {
        report.warnings.push(format!("Skipped: {skipped}"));
    }

    // ── Sample table ───────────────────────────────────────────────
    match (metadata.has_sample_table, metadata.first_sample) {
        (false, _) => report.info.push(
            "No time-to-sample box; detection falls back to timescale heuristics".to_string(),
        ),
        (true, None) => report
            .info
            .push("Time-to-sample table is empty or unreadable".to_string()),
        (true, Some(sample)) => report.info.push(format!(
            "First sample run: {} sample(s) of delta {}",
            sample.sample_count, sample.sample_delta,
        )),
    }

    // ── Frame rate ─────────────────────────────────────────────────
    match detection {
        Ok(detection) => report.info.push(format!(
            "Detected frame rate: {} fps ({})",
            detection.fps, detection.method,
        )),
        Err(error) => report.warnings.push(format!(
            "Frame rate could not be detected ({error}); supply the original rate explicitly",
        )),
    }

    report
}
