//! Frame rate patching.
//!
//! Patching multiplies the timescale and duration of every movie-header and
//! media-header box by `original_fps / target_fps`. Sample data, and with it
//! the time-to-sample table, is never touched: the container simply starts
//! reporting a different rate for the same frames.
//!
//! A higher target rate gives a scale factor below one and therefore shrinks
//! the timing fields. The caller's buffer is never modified; every patch
//! works on a fresh copy that is returned inside [`PatchOutcome`].
//!
//! # Example
//!
//! ```no_run
//! let data = std::fs::read("input.mp4")?;
//! let outcome = fpspatch::apply_patch(&data, 24.0, 48.0);
//! for line in &outcome.logs {
//!     println!("{line}");
//! }
//! if outcome.success {
//!     std::fs::write("input_patched.mp4", &outcome.data)?;
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use crate::codec::{self, TimingChange};
use crate::config::PatchOptions;
use crate::error::PatchError;
use crate::locator;

/// The result of a patch run.
#[derive(Debug, Clone)]
#[must_use]
pub struct PatchOutcome {
    /// The patched copy of the input.
    ///
    /// Identical to the input when nothing was patched or when running dry.
    pub data: Vec<u8>,
    /// Human-readable log lines in the order the work happened.
    pub logs: Vec<String>,
    /// Every box that was (or, when running dry, would be) rewritten.
    pub changes: Vec<TimingChange>,
    /// Number of boxes rewritten.
    pub patched_count: u32,
    /// `true` when at least one box was rewritten.
    pub success: bool,
    failure: Option<PatchError>,
}

impl PatchOutcome {
    /// Convert into the patched bytes, or the reason nothing was patched.
    pub fn into_result(self) -> Result<Vec<u8>, PatchError> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }

    /// The reason the run failed, if it did.
    pub fn failure(&self) -> Option<&PatchError> {
        self.failure.as_ref()
    }
}

/// Compute `original_fps / target_fps`.
///
/// Both rates must be finite and strictly positive.
pub fn scale_factor(original_fps: f64, target_fps: f64) -> Result<f64, PatchError> {
    for fps in [original_fps, target_fps] {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PatchError::InvalidFrameRate(fps));
        }
    }
    Ok(original_fps / target_fps)
}

/// Make `buffer` report `target_fps` instead of `original_fps`.
///
/// Rewrites every `mvhd` box, then every `mdhd` box. Boxes with an unknown
/// version or with fields that do not fit are skipped and logged. The run
/// succeeds when at least one box was rewritten.
pub fn apply_patch(buffer: &[u8], original_fps: f64, target_fps: f64) -> PatchOutcome {
    apply_patch_with_options(buffer, original_fps, target_fps, &PatchOptions::default())
}

/// Undo [`apply_patch`] called with the same `original_fps` and `target_fps`.
///
/// Timing fields are rounded on every pass, so the result matches the
/// pre-patch file only to within rounding.
pub fn reverse_patch(buffer: &[u8], original_fps: f64, target_fps: f64) -> PatchOutcome {
    apply_patch(buffer, target_fps, original_fps)
}

/// [`apply_patch`] with explicit [`PatchOptions`].
pub fn apply_patch_with_options(
    buffer: &[u8],
    original_fps: f64,
    target_fps: f64,
    options: &PatchOptions,
) -> PatchOutcome {
    let mut data = buffer.to_vec();
    let mut logs = Vec::new();

    let scale = match scale_factor(original_fps, target_fps) {
        Ok(scale) => scale,
        Err(error) => {
            log::warn!("Refusing to patch: {error}");
            logs.push(format!("ERROR: {error}"));
            return PatchOutcome {
                data,
                logs,
                changes: Vec::new(),
                patched_count: 0,
                success: false,
                failure: Some(error),
            };
        }
    };

    logs.push(format!(
        "Scale factor: {original_fps} / {target_fps} = {scale:.4}"
    ));
    if options.dry_run {
        logs.push("Dry run: no bytes will be written".to_string());
    }

    let mut changes = Vec::new();
    for tag in options.targets() {
        // Matches are collected up front so the scan never observes its own writes.
        let matches: Vec<_> = locator::find_all(&data, tag).collect();
        if matches.is_empty() {
            log::debug!("{}", PatchError::TagNotFound { tag });
        }

        for found in matches {
            match codec::scale_timing(&mut data, tag, found.header_offset, scale, options.dry_run)
            {
                Ok(change) => {
                    log::debug!("Patched {change}");
                    logs.push(format!("Patched {change}"));
                    changes.push(change);
                }
                Err(error @ PatchError::UnsupportedVersion { .. }) => {
                    log::warn!("{error}");
                    logs.push(error.to_string());
                }
                Err(error) => {
                    log::warn!("Skipping {tag} @ {}: {error}", found.header_offset);
                    logs.push(format!("Skipping {tag} @ {}: {error}", found.header_offset));
                }
            }
        }
    }

    let patched_count = u32::try_from(changes.len()).unwrap_or(u32::MAX);
    if patched_count == 0 {
        let error = PatchError::NoAtomsPatched;
        logs.push(format!("ERROR: {error}"));
        return PatchOutcome {
            data: buffer.to_vec(),
            logs,
            changes,
            patched_count,
            success: false,
            failure: Some(error),
        };
    }

    logs.push(format!("Successfully patched {patched_count} atom(s)"));
    PatchOutcome {
        data,
        logs,
        changes,
        patched_count,
        success: true,
        failure: None,
    }
}
