//! # fpspatch
//!
//! Change the frame rate an MP4 file reports without re-encoding it.
//!
//! `fpspatch` rewrites the timescale and duration fields of the movie-header
//! (`mvhd`) and media-header (`mdhd`) boxes of an ISO base media file. Sample
//! data is never touched, so the edit is lossless and can be reversed. The
//! crate works on byte slices only: reading and writing files is left to the
//! caller.
//!
//! ## Quick Start
//!
//! ### Detect the Frame Rate
//!
//! ```no_run
//! let data = std::fs::read("input.mp4")?;
//! if let Some(fps) = fpspatch::detect_fps(&data) {
//!     println!("{fps} fps");
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ### Patch and Reverse
//!
//! ```no_run
//! use fpspatch::{apply_patch, reverse_patch};
//!
//! let data = std::fs::read("input.mp4")?;
//! let patched = apply_patch(&data, 24.0, 48.0);
//! assert!(patched.success);
//!
//! // Same pair of rates: undoes the first patch, up to rounding.
//! let restored = reverse_patch(&patched.data, 24.0, 48.0);
//! assert!(restored.success);
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## How It Works
//!
//! - **Locating**: [`locator`] scans the raw bytes for 4-byte box tags; it
//!   does not walk the box tree.
//! - **Decoding**: [`codec`] reads version 0 and version 1 full-box timing
//!   fields with bounds checks against the box and the buffer.
//! - **Detection**: [`detect_fps`] derives the source rate from the first
//!   time-to-sample entry, then from well-known timescales.
//! - **Patching**: [`patch`] multiplies every header's timescale and
//!   duration by `original_fps / target_fps` and logs each box.
//!
//! Malformed boxes are skipped and logged; no input makes an operation panic.

pub mod codec;
pub mod config;
pub mod detect;
pub mod error;
pub mod locator;
pub mod metadata;
pub mod patch;
pub mod validation;

pub use codec::{BoxTiming, FourCC, FullBoxHeader, SampleTiming, TimingChange, TimingLayout};
pub use config::PatchOptions;
pub use detect::{DetectionMethod, FrameRateDetection, TimingProbe, detect, detect_fps};
pub use error::PatchError;
pub use locator::{BoxMatch, find_all, find_next};
pub use metadata::ContainerMetadata;
pub use patch::{PatchOutcome, apply_patch, apply_patch_with_options, reverse_patch, scale_factor};
pub use validation::{ValidationReport, validate};
