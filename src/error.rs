//! Error types for the `fpspatch` crate.
//!
//! This module defines [`PatchError`], the unified error type used by every
//! fallible operation in the crate. Most variants describe a single box that
//! had to be skipped; the patch orchestrator turns those into log lines and
//! keeps scanning. Only [`PatchError::NoAtomsPatched`],
//! [`PatchError::Undetectable`] and [`PatchError::InvalidFrameRate`] describe
//! the outcome of a whole operation.

use thiserror::Error;

use crate::codec::FourCC;

/// The unified error type for all `fpspatch` operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PatchError {
    /// A box type tag does not occur anywhere in the buffer.
    #[error("No {tag} box found")]
    TagNotFound {
        /// The tag that was searched for.
        tag: FourCC,
    },

    /// The box carries a version other than 0 or 1.
    #[error("Found {tag} @ {offset} with unknown version {version}; skipping.")]
    UnsupportedVersion {
        /// Box type.
        tag: FourCC,
        /// Offset of the box's size field.
        offset: usize,
        /// Version byte read from the box.
        version: u8,
    },

    /// A field's byte range would run past the end of its box or buffer.
    #[error("{tag} @ {offset}: {field} ends at byte {end}, past the limit of {limit}")]
    OutOfBounds {
        /// Box type.
        tag: FourCC,
        /// Offset of the box's size field.
        offset: usize,
        /// Name of the field that does not fit.
        field: &'static str,
        /// Exclusive end position the field would need.
        end: usize,
        /// Exclusive end of the box or buffer, whichever is smaller.
        limit: usize,
    },

    /// The box's size field is smaller than a box header.
    #[error("{tag} @ {offset}: declared size {size} is too small for a box header")]
    InvalidBoxSize {
        /// Box type.
        tag: FourCC,
        /// Offset of the box's size field.
        offset: usize,
        /// The declared size.
        size: u32,
    },

    /// A scaled value no longer fits the width of its field.
    #[error("{tag} @ {offset}: scaled {field} {value} does not fit the field")]
    ValueOverflow {
        /// Box type.
        tag: FourCC,
        /// Offset of the box's size field.
        offset: usize,
        /// Name of the field that overflowed.
        field: &'static str,
        /// The scaled value before narrowing.
        value: f64,
    },

    /// Every frame rate heuristic was exhausted without an answer.
    #[error("Unable to detect the frame rate")]
    Undetectable,

    /// No movie-header or media-header box could be patched.
    #[error("No mvhd/mdhd atoms found. This may not be a valid MP4 file.")]
    NoAtomsPatched,

    /// A frame rate that is not a finite, strictly positive number.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),
}
