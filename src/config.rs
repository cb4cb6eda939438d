//! Patch configuration.
//!
//! [`PatchOptions`] is a builder that selects which header boxes are
//! rewritten and whether the rewrite actually happens, without widening the
//! signatures of the patch functions.
//!
//! # Example
//!
//! ```
//! use fpspatch::PatchOptions;
//!
//! // Only touch per-track media headers, and only report what would change.
//! let options = PatchOptions::new()
//!     .with_movie_header(false)
//!     .with_dry_run(true);
//! assert!(options.is_dry_run());
//! ```

use crate::codec::{FourCC, MDHD, MVHD};

/// Settings for [`apply_patch_with_options`](crate::apply_patch_with_options).
///
/// A default-constructed value behaves exactly like
/// [`apply_patch`](crate::apply_patch): both movie- and media-header boxes
/// are rewritten in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    pub(crate) movie_header: bool,
    pub(crate) media_header: bool,
    pub(crate) dry_run: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchOptions {
    /// Create options with default settings.
    ///
    /// Defaults: patch `mvhd`, patch `mdhd`, write changes.
    pub fn new() -> Self {
        Self {
            movie_header: true,
            media_header: true,
            dry_run: false,
        }
    }

    /// Whether the movie-header (`mvhd`) box is rewritten.
    #[must_use]
    pub fn with_movie_header(mut self, enabled: bool) -> Self {
        self.movie_header = enabled;
        self
    }

    /// Whether media-header (`mdhd`) boxes are rewritten.
    #[must_use]
    pub fn with_media_header(mut self, enabled: bool) -> Self {
        self.media_header = enabled;
        self
    }

    /// Compute and log every change without writing it.
    ///
    /// The returned buffer is then identical to the input, while the patch
    /// count and logs describe what a real run would do.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns `true` if changes are only computed, not written.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Box types to rewrite, movie header first.
    pub(crate) fn targets(&self) -> impl Iterator<Item = FourCC> {
        [(self.movie_header, MVHD), (self.media_header, MDHD)]
            .into_iter()
            .filter_map(|(enabled, tag)| enabled.then_some(tag))
    }
}
