//! Container timing metadata.
//!
//! [`ContainerMetadata`] collects every movie header, every media header and
//! the first time-to-sample entry found in a buffer, together with the boxes
//! that had to be skipped. It is the read-only view used by
//! [`validate`](crate::validate) and by the CLI's reporting.

use crate::codec::{self, BoxTiming, FourCC, MDHD, MVHD, STTS, SampleTiming};
use crate::error::PatchError;
use crate::locator;

/// Timing-related boxes found in an MP4 buffer.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct ContainerMetadata {
    /// Decodable movie-header boxes, in file order.
    pub movie_headers: Vec<BoxTiming>,
    /// Decodable media-header boxes, in file order. One per track in a
    /// well-formed file.
    pub media_headers: Vec<BoxTiming>,
    /// First entry of the first time-to-sample table.
    pub first_sample: Option<SampleTiming>,
    /// Whether any time-to-sample tag was found at all.
    pub has_sample_table: bool,
    /// Header boxes that matched by tag but could not be decoded.
    pub skipped: Vec<PatchError>,
}

impl ContainerMetadata {
    /// Scan `buffer` for timing boxes.
    pub fn read(buffer: &[u8]) -> Self {
        let mut metadata = Self::default();
        metadata.movie_headers = scan_headers(buffer, MVHD, &mut metadata.skipped);
        metadata.media_headers = scan_headers(buffer, MDHD, &mut metadata.skipped);

        if let Some(found) = locator::find_all(buffer, STTS).next() {
            metadata.has_sample_table = true;
            match codec::read_first_sample_timing(buffer, found.header_offset) {
                Ok(entry) => metadata.first_sample = entry,
                Err(error) => metadata.skipped.push(error),
            }
        }

        metadata
    }

    /// Number of header boxes a patch would rewrite.
    pub fn patchable_count(&self) -> usize {
        self.movie_headers.len() + self.media_headers.len()
    }
}

fn scan_headers(buffer: &[u8], tag: FourCC, skipped: &mut Vec<PatchError>) -> Vec<BoxTiming> {
    locator::find_all(buffer, tag)
        .filter_map(|found| {
            codec::read_timing(buffer, tag, found.header_offset)
                .map_err(|error| skipped.push(error))
                .ok()
        })
        .collect()
}
