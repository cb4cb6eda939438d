//! Box type tag scanning.
//!
//! The locator does not walk the box tree. It searches the raw bytes for a
//! 4-byte type tag and treats the four bytes in front of every hit as the
//! box's size field. A tag that happens to appear inside sample data is
//! reported like any other match; the header codec's bounds checks are what
//! keep such false positives from being rewritten.
//!
//! The search is a plain forward scan that abandons a candidate position at
//! its first mismatching byte. That is O(n·m) in the worst case, which for a
//! fixed 4-byte tag is effectively linear in the buffer length.

use std::iter::FusedIterator;

use crate::codec::FourCC;

/// Size of the length field that precedes every box type tag.
const SIZE_FIELD_LEN: usize = 4;

/// A tag occurrence that has room for a size field in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxMatch {
    /// The tag that was matched.
    pub tag: FourCC,
    /// Index of the 4-byte size field preceding the tag.
    pub header_offset: usize,
}

impl BoxMatch {
    /// Index of the tag itself.
    pub fn tag_offset(&self) -> usize {
        self.header_offset + SIZE_FIELD_LEN
    }
}

/// Find the first occurrence of `tag` at or after byte index `start`.
///
/// Returns the index of the tag itself, not of the size field in front of
/// it. Returns `None` when `start` is past the last position a tag could
/// begin at.
pub fn find_next(buffer: &[u8], tag: FourCC, start: usize) -> Option<usize> {
    let needle = tag.as_bytes();
    let last = buffer.len().checked_sub(needle.len())?;
    if start > last {
        return None;
    }

    (start..=last).find(|&index| {
        needle
            .iter()
            .zip(&buffer[index..])
            .all(|(expected, actual)| expected == actual)
    })
}

/// Iterate over every usable occurrence of `tag` in ascending offset order.
///
/// Matches too close to the start of the buffer to carry a size field are
/// discarded and the scan resumes after them.
pub fn find_all(buffer: &[u8], tag: FourCC) -> BoxMatches<'_> {
    BoxMatches {
        buffer,
        tag,
        position: 0,
    }
}

/// Iterator returned by [`find_all`].
#[derive(Debug, Clone)]
pub struct BoxMatches<'a> {
    buffer: &'a [u8],
    tag: FourCC,
    position: usize,
}

impl Iterator for BoxMatches<'_> {
    type Item = BoxMatch;

    fn next(&mut self) -> Option<BoxMatch> {
        loop {
            let found = find_next(self.buffer, self.tag, self.position)?;
            // Resume after the whole tag so matches never overlap.
            self.position = found + SIZE_FIELD_LEN;

            match found.checked_sub(SIZE_FIELD_LEN) {
                Some(header_offset) => {
                    return Some(BoxMatch {
                        tag: self.tag,
                        header_offset,
                    });
                }
                None => {
                    log::debug!("Discarding {} tag at {found}: no room for a size field", self.tag);
                }
            }
        }
    }
}

impl FusedIterator for BoxMatches<'_> {}
