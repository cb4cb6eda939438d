//! Version-aware decoding and rewriting of full-box timing fields.
//!
//! Both the movie header (`mvhd`) and media header (`mdhd`) are full boxes
//! whose timescale and duration sit at fixed offsets that depend only on the
//! version byte:
//!
//! | version | timescale           | duration            |
//! |---------|---------------------|---------------------|
//! | 0       | u32 at offset + 20  | u32 at offset + 24  |
//! | 1       | u32 at offset + 28  | u64 at offset + 32  |
//!
//! Offsets are relative to the box's size field. Every read and write is
//! checked against both the declared box size and the buffer length before
//! any byte is touched.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Range;

use crate::error::PatchError;

/// A four-character box type code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// The raw tag bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl Display for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "FourCC({self})")
    }
}

/// Movie header box.
pub const MVHD: FourCC = FourCC(*b"mvhd");
/// Media header box.
pub const MDHD: FourCC = FourCC(*b"mdhd");
/// Time-to-sample box.
pub const STTS: FourCC = FourCC(*b"stts");

const VERSION_OFFSET: usize = 8;
const STTS_ENTRY_COUNT_OFFSET: usize = 12;
const STTS_FIRST_ENTRY_OFFSET: usize = 16;

/// Largest integer an `f64` represents exactly (2^53).
pub const EXACT_FLOAT_LIMIT: u64 = 1 << 53;

/// The parsed prefix of a full box located by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullBoxHeader {
    /// Box type.
    pub tag: FourCC,
    /// Offset of the size field.
    pub offset: usize,
    /// Declared box size, including the 8-byte header.
    pub size: u32,
    /// Version byte.
    pub version: u8,
}

impl FullBoxHeader {
    /// Parse the size and version of the box whose size field starts at
    /// `offset`.
    ///
    /// Fails when the declared size is smaller than a box header or when the
    /// box would extend past the end of the buffer.
    pub fn parse(buffer: &[u8], tag: FourCC, offset: usize) -> Result<Self, PatchError> {
        let size_end = offset.saturating_add(4);
        let size = read_u32(buffer, offset..size_end).ok_or(PatchError::OutOfBounds {
            tag,
            offset,
            field: "size",
            end: size_end,
            limit: buffer.len(),
        })?;

        if (size as usize) < VERSION_OFFSET {
            return Err(PatchError::InvalidBoxSize { tag, offset, size });
        }

        let box_end = offset.saturating_add(size as usize);
        if box_end > buffer.len() {
            return Err(PatchError::OutOfBounds {
                tag,
                offset,
                field: "box",
                end: box_end,
                limit: buffer.len(),
            });
        }

        let mut header = Self {
            tag,
            offset,
            size,
            version: 0,
        };
        let version_range = header.field_range(buffer.len(), VERSION_OFFSET, 1, "version")?;
        header.version = buffer[version_range.start];
        Ok(header)
    }

    /// Exclusive end of the box.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.size as usize)
    }

    /// Byte range of a field `relative` bytes past the size field, checked
    /// against both the box end and `buffer_len`.
    pub fn field_range(
        &self,
        buffer_len: usize,
        relative: usize,
        width: usize,
        field: &'static str,
    ) -> Result<Range<usize>, PatchError> {
        let limit = self.end().min(buffer_len);
        let start = self.offset.saturating_add(relative);
        let end = start.saturating_add(width);
        if end > limit {
            return Err(PatchError::OutOfBounds {
                tag: self.tag,
                offset: self.offset,
                field,
                end,
                limit,
            });
        }
        Ok(start..end)
    }

    /// Timing field layout for this header's version.
    pub fn timing_layout(&self) -> Result<TimingLayout, PatchError> {
        TimingLayout::for_version(self.version).ok_or(PatchError::UnsupportedVersion {
            tag: self.tag,
            offset: self.offset,
            version: self.version,
        })
    }
}

/// Width of a duration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationWidth {
    /// 4-byte duration (version 0).
    U32,
    /// 8-byte duration (version 1).
    U64,
}

impl DurationWidth {
    fn len(self) -> usize {
        match self {
            DurationWidth::U32 => 4,
            DurationWidth::U64 => 8,
        }
    }

    fn max(self) -> u64 {
        match self {
            DurationWidth::U32 => u64::from(u32::MAX),
            DurationWidth::U64 => u64::MAX,
        }
    }
}

/// Where timescale and duration live for a given header version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingLayout {
    /// Offset of the 4-byte timescale, relative to the size field.
    pub timescale_offset: usize,
    /// Offset of the duration, relative to the size field.
    pub duration_offset: usize,
    /// Width of the duration.
    pub duration_width: DurationWidth,
}

impl TimingLayout {
    /// Version 0 layout.
    pub const V0: Self = Self {
        timescale_offset: 20,
        duration_offset: 24,
        duration_width: DurationWidth::U32,
    };

    /// Version 1 layout.
    pub const V1: Self = Self {
        timescale_offset: 28,
        duration_offset: 32,
        duration_width: DurationWidth::U64,
    };

    /// Layout for `version`, or `None` when the version is unsupported.
    pub fn for_version(version: u8) -> Option<Self> {
        match version {
            0 => Some(Self::V0),
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// Timescale and duration decoded from a movie- or media-header box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxTiming {
    /// Box type.
    pub tag: FourCC,
    /// Offset of the size field.
    pub offset: usize,
    /// Header version (0 or 1).
    pub version: u8,
    /// Units per second.
    pub timescale: u32,
    /// Duration in timescale units.
    pub duration: u64,
}

impl BoxTiming {
    /// Duration in seconds, or `None` for a zero timescale.
    pub fn seconds(&self) -> Option<f64> {
        (self.timescale > 0).then(|| self.duration as f64 / f64::from(self.timescale))
    }
}

/// The result of rescaling one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingChange {
    /// Timing before the rewrite.
    pub before: BoxTiming,
    /// Timing after the rewrite.
    pub after: BoxTiming,
}

impl Display for TimingChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} (v{}) @ {}: timescale {}→{}, duration {}→{}",
            self.before.tag,
            self.before.version,
            self.before.offset,
            self.before.timescale,
            self.after.timescale,
            self.before.duration,
            self.after.duration,
        )
    }
}

/// One entry of a time-to-sample table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTiming {
    /// Number of consecutive samples sharing `sample_delta`.
    pub sample_count: u32,
    /// Duration of each sample in media timescale units.
    pub sample_delta: u32,
}

/// Decode the timescale and duration of the full box at `offset`.
pub fn read_timing(buffer: &[u8], tag: FourCC, offset: usize) -> Result<BoxTiming, PatchError> {
    let header = FullBoxHeader::parse(buffer, tag, offset)?;
    read_header_timing(buffer, &header)
}

fn read_header_timing(buffer: &[u8], header: &FullBoxHeader) -> Result<BoxTiming, PatchError> {
    let layout = header.timing_layout()?;
    let timescale_range =
        header.field_range(buffer.len(), layout.timescale_offset, 4, "timescale")?;
    let duration_range = header.field_range(
        buffer.len(),
        layout.duration_offset,
        layout.duration_width.len(),
        "duration",
    )?;

    // Ranges were checked above, so the reads cannot miss.
    let timescale = read_u32(buffer, timescale_range).unwrap_or_default();
    let duration = match layout.duration_width {
        DurationWidth::U32 => read_u32(buffer, duration_range).map(u64::from),
        DurationWidth::U64 => read_u64(buffer, duration_range),
    }
    .unwrap_or_default();

    Ok(BoxTiming {
        tag: header.tag,
        offset: header.offset,
        version: header.version,
        timescale,
        duration,
    })
}

/// Multiply `value` by `scale` and round to the nearest integer.
///
/// The multiplication goes through an `f64`, so results are exact only while
/// `value` stays below [`EXACT_FLOAT_LIMIT`] (2^53). Above that the input is
/// already rounded to a multiple of a power of two before scaling. This is a
/// known limit, not something callers should rely on being corrected.
///
/// Returns `None` when the rounded result is negative, not finite, or larger
/// than `max`.
pub fn scale_u64_lossy(value: u64, scale: f64, max: u64) -> Option<u64> {
    let scaled = (value as f64 * scale).round();
    // `max as f64` may round up to 2^64, so compare strictly against it.
    if !scaled.is_finite() || scaled < 0.0 || scaled >= max as f64 + 1.0 {
        return None;
    }
    let narrowed = scaled as u64;
    (narrowed <= max).then_some(narrowed)
}

/// Rescale the timescale and duration of the full box at `offset` in place.
///
/// Both new values are computed and checked before either is written, so a
/// failing box is left untouched. With `dry_run` set, nothing is written and
/// the returned change describes what would have been written.
pub fn scale_timing(
    buffer: &mut [u8],
    tag: FourCC,
    offset: usize,
    scale: f64,
    dry_run: bool,
) -> Result<TimingChange, PatchError> {
    let header = FullBoxHeader::parse(buffer, tag, offset)?;
    let layout = header.timing_layout()?;
    let before = read_header_timing(buffer, &header)?;

    let timescale = scale_u64_lossy(u64::from(before.timescale), scale, u64::from(u32::MAX))
        .ok_or_else(|| overflow(&header, "timescale", before.timescale.into(), scale))?;
    let duration = scale_u64_lossy(before.duration, scale, layout.duration_width.max())
        .ok_or_else(|| overflow(&header, "duration", before.duration, scale))?;

    let after = BoxTiming {
        timescale: timescale as u32,
        duration,
        ..before
    };

    if !dry_run {
        let timescale_at = header.offset + layout.timescale_offset;
        let duration_at = header.offset + layout.duration_offset;
        buffer[timescale_at..timescale_at + 4].copy_from_slice(&after.timescale.to_be_bytes());
        match layout.duration_width {
            DurationWidth::U32 => buffer[duration_at..duration_at + 4]
                .copy_from_slice(&(after.duration as u32).to_be_bytes()),
            DurationWidth::U64 => {
                buffer[duration_at..duration_at + 8].copy_from_slice(&after.duration.to_be_bytes())
            }
        }
    }

    Ok(TimingChange { before, after })
}

fn overflow(header: &FullBoxHeader, field: &'static str, value: u64, scale: f64) -> PatchError {
    PatchError::ValueOverflow {
        tag: header.tag,
        offset: header.offset,
        field,
        value: (value as f64 * scale).round(),
    }
}

/// Decode the first entry of the time-to-sample box at `offset`.
///
/// Returns `Ok(None)` when the table is empty.
pub fn read_first_sample_timing(
    buffer: &[u8],
    offset: usize,
) -> Result<Option<SampleTiming>, PatchError> {
    let header = FullBoxHeader::parse(buffer, STTS, offset)?;
    let count_range =
        header.field_range(buffer.len(), STTS_ENTRY_COUNT_OFFSET, 4, "entry_count")?;
    let entry_count = read_u32(buffer, count_range).unwrap_or_default();
    if entry_count == 0 {
        return Ok(None);
    }

    let count_range = header.field_range(buffer.len(), STTS_FIRST_ENTRY_OFFSET, 4, "sample_count")?;
    let delta_range =
        header.field_range(buffer.len(), STTS_FIRST_ENTRY_OFFSET + 4, 4, "sample_delta")?;

    Ok(Some(SampleTiming {
        sample_count: read_u32(buffer, count_range).unwrap_or_default(),
        sample_delta: read_u32(buffer, delta_range).unwrap_or_default(),
    }))
}

fn read_u32(buffer: &[u8], range: Range<usize>) -> Option<u32> {
    buffer
        .get(range)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_be_bytes)
}

fn read_u64(buffer: &[u8], range: Range<usize>) -> Option<u64> {
    buffer
        .get(range)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_be_bytes)
}
