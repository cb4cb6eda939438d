//! Frame rate detection from container timing boxes.
//!
//! Detection reads the first movie header, the first media header and the
//! first time-to-sample box, then hands the collected [`TimingProbe`] to an
//! ordered list of [`DetectionMethod`]s. The first method that produces a
//! rate wins.
//!
//! The first media header is assumed to belong to the video track. Files
//! whose first track is audio, or that carry several video tracks, may be
//! measured from the wrong track.
//!
//! # Example
//!
//! ```no_run
//! let data = std::fs::read("input.mp4")?;
//! match fpspatch::detect_fps(&data) {
//!     Some(fps) => println!("{fps} fps"),
//!     None => println!("frame rate could not be detected"),
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::codec::{self, BoxTiming, FourCC, MDHD, MVHD, STTS, SampleTiming};
use crate::error::PatchError;
use crate::locator;

/// Container timescales with a well-known frame rate.
const CANONICAL_TIMESCALES: [(u32, f64); 6] = [
    (600, 24.0),
    (1000, 25.0),
    (30000, 29.97),
    (24000, 23.976),
    (25000, 25.0),
    (60000, 59.94),
];

/// Candidate rates compared against `timescale / 1000`, in priority order.
const CANDIDATE_RATES: [f64; 8] = [23.976, 24.0, 25.0, 29.97, 30.0, 50.0, 59.94, 60.0];

/// Maximum distance, in timescale units, between a timescale and
/// `candidate * 1000` for the candidate to be accepted.
const CANDIDATE_TOLERANCE: i64 = 100;

/// Everything detection reads from the buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingProbe {
    /// The first movie-header box.
    pub movie: BoxTiming,
    /// The first media-header box.
    pub media: BoxTiming,
    /// The first entry of the first time-to-sample table, if usable.
    pub first_sample: Option<SampleTiming>,
}

impl TimingProbe {
    /// Read the probe from `buffer`.
    ///
    /// Fails when the movie or media header is missing or cannot be decoded.
    /// A missing or malformed time-to-sample box only leaves `first_sample`
    /// empty.
    pub fn read(buffer: &[u8]) -> Result<Self, PatchError> {
        let movie = read_first_timing(buffer, MVHD)?;
        let media = read_first_timing(buffer, MDHD)?;

        let first_sample = locator::find_all(buffer, STTS)
            .next()
            .and_then(|found| {
                codec::read_first_sample_timing(buffer, found.header_offset)
                    .inspect_err(|error| log::debug!("Ignoring time-to-sample box: {error}"))
                    .ok()
            })
            .flatten();

        Ok(Self {
            movie,
            media,
            first_sample,
        })
    }
}

fn read_first_timing(buffer: &[u8], tag: FourCC) -> Result<BoxTiming, PatchError> {
    let found = locator::find_all(buffer, tag)
        .next()
        .ok_or(PatchError::TagNotFound { tag })?;
    codec::read_timing(buffer, tag, found.header_offset)
}

/// One frame rate heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    /// `media timescale / first sample delta`, rounded to two decimals.
    SampleDelta,
    /// Lookup of well-known container timescales.
    CanonicalTimescale,
    /// Nearest common rate whose `rate * 1000` lies within 100 units of the
    /// media timescale.
    CandidateTimescale,
}

impl DetectionMethod {
    /// All methods in the order they are tried.
    pub const ALL: [DetectionMethod; 3] = [
        DetectionMethod::SampleDelta,
        DetectionMethod::CanonicalTimescale,
        DetectionMethod::CandidateTimescale,
    ];

    /// Run this heuristic alone.
    pub fn estimate(self, probe: &TimingProbe) -> Option<f64> {
        match self {
            DetectionMethod::SampleDelta => {
                let sample = probe.first_sample?;
                if sample.sample_delta == 0 {
                    return None;
                }
                let fps = f64::from(probe.media.timescale) / f64::from(sample.sample_delta);
                Some(round_to_hundredths(fps))
            }
            DetectionMethod::CanonicalTimescale => CANONICAL_TIMESCALES
                .iter()
                .find(|(timescale, _)| *timescale == probe.media.timescale)
                .map(|&(_, fps)| fps),
            DetectionMethod::CandidateTimescale => {
                if probe.media.duration == 0 || probe.media.timescale == 0 {
                    return None;
                }
                let timescale = i64::from(probe.media.timescale);
                CANDIDATE_RATES.iter().copied().find(|fps| {
                    let expected = (fps * 1000.0).round() as i64;
                    (timescale - expected).abs() < CANDIDATE_TOLERANCE
                })
            }
        }
    }
}

impl Display for DetectionMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            DetectionMethod::SampleDelta => "sample delta",
            DetectionMethod::CanonicalTimescale => "canonical timescale",
            DetectionMethod::CandidateTimescale => "candidate timescale",
        };
        f.write_str(name)
    }
}

/// A detected frame rate and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRateDetection {
    /// Frames per second.
    pub fps: f64,
    /// Heuristic that produced `fps`.
    pub method: DetectionMethod,
    /// The timing data the heuristic was applied to.
    pub probe: TimingProbe,
}

/// Detect the frame rate, reporting which heuristic succeeded.
///
/// Returns [`PatchError::Undetectable`] when every heuristic fails, or the
/// underlying error when the movie or media header cannot be read.
pub fn detect(buffer: &[u8]) -> Result<FrameRateDetection, PatchError> {
    let probe = TimingProbe::read(buffer)?;

    for method in DetectionMethod::ALL {
        if let Some(fps) = method.estimate(&probe) {
            log::debug!("Detected {fps} fps via {method}");
            return Ok(FrameRateDetection { fps, method, probe });
        }
    }

    log::debug!(
        "No heuristic matched media timescale {}",
        probe.media.timescale
    );
    Err(PatchError::Undetectable)
}

/// Detect the frame rate of an MP4 buffer.
///
/// Returns `None` when the rate cannot be determined. Callers must not
/// patch on the strength of a `None`; ask for a rate instead.
pub fn detect_fps(buffer: &[u8]) -> Option<f64> {
    detect(buffer).ok().map(|detection| detection.fps)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
