//! Frame rate detection integration tests.

mod common;

use common::{boxed, mdhd, movie, mvhd, simple_movie, stts, trak};
use fpspatch::{DetectionMethod, PatchError, detect, detect_fps};

#[test]
fn sample_delta_gives_exact_rate() {
    let data = simple_movie(1000, 10_000, 40);
    assert_eq!(detect_fps(&data), Some(25.0));

    let detection = detect(&data).expect("detectable");
    assert_eq!(detection.method, DetectionMethod::SampleDelta);
    assert_eq!(detection.probe.media.timescale, 1000);
    assert_eq!(detection.probe.first_sample.map(|s| s.sample_delta), Some(40));
}

#[test]
fn ntsc_rate_is_rounded_to_hundredths() {
    let data = simple_movie(30000, 300_300, 1001);
    assert_eq!(detect_fps(&data), Some(29.97));
}

#[test]
fn sample_delta_takes_priority_over_timescale_table() {
    // 600 maps to 24 in the table, but the samples say 30.
    let data = simple_movie(600, 6000, 20);
    assert_eq!(detect_fps(&data), Some(30.0));
}

#[test]
fn canonical_timescale_without_sample_table() {
    let data = movie(mvhd(0, 600, 6000), vec![trak(mdhd(0, 24000, 240_000), None)], &[]);
    let detection = detect(&data).expect("detectable");
    assert_eq!(detection.fps, 23.976);
    assert_eq!(detection.method, DetectionMethod::CanonicalTimescale);
}

#[test]
fn zero_sample_delta_falls_back_to_table() {
    let data = movie(
        mvhd(0, 1000, 10_000),
        vec![trak(mdhd(0, 1000, 10_000), Some(stts(&[(250, 0)])))],
        &[],
    );
    let detection = detect(&data).expect("detectable");
    assert_eq!(detection.fps, 25.0);
    assert_eq!(detection.method, DetectionMethod::CanonicalTimescale);
}

#[test]
fn empty_sample_table_falls_back_to_table() {
    let data = movie(
        mvhd(0, 1000, 10_000),
        vec![trak(mdhd(0, 60000, 600_000), Some(stts(&[])))],
        &[],
    );
    assert_eq!(detect_fps(&data), Some(59.94));
}

#[test]
fn candidate_timescale_is_last_resort() {
    let data = movie(
        mvhd(0, 1000, 10_000),
        vec![trak(mdhd(0, 50010, 500_100), None)],
        &[],
    );
    let detection = detect(&data).expect("detectable");
    assert_eq!(detection.fps, 50.0);
    assert_eq!(detection.method, DetectionMethod::CandidateTimescale);
}

#[test]
fn unknown_timescale_is_undetectable() {
    let data = movie(
        mvhd(0, 1000, 10_000),
        vec![trak(mdhd(0, 90000, 900_000), None)],
        &[],
    );
    assert_eq!(detect_fps(&data), None);
    assert_eq!(detect(&data).unwrap_err(), PatchError::Undetectable);
}

#[test]
fn missing_movie_header_is_undetectable() {
    let moov = boxed(b"moov", &trak(mdhd(0, 1000, 10_000), Some(stts(&[(1, 40)]))));
    assert_eq!(detect_fps(&moov), None);
    assert!(matches!(
        detect(&moov),
        Err(PatchError::TagNotFound { .. })
    ));
}

#[test]
fn unsupported_media_version_is_undetectable() {
    let mut media = mdhd(0, 1000, 10_000);
    media[8] = 3;
    let data = movie(mvhd(0, 1000, 10_000), vec![trak(media, Some(stts(&[(1, 40)])))], &[]);
    assert!(matches!(
        detect(&data),
        Err(PatchError::UnsupportedVersion { version: 3, .. })
    ));
}

#[test]
fn version_one_headers_are_read() {
    let data = movie(
        mvhd(1, 1000, 10_000),
        vec![trak(mdhd(1, 48000, 480_000), Some(stts(&[(100, 2000)])))],
        &[],
    );
    assert_eq!(detect_fps(&data), Some(24.0));
}

#[test]
fn first_media_header_wins() {
    let data = movie(
        mvhd(0, 1000, 10_000),
        vec![
            trak(mdhd(0, 44100, 441_000), None),
            trak(mdhd(0, 1000, 10_000), Some(stts(&[(250, 40)]))),
        ],
        &[],
    );
    // The audio track comes first, so its timescale is divided by the
    // video track's sample delta.
    assert_eq!(detect_fps(&data), Some(1102.5));
}

#[test]
fn detection_is_read_only() {
    let data = simple_movie(1000, 10_000, 40);
    let copy = data.clone();
    let _ = detect(&data);
    let _ = detect_fps(&data);
    assert_eq!(data, copy);
}
