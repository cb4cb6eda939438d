//! Builders for synthetic MP4 byte buffers.
//!
//! The layouts follow ISO/IEC 14496-12 closely enough for the timing boxes
//! to sit at their real offsets inside a `moov/trak/mdia` tree.

#![allow(dead_code)]

/// Wrap `payload` in a box header.
pub fn boxed(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let size = u32::try_from(payload.len() + 8).expect("box too large");
    let mut data = Vec::with_capacity(payload.len() + 8);
    data.extend_from_slice(&size.to_be_bytes());
    data.extend_from_slice(tag);
    data.extend_from_slice(payload);
    data
}

/// Wrap `payload` in a full-box header with zero flags.
pub fn full_box(tag: &[u8; 4], version: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = vec![version, 0, 0, 0];
    body.extend_from_slice(payload);
    boxed(tag, &body)
}

fn times(version: u8, timescale: u32, duration: u64) -> Vec<u8> {
    let mut body = Vec::new();
    if version == 1 {
        body.extend_from_slice(&1_000u64.to_be_bytes());
        body.extend_from_slice(&2_000u64.to_be_bytes());
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&duration.to_be_bytes());
    } else {
        body.extend_from_slice(&1_000u32.to_be_bytes());
        body.extend_from_slice(&2_000u32.to_be_bytes());
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&(duration as u32).to_be_bytes());
    }
    body
}

/// A movie header box (108 bytes for v0, 120 for v1).
pub fn mvhd(version: u8, timescale: u32, duration: u64) -> Vec<u8> {
    let mut body = times(version, timescale, duration);
    body.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate 1.0
    body.extend_from_slice(&0x0100u16.to_be_bytes()); // volume 1.0
    body.extend_from_slice(&[0; 10]); // reserved
    body.extend_from_slice(&[0; 36]); // matrix
    body.extend_from_slice(&[0; 24]); // pre_defined
    body.extend_from_slice(&2u32.to_be_bytes()); // next_track_ID
    full_box(b"mvhd", version, &body)
}

/// A media header box (32 bytes for v0, 44 for v1).
pub fn mdhd(version: u8, timescale: u32, duration: u64) -> Vec<u8> {
    let mut body = times(version, timescale, duration);
    body.extend_from_slice(&0x55c4u16.to_be_bytes()); // "und"
    body.extend_from_slice(&[0; 2]);
    full_box(b"mdhd", version, &body)
}

/// A time-to-sample box holding `(sample_count, sample_delta)` entries.
pub fn stts(entries: &[(u32, u32)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for (count, delta) in entries {
        body.extend_from_slice(&count.to_be_bytes());
        body.extend_from_slice(&delta.to_be_bytes());
    }
    full_box(b"stts", 0, &body)
}

/// A track holding `mdhd` and, optionally, a sample table with `stts`.
pub fn trak(mdhd: Vec<u8>, stts: Option<Vec<u8>>) -> Vec<u8> {
    let mut minf = Vec::new();
    if let Some(stts) = stts {
        minf.extend(boxed(b"stbl", &stts));
    }
    let mut mdia = mdhd;
    mdia.extend(boxed(b"minf", &minf));
    boxed(b"trak", &boxed(b"mdia", &mdia))
}

/// `ftyp`, then `moov` with `mvhd` and `tracks`, then `mdat` with `payload`.
pub fn movie(mvhd: Vec<u8>, tracks: Vec<Vec<u8>>, payload: &[u8]) -> Vec<u8> {
    let mut data = boxed(b"ftyp", b"isom\0\0\x02\0isomiso2");
    let mut moov = mvhd;
    for track in tracks {
        moov.extend(track);
    }
    data.extend(boxed(b"moov", &moov));
    data.extend(boxed(b"mdat", payload));
    data
}

/// A single-track movie: mvhd and mdhd share `timescale`/`duration`, and
/// every sample lasts `sample_delta`.
pub fn simple_movie(timescale: u32, duration: u64, sample_delta: u32) -> Vec<u8> {
    movie(
        mvhd(0, timescale, duration),
        vec![trak(
            mdhd(0, timescale, duration),
            Some(stts(&[(250, sample_delta)])),
        )],
        &[0xAB; 64],
    )
}
