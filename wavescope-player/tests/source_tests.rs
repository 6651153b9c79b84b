//! Streaming source integration tests
//!
//! Chunked reads, end-of-file behavior and frame-accurate seeking of the
//! playback-side cursor.

mod helpers;

use helpers::audio_generator::{generate_ramp_wav, sample_value, write_wav_i8, TEST_SAMPLE_RATE};
use wavescope_player::audio::source::WavSource;

/// Expected f32 frame value for a 16-bit ramp fixture.
fn expected_16(frame: usize, channel: usize) -> f32 {
    sample_value(frame, channel) as f32 / 32768.0
}

#[test]
fn chunked_reads_convert_and_advance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    generate_ramp_wav(&path, 2, 100).unwrap();

    let mut source = WavSource::open(&path).unwrap();
    assert_eq!(source.frame_count(), 100);
    assert_eq!(source.position(), 0);
    assert_eq!(source.format().channel_count, 2);

    let frames = source.read_chunk(30).unwrap();
    assert_eq!(frames.len(), 30);
    assert_eq!(source.position(), 30);

    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.left, expected_16(i, 0));
        assert_eq!(frame.right, expected_16(i, 1));
    }

    // Next chunk continues where the last one ended
    let frames = source.read_chunk(10).unwrap();
    assert_eq!(frames[0].left, expected_16(30, 0));
    assert_eq!(source.position(), 40);
}

#[test]
fn read_past_end_returns_partial_then_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.wav");
    generate_ramp_wav(&path, 2, 100).unwrap();

    let mut source = WavSource::open(&path).unwrap();
    assert_eq!(source.read_chunk(64).unwrap().len(), 64);
    assert_eq!(source.read_chunk(64).unwrap().len(), 36);
    assert_eq!(source.position(), 100);
    assert_eq!(source.read_chunk(64).unwrap().len(), 0);
    assert_eq!(source.position(), 100);
}

#[test]
fn seek_repositions_the_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    generate_ramp_wav(&path, 2, 100).unwrap();

    let mut source = WavSource::open(&path).unwrap();
    assert_eq!(source.seek(50).unwrap(), 50);
    assert_eq!(source.position(), 50);

    let frames = source.read_chunk(4).unwrap();
    assert_eq!(frames[0].left, expected_16(50, 0));
    assert_eq!(frames[3].right, expected_16(53, 1));

    // Seeking backward works the same way
    assert_eq!(source.seek(0).unwrap(), 0);
    let frames = source.read_chunk(1).unwrap();
    assert_eq!(frames[0].left, expected_16(0, 0));
}

#[test]
fn seek_clamps_into_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    generate_ramp_wav(&path, 1, 100).unwrap();

    let mut source = WavSource::open(&path).unwrap();
    assert_eq!(source.seek(u64::MAX).unwrap(), 100);
    assert_eq!(source.position(), 100);
    assert_eq!(source.read_chunk(16).unwrap().len(), 0);
}

#[test]
fn mono_sources_duplicate_into_both_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.wav");
    generate_ramp_wav(&path, 1, 64).unwrap();

    let mut source = WavSource::open(&path).unwrap();
    let frames = source.read_chunk(64).unwrap();
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.left, expected_16(i, 0));
        assert_eq!(frame.left, frame.right);
    }
}

#[test]
fn eight_bit_sources_scale_to_unit_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono8.wav");
    write_wav_i8(&path, 1, TEST_SAMPLE_RATE, &[-128, 0, 64, 127]).unwrap();

    let mut source = WavSource::open(&path).unwrap();
    let frames = source.read_chunk(8).unwrap();
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0].left, -1.0);
    assert_eq!(frames[1].left, 0.0);
    assert_eq!(frames[2].left, 0.5);
    assert_eq!(frames[3].left, 127.0 / 128.0);
}
