//! Property-based checks of the decoder against synthetic streams.

mod common;

use proptest::prelude::*;

use common::*;

/// Strategy for a block of interleaved 16-bit frames: (channels, frames).
fn frames_16() -> impl Strategy<Value = (u16, Vec<Vec<i16>>)> {
    (1u16..=8, 0usize..64).prop_flat_map(|(channels, len)| {
        let frame = prop::collection::vec(any::<i16>(), channels as usize);
        (Just(channels), prop::collection::vec(frame, len))
    })
}

proptest! {
    /// Every sample lands in its channel at its frame index, scaled by 1 / 32767.
    #[test]
    fn pcm16_decodes_channel_major((channels, frames) in frames_16()) {
        let bytes = riff(&[
            fmt_chunk(1, channels, 44100, 16),
            chunk(b"data", &pcm16(&frames)),
        ]);
        let audio = decode(bytes).unwrap();

        prop_assert_eq!(audio.channel_count(), channels);
        prop_assert_eq!(audio.sample_count() as usize, frames.len());
        for c in 0..usize::from(channels) {
            let channel = audio.channel(c).unwrap();
            prop_assert_eq!(channel.len(), frames.len());
            for (s, frame) in frames.iter().enumerate() {
                prop_assert_eq!(channel[s], frame[c] as f32 * (1.0 / 32767.0));
            }
        }
        prop_assert!(audio.channel(usize::from(channels)).is_err());
    }

    /// Unknown chunks of any even size before the data chunk never change the result.
    #[test]
    fn unknown_chunks_do_not_disturb_data(
        (channels, frames) in frames_16(),
        junk in prop::collection::vec(any::<u8>(), 0..128).prop_map(|mut v| { v.truncate(v.len() & !1); v }),
    ) {
        let data = chunk(b"data", &pcm16(&frames));
        let plain = decode(riff(&[fmt_chunk(1, channels, 8000, 16), data.clone()])).unwrap();
        let padded = decode(riff(&[
            fmt_chunk(1, channels, 8000, 16),
            chunk(b"LIST", &junk),
            data,
        ]))
        .unwrap();
        prop_assert_eq!(plain, padded);
    }

    /// Peak normalization is idempotent and leaves a unit peak for non-silent audio.
    #[test]
    fn normalization_is_idempotent((channels, frames) in frames_16()) {
        let bytes = riff(&[
            fmt_chunk(1, channels, 8000, 16),
            chunk(b"data", &pcm16(&frames)),
        ]);
        let audio = decode(bytes).unwrap();
        let silent = audio.peak() == 0.0;

        let once = audio.normalized();
        let twice = once.clone().normalized();
        if !silent {
            prop_assert_eq!(once.peak(), 1.0);
        }
        prop_assert_eq!(once, twice);
    }

    /// Arbitrary bytes after a valid header never panic the decoder.
    #[test]
    fn arbitrary_chunk_streams_never_panic(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut bytes = b"RIFF\x00\x00\x00\x00WAVE".to_vec();
        bytes.extend_from_slice(&body);
        let _ = decode(bytes);
    }
}
