//! # riffwave
//!
//! riffwave is a small streaming decoder for RIFF/WAVE files. It turns uncompressed PCM audio
//! into normalized `f32` samples, one buffer per channel.
//!
//! ## Usage
//!
//! The `Decoder` struct handles opening and decoding WAVE streams. Use `Decoder::open()` to open a
//! file, or `Decoder::from_reader()` for any other byte source, then call `decode()` to get a
//! `WaveAudio`.
//!
//! ```no_run
//! let audio = riffwave::Decoder::open("sine.wav")?.decode()?;
//! println!("{}", audio);
//! let left = audio.channel(0)?;
//! println!("{} samples in the first channel", left.len());
//! # Ok::<(), riffwave::DecoderError>(())
//! ```
//!
//! 8-bit, 16-bit and 24-bit integer PCM are supported, in both the plain and the extensible
//! format layout. Other codecs are rejected with `DecoderError::UnsupportedFormat`.
//!
//! Each depth is normalized with its own constant:
//!
//! * **8-bit** - the unsigned byte times `1 / 255`.
//! * **16-bit** - the signed value times `1 / 32767`.
//! * **24-bit** - the sign-extended value times `1 / 8388607`.

mod decoder;

pub use decoder::*;
