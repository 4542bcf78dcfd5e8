//! Builders for synthetic RIFF/WAVE streams.

#![allow(dead_code)]

use std::io::Cursor;

use riffwave::{Decoder, DecoderError, WaveAudio, PCM_SUBFORMAT};

/// A chunk with an arbitrary tag and body.
pub fn chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut bytes = tag.to_vec();
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// A 16-byte base `fmt ` chunk with consistent byte rate and block align.
pub fn fmt_chunk(format_code: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    chunk(b"fmt ", &fmt_body(format_code, channels, sample_rate, bits))
}

pub fn fmt_body(format_code: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * ((bits + 7) / 8);
    let mut body = Vec::with_capacity(16);
    body.extend_from_slice(&format_code.to_le_bytes());
    body.extend_from_slice(&channels.to_le_bytes());
    body.extend_from_slice(&sample_rate.to_le_bytes());
    body.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    body.extend_from_slice(&block_align.to_le_bytes());
    body.extend_from_slice(&bits.to_le_bytes());
    body
}

/// A 40-byte extensible `fmt ` chunk carrying `sub_format`.
pub fn extensible_fmt_chunk(channels: u16, sample_rate: u32, bits: u16, sub_format: [u8; 16]) -> Vec<u8> {
    let mut body = fmt_body(0xFFFE, channels, sample_rate, bits);
    body.extend_from_slice(&22u16.to_le_bytes());
    body.extend_from_slice(&bits.to_le_bytes());
    body.extend_from_slice(&((1u32 << channels) - 1).to_le_bytes());
    body.extend_from_slice(&sub_format);
    chunk(b"fmt ", &body)
}

pub fn pcm_guid() -> [u8; 16] {
    PCM_SUBFORMAT
}

/// Wraps `chunks` in a `RIFF`/`WAVE` header.
pub fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body = chunks.concat();
    let mut bytes = b"RIFF".to_vec();
    bytes.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(&body);
    bytes
}

/// Interleaves 16-bit frames into a `data` body.
pub fn pcm16(frames: &[Vec<i16>]) -> Vec<u8> {
    frames
        .iter()
        .flatten()
        .flat_map(|sample| sample.to_le_bytes())
        .collect()
}

pub fn decode(bytes: Vec<u8>) -> Result<WaveAudio, DecoderError> {
    Decoder::from_reader(Cursor::new(bytes)).decode()
}
