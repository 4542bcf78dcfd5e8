use std::io::Read;

use tracing::{debug, warn};

use super::{
    chunk::{ChunkHeader, ChunkReader},
    format::WaveFormat,
    DecoderError, Sample,
};

/// Upper bound on samples reserved up front; buffers grow past it as data actually arrives.
const MAX_PREALLOC_SAMPLES: usize = 1 << 22;

/// The integer sample layouts that can be decoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SampleWidth {
    Unsigned8,
    Signed16,
    Signed24,
}

impl SampleWidth {
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Self::Unsigned8),
            16 => Some(Self::Signed16),
            24 => Some(Self::Signed24),
            _ => None,
        }
    }

    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            Self::Unsigned8 => 1,
            Self::Signed16 => 2,
            Self::Signed24 => 3,
        }
    }

    /// Decodes and normalizes one sample; `bytes` holds exactly `self.bytes()` bytes.
    #[inline(always)]
    pub fn decode(self, bytes: &[u8]) -> Sample {
        match self {
            Self::Unsigned8 => normalize_u8(bytes[0]),
            Self::Signed16 => normalize_i16(i16::from_le_bytes([bytes[0], bytes[1]])),
            Self::Signed24 => normalize_i24([bytes[0], bytes[1], bytes[2]]),
        }
    }
}

/// Maps an unsigned 8-bit sample onto `0.0..=1.0`.
#[inline(always)]
fn normalize_u8(raw: u8) -> Sample {
    raw as Sample * (1.0 / 255.0)
}

#[inline(always)]
fn normalize_i16(raw: i16) -> Sample {
    raw as Sample * (1.0 / 32767.0)
}

/// Sign-extends a little-endian 24-bit sample and scales it by `1 / 8388607`.
#[inline(always)]
fn normalize_i24(bytes: [u8; 3]) -> Sample {
    let mut raw = u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16;
    if bytes[2] & 0x80 != 0 {
        raw |= 0xFF00_0000;
    }
    raw as i32 as Sample * (1.0 / 8_388_607.0)
}

/// Decodes the body of a `data` chunk into one buffer per channel.
///
/// Frames are read in stream order and each sample is appended to its channel's buffer.
/// Bytes of a trailing partial frame are consumed and dropped.
///
/// A body cut short by the end of the stream keeps the whole frames read so far, unless
/// `strict` is set, in which case it fails with `UnexpectedEof`.
pub(crate) fn decode_data<R: Read>(
    chunks: &mut ChunkReader<R>,
    header: &ChunkHeader,
    format: &WaveFormat,
    strict: bool,
) -> Result<Vec<Vec<Sample>>, DecoderError> {
    let width = SampleWidth::from_bits(format.bits_per_sample).ok_or(
        DecoderError::UnsupportedBitDepth {
            offset: header.offset,
            bits: format.bits_per_sample,
        },
    )?;
    let channel_count = usize::from(format.channel_count);
    let sample_count = sample_count(header.size, format.channel_count, format.bits_per_sample);

    debug!(
        offset = header.offset,
        size = header.size,
        channels = channel_count,
        bits = format.bits_per_sample,
        sample_count,
        "decoding data chunk"
    );

    let capacity = (sample_count as usize).min(MAX_PREALLOC_SAMPLES / channel_count);
    let mut channels: Vec<Vec<Sample>> = (0..channel_count)
        .map(|_| Vec::with_capacity(capacity))
        .collect();

    let mut frame = vec![0; channel_count * width.bytes()];
    for decoded in 0..sample_count {
        if strict {
            chunks.read_exact_bytes(&mut frame)?;
        } else if chunks.fill(&mut frame)? < frame.len() {
            warn!(
                offset = header.offset,
                declared = sample_count,
                decoded,
                "data chunk truncated by end of stream"
            );
            return Ok(channels);
        }
        for (channel, bytes) in channels.iter_mut().zip(frame.chunks_exact(width.bytes())) {
            channel.push(width.decode(bytes));
        }
    }

    let consumed = u64::from(sample_count) * frame.len() as u64;
    let remainder = u64::from(header.size) - consumed;
    if remainder > 0 {
        debug!(remainder, "dropping partial trailing frame");
        chunks.skip(remainder)?;
    }

    Ok(channels)
}

/// Whole frames in a `data` body of `size` bytes.
#[inline]
pub(crate) fn sample_count(size: u32, channel_count: u16, bits_per_sample: u16) -> u32 {
    (u64::from(size) * 8 / u64::from(channel_count) / u64::from(bits_per_sample)) as u32
}

/// Divides every sample by the largest magnitude found across all channels.
///
/// Leaves buffers with no non-zero sample untouched.
pub(crate) fn normalize_peak(channels: &mut [Vec<Sample>]) {
    let peak = channels
        .iter()
        .flatten()
        .fold(0.0 as Sample, |peak, sample| peak.max(sample.abs()));
    if peak == 0.0 || !peak.is_finite() {
        return;
    }
    for sample in channels.iter_mut().flatten() {
        *sample /= peak;
    }
}
