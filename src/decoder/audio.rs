use std::{
    fmt::{self, Display},
    time::Duration,
};

use super::{
    format::{ExtensibleFormat, FormatCode, WaveFormat},
    samples, DecoderError, Sample,
};

/// Decoded PCM audio, stored one buffer per channel.
///
/// A `WaveAudio` only exists once a stream has produced both a format and a data chunk,
/// so every accessor reflects a complete decode.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveAudio {
    format: WaveFormat,
    sample_count: u32,
    samples: Vec<Vec<Sample>>,
}

impl WaveAudio {
    pub(crate) fn new(format: WaveFormat, samples: Vec<Vec<Sample>>) -> Self {
        let sample_count = samples.first().map_or(0, |channel| channel.len() as u32);
        Self {
            format,
            sample_count,
            samples,
        }
    }

    /// Gets the full format description.
    #[inline]
    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    #[inline]
    pub fn format_code(&self) -> FormatCode {
        self.format.format_code
    }

    /// Gets the number of channels in the audio.
    #[inline]
    pub fn channel_count(&self) -> u16 {
        self.format.channel_count
    }

    /// Gets the sample rate of the audio, in frames per second.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Gets the byte rate declared by the file.
    #[inline]
    pub fn byte_rate(&self) -> u32 {
        self.format.byte_rate
    }

    /// Gets the block alignment declared by the file.
    #[inline]
    pub fn block_align(&self) -> u16 {
        self.format.block_align
    }

    #[inline]
    pub fn bits_per_sample(&self) -> u16 {
        self.format.bits_per_sample
    }

    /// Gets the number of samples in each channel.
    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Gets the extensible format fields, if the file used that layout.
    #[inline]
    pub fn extension(&self) -> Option<&ExtensibleFormat> {
        self.format.extension.as_ref()
    }

    /// Gets the playing time of the audio.
    pub fn duration(&self) -> Duration {
        match self.format.sample_rate {
            0 => Duration::ZERO,
            rate => Duration::from_secs_f64(f64::from(self.sample_count) / f64::from(rate)),
        }
    }

    /// Gets the samples of one channel.
    ///
    /// Fails with `DecoderError::IndexOutOfRange` if `index` is not below `channel_count()`.
    pub fn channel(&self, index: usize) -> Result<&[Sample], DecoderError> {
        self.samples
            .get(index)
            .map(Vec::as_slice)
            .ok_or(DecoderError::IndexOutOfRange {
                index,
                channels: self.format.channel_count,
            })
    }

    /// Iterates over the channels in order.
    pub fn channels(&self) -> impl ExactSizeIterator<Item = &[Sample]> + '_ {
        self.samples.iter().map(Vec::as_slice)
    }

    /// Iterates over all samples with channels interleaved, as they were stored in the file.
    #[inline]
    pub fn interleaved(&self) -> SampleIterator<'_> {
        SampleIterator {
            audio: self,
            frame: 0,
            channel: 0,
        }
    }

    /// Copies up to `len` frames starting at frame `start` into one interleaved block.
    ///
    /// The block is clipped at the end of the audio and is empty once `start` passes it.
    pub fn frames(&self, start: usize, len: usize) -> Vec<Sample> {
        let end = start.saturating_add(len).min(self.sample_count as usize);
        let mut block = Vec::with_capacity(end.saturating_sub(start) * self.samples.len());
        for frame in start..end {
            block.extend(self.samples.iter().map(|channel| channel[frame]));
        }
        block
    }

    /// Gets the largest sample magnitude across all channels.
    pub fn peak(&self) -> Sample {
        self.samples
            .iter()
            .flatten()
            .fold(0.0, |peak: Sample, sample| peak.max(sample.abs()))
    }

    /// Scales every channel by the same factor so that the loudest sample reaches ±1.0.
    ///
    /// Silent audio is returned unchanged. Applying this twice gives the same result as once.
    pub fn normalized(mut self) -> Self {
        samples::normalize_peak(&mut self.samples);
        self
    }
}

impl Display for WaveAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sample Rate: {}Hz; Format: {}; Channels: {}; Byte Rate: {}; Block Align: {}; Bits Per Sample: {}; Samples: {}",
            self.format.sample_rate,
            self.format.resolved_name(),
            self.format.channel_count,
            self.format.byte_rate,
            self.format.block_align,
            self.format.bits_per_sample,
            self.sample_count,
        )
    }
}

/// Iterates over decoded samples. Channels are interleaved.
#[derive(Debug, Clone)]
pub struct SampleIterator<'a> {
    audio: &'a WaveAudio,
    frame: usize,
    channel: usize,
}

impl<'a> Iterator for SampleIterator<'a> {
    type Item = Sample;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let sample = *self.audio.samples.get(self.channel)?.get(self.frame)?;
        self.channel += 1;
        if self.channel == self.audio.samples.len() {
            self.channel = 0;
            self.frame += 1;
        }
        Some(sample)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let channels = self.audio.samples.len();
        let total = self.audio.sample_count as usize * channels;
        let remaining = total.saturating_sub(self.frame * channels + self.channel);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for SampleIterator<'a> {}
