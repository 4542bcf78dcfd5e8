use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use thiserror::Error;
use tracing::{debug, warn};

use self::chunk::{ChunkHeader, ChunkReader};

mod audio;
mod chunk;
mod format;
mod samples;

pub use self::audio::{SampleIterator, WaveAudio};
pub use self::chunk::ChunkId;
pub use self::format::{ExtensibleFormat, FormatCode, WaveFormat, PCM_SUBFORMAT};

/// The type of decoded audio samples.
pub type Sample = f32;

/// A RIFF/WAVE decoder.
///
/// Use `Decoder::open` or `Decoder::from_reader`, then call `decode()` to read the whole stream.
pub struct Decoder<R: Read> {
    reader: R,
    options: DecoderOptions,
}

/// Settings that change how strictly a stream is interpreted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Consume the pad byte that follows an odd-sized chunk.
    pub word_aligned: bool,
    /// Fail when `block_align` or `byte_rate` disagree with the channel count and bit depth,
    /// or when a `data` chunk ends before its declared size.
    pub strict: bool,
    /// Apply peak normalization right after decoding.
    pub normalize: bool,
}

impl DecoderOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn word_aligned(mut self, word_aligned: bool) -> Self {
        self.word_aligned = word_aligned;
        self
    }

    #[inline]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[inline]
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

impl Decoder<File> {
    /// Attempts to open the specified WAVE file for decoding.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecoderError> {
        let f = File::open(path).map_err(|source| DecoderError::IOError { offset: 0, source })?;
        Ok(Self::from_reader(f))
    }
}

impl<R: Read> Decoder<R> {
    /// Wraps any byte source. Only forward reads are performed; `R` does not need `Seek`.
    #[inline]
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            options: DecoderOptions::default(),
        }
    }

    #[inline]
    pub fn with_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    /// Consumes the `Decoder` and decodes the whole stream in one pass.
    ///
    /// Nothing is returned unless both a `fmt ` and a `data` chunk were decoded.
    pub fn decode(self) -> Result<WaveAudio, DecoderError> {
        let options = self.options;
        let mut chunks = ChunkReader::new(BufReader::new(self.reader), options.word_aligned);
        let mut session = Session::Empty;
        while let Some(header) = chunks.next_header()? {
            session = session.advance(header, &mut chunks, &options)?;
        }

        let audio = session.finish(chunks.offset())?;
        Ok(if options.normalize {
            audio.normalized()
        } else {
            audio
        })
    }
}

/// Progress of a single pass over a stream.
///
/// Reaching the end of the stream in `DataDecoded` is the only way to produce a `WaveAudio`.
#[derive(Debug)]
enum Session {
    Empty,
    HeaderValidated,
    FormatKnown(WaveFormat),
    DataDecoded(WaveFormat, Vec<Vec<Sample>>),
}

impl Session {
    fn advance<R: Read>(
        self,
        header: ChunkHeader,
        chunks: &mut ChunkReader<R>,
        options: &DecoderOptions,
    ) -> Result<Self, DecoderError> {
        match (self, header.id) {
            (Session::Empty, ChunkId::RIFF) => match chunks.read_id()? {
                // The RIFF size field covers the whole file and is not needed
                Some(ChunkId::WAVE) => {
                    debug!(riff_size = header.size, "found RIFF/WAVE header");
                    Ok(Session::HeaderValidated)
                }
                found => Err(DecoderError::NotAWaveFile {
                    offset: header.offset + 8,
                    found,
                }),
            },
            (Session::Empty, found) => Err(DecoderError::NotAWaveFile {
                offset: header.offset,
                found: Some(found),
            }),
            (state, ChunkId::FMT) => {
                let body = chunks.read_body(&header)?;
                chunks.end_chunk(&header)?;
                let format = WaveFormat::parse(&body, header.offset)?;
                format.check_consistency(header.offset, options.strict)?;
                debug!(offset = header.offset, format = %format.resolved_name(), "read format chunk");
                Ok(match state {
                    Session::DataDecoded(_, samples) => {
                        warn!(
                            offset = header.offset,
                            "format chunk after data chunk, keeping decoded samples under the new format"
                        );
                        Session::DataDecoded(format, samples)
                    }
                    _ => Session::FormatKnown(format),
                })
            }
            (Session::HeaderValidated, ChunkId::DATA) => Err(DecoderError::FormatMissing {
                offset: header.offset,
            }),
            (Session::FormatKnown(format), ChunkId::DATA)
            | (Session::DataDecoded(format, _), ChunkId::DATA) => {
                let samples = samples::decode_data(chunks, &header, &format, options.strict)?;
                chunks.end_chunk(&header)?;
                Ok(Session::DataDecoded(format, samples))
            }
            (state, id) => {
                debug!(offset = header.offset, tag = %id, size = header.size, "skipping chunk");
                chunks.skip_body(&header)?;
                Ok(state)
            }
        }
    }

    fn finish(self, offset: u64) -> Result<WaveAudio, DecoderError> {
        match self {
            Session::Empty => Err(DecoderError::NotAWaveFile {
                offset: 0,
                found: None,
            }),
            Session::HeaderValidated => Err(DecoderError::FormatMissing { offset }),
            Session::FormatKnown(_) => Err(DecoderError::DataMissing),
            Session::DataDecoded(format, samples) => Ok(WaveAudio::new(format, samples)),
        }
    }
}

/// An error encountered while decoding a WAVE stream.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// The source could not be opened, or a read failed before the expected end of the stream.
    #[error("IO error at byte {offset}: {source}")]
    IOError {
        offset: u64,
        #[source]
        source: io::Error,
    },
    /// The stream does not begin with a `RIFF` chunk of form type `WAVE`.
    #[error("not a RIFF/WAVE stream (found {} at byte {offset})", .found.map_or("nothing".to_owned(), |id| id.to_string()))]
    NotAWaveFile {
        offset: u64,
        found: Option<ChunkId>,
    },
    /// The resolved codec is not PCM.
    #[error("format '{format}' is not supported, only PCM can be decoded (chunk at byte {offset})")]
    UnsupportedFormat { offset: u64, format: FormatCode },
    /// The sample width is not 8, 16 or 24 bits.
    #[error("{bits}-bit samples are not supported (chunk at byte {offset})")]
    UnsupportedBitDepth { offset: u64, bits: u16 },
    /// A channel index was not below the channel count.
    #[error("channel {index} does not exist, the audio has {channels} channel(s)")]
    IndexOutOfRange { index: usize, channels: u16 },
    /// Sample data was reached without a format to interpret it.
    #[error("no 'fmt ' chunk before byte {offset}")]
    FormatMissing { offset: u64 },
    /// The stream ended without a `data` chunk.
    #[error("stream ended without a 'data' chunk")]
    DataMissing,
    /// The `fmt ` chunk is structurally invalid.
    #[error("malformed 'fmt ' chunk at byte {offset}: {reason}")]
    MalformedFormat { offset: u64, reason: &'static str },
    /// A declared field disagrees with its derived value. Only raised in strict mode.
    #[error("'fmt ' chunk at byte {offset} declares {field} = {declared}, expected {expected}")]
    InconsistentFormat {
        offset: u64,
        field: &'static str,
        declared: u32,
        expected: u32,
    },
}
