use std::{
    fmt::{self, Display},
    io::{self, Read},
};

use tracing::debug;

use super::DecoderError;

/// A four-character RIFF chunk identifier, kept exactly as the bytes appear in the stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    /// The outer RIFF container.
    pub const RIFF: ChunkId = ChunkId(*b"RIFF");
    /// The RIFF form type used by audio files.
    pub const WAVE: ChunkId = ChunkId(*b"WAVE");
    /// The format description chunk.
    pub const FMT: ChunkId = ChunkId(*b"fmt ");
    /// The sample data chunk.
    pub const DATA: ChunkId = ChunkId(*b"data");

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            // Every byte is printable ASCII at this point
            write!(f, "'{}'", self.0.iter().map(|&b| b as char).collect::<String>())
        } else {
            write!(
                f,
                "0x{:02X}{:02X}{:02X}{:02X}",
                self.0[0], self.0[1], self.0[2], self.0[3]
            )
        }
    }
}

/// The 8-byte header that precedes every chunk body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ChunkHeader {
    pub id: ChunkId,
    /// Declared body size, excluding the header and any pad byte.
    pub size: u32,
    /// Byte offset of the header within the stream.
    pub offset: u64,
}

/// Walks a RIFF stream chunk by chunk, only ever moving forward.
pub(crate) struct ChunkReader<R> {
    reader: R,
    offset: u64,
    word_aligned: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(reader: R, word_aligned: bool) -> Self {
        Self {
            reader,
            offset: 0,
            word_aligned,
        }
    }

    /// Current position of the cursor, in bytes from the start of the stream.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the next chunk header.
    ///
    /// Returns `None` at the end of the stream, including when fewer than 8 bytes remain.
    pub fn next_header(&mut self) -> Result<Option<ChunkHeader>, DecoderError> {
        let offset = self.offset;
        let mut buf = [0; 8];
        let read = self.fill(&mut buf)?;
        if read < buf.len() {
            if read > 0 {
                debug!(offset, trailing = read, "ignoring truncated chunk header at end of stream");
            }
            return Ok(None);
        }

        Ok(Some(ChunkHeader {
            id: ChunkId([buf[0], buf[1], buf[2], buf[3]]),
            size: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            offset,
        }))
    }

    /// Reads a bare 4-byte identifier, such as the RIFF form type.
    pub fn read_id(&mut self) -> Result<Option<ChunkId>, DecoderError> {
        let mut buf = [0; 4];
        Ok(match self.fill(&mut buf)? {
            4 => Some(ChunkId(buf)),
            _ => None,
        })
    }

    /// Reads the whole body of `header` into memory.
    pub fn read_body(&mut self, header: &ChunkHeader) -> Result<Vec<u8>, DecoderError> {
        let mut body = Vec::new();
        let expected = u64::from(header.size);
        let result = self.by_ref().take(expected).read_to_end(&mut body);
        let read = result.map_err(|err| self.io_error(err))?;
        if (read as u64) < expected {
            return Err(self.io_error(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} chunk body ends after {} of {} bytes", header.id, read, expected),
            )));
        }
        Ok(body)
    }

    /// Fills `buf` completely or fails with an I/O error.
    #[inline]
    pub fn read_exact_bytes(&mut self, buf: &mut [u8]) -> Result<(), DecoderError> {
        if self.fill(buf)? < buf.len() {
            return Err(self.io_error(io::ErrorKind::UnexpectedEof.into()));
        }
        Ok(())
    }

    /// Moves the cursor forward by up to `len` bytes and returns how many were skipped.
    ///
    /// Fewer than `len` bytes are skipped only when the stream ends first.
    pub fn skip(&mut self, len: u64) -> Result<u64, DecoderError> {
        let result = io::copy(&mut self.by_ref().take(len), &mut io::sink());
        result.map_err(|err| self.io_error(err))
    }

    /// Skips the body of `header` without interpreting it.
    pub fn skip_body(&mut self, header: &ChunkHeader) -> Result<(), DecoderError> {
        let skipped = self.skip(u64::from(header.size))?;
        if skipped < u64::from(header.size) {
            debug!(
                offset = header.offset,
                tag = %header.id,
                declared = header.size,
                skipped,
                "chunk body truncated by end of stream"
            );
        }
        self.end_chunk(header)
    }

    /// Consumes the pad byte after an odd-sized body when word alignment is enabled.
    pub fn end_chunk(&mut self, header: &ChunkHeader) -> Result<(), DecoderError> {
        if self.word_aligned && header.size % 2 == 1 {
            self.skip(1)?;
        }
        Ok(())
    }

    /// Reads until `buf` is full or the stream ends, returning the byte count.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize, DecoderError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(self.io_error(err)),
            }
        }
        Ok(filled)
    }

    #[inline]
    fn io_error(&self, source: io::Error) -> DecoderError {
        DecoderError::IOError {
            offset: self.offset,
            source,
        }
    }
}

impl<R: Read> Read for ChunkReader<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.offset += n as u64;
        Ok(n)
    }
}
