use std::fmt::{self, Display};

use tracing::{debug, warn};

use super::DecoderError;

/// Size of the base `fmt ` body shared by every format code.
const BASE_FMT_LEN: usize = 16;
/// Size of a `fmt ` body carrying the extensible sub-block.
const EXTENSIBLE_FMT_LEN: usize = 40;

/// `KSDATAFORMAT_SUBTYPE_PCM` as stored in a file: `00000001-0000-0010-8000-00AA00389B71`.
pub const PCM_SUBFORMAT: [u8; 16] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// Everything after the embedded format code in a standard sub-format GUID.
const SUBFORMAT_GUID_TAIL: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// The codec identifier from a `fmt ` chunk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormatCode {
    /// Uncompressed integer PCM.
    Pcm,
    /// IEEE floating-point samples.
    IeeeFloat,
    /// ITU G.711 A-law.
    ALaw,
    /// ITU G.711 mu-law.
    MuLaw,
    /// IMA ADPCM.
    ImaAdpcm,
    /// Yamaha ITU G.723 ADPCM.
    YamahaG723Adpcm,
    /// GSM 6.10.
    Gsm610,
    /// ITU G.721 ADPCM.
    G721Adpcm,
    /// MPEG audio.
    Mpeg,
    /// Codec identity is deferred to the sub-format GUID.
    Extensible,
    /// Any other code.
    Unknown(u16),
}

impl FormatCode {
    /// The numeric code as stored in the file.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Pcm => 0x0001,
            Self::IeeeFloat => 0x0003,
            Self::ALaw => 0x0006,
            Self::MuLaw => 0x0007,
            Self::ImaAdpcm => 0x0011,
            Self::YamahaG723Adpcm => 0x0016,
            Self::Gsm610 => 0x0031,
            Self::G721Adpcm => 0x0040,
            Self::Mpeg => 0x0050,
            Self::Extensible => 0xFFFE,
            Self::Unknown(code) => code,
        }
    }
}

impl From<u16> for FormatCode {
    fn from(code: u16) -> Self {
        match code {
            0x0001 => Self::Pcm,
            0x0003 => Self::IeeeFloat,
            0x0006 => Self::ALaw,
            0x0007 => Self::MuLaw,
            0x0011 => Self::ImaAdpcm,
            0x0016 => Self::YamahaG723Adpcm,
            0x0031 => Self::Gsm610,
            0x0040 => Self::G721Adpcm,
            0x0050 => Self::Mpeg,
            0xFFFE => Self::Extensible,
            other => Self::Unknown(other),
        }
    }
}

impl From<FormatCode> for u16 {
    #[inline]
    fn from(code: FormatCode) -> Self {
        code.as_u16()
    }
}

impl Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pcm => write!(f, "PCM"),
            Self::IeeeFloat => write!(f, "IEEE Float"),
            Self::ALaw => write!(f, "A-law"),
            Self::MuLaw => write!(f, "mu-law"),
            Self::ImaAdpcm => write!(f, "IMA ADPCM"),
            Self::YamahaG723Adpcm => write!(f, "Yamaha G.723 ADPCM"),
            Self::Gsm610 => write!(f, "GSM 6.10"),
            Self::G721Adpcm => write!(f, "G.721 ADPCM"),
            Self::Mpeg => write!(f, "MPEG"),
            Self::Extensible => write!(f, "Extensible"),
            Self::Unknown(code) => write!(f, "unknown (0x{:04X})", code),
        }
    }
}

/// The extra fields carried by a `WAVE_FORMAT_EXTENSIBLE` format chunk.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtensibleFormat {
    /// Bits of actual precision within each sample container.
    pub valid_bits_per_sample: u16,
    /// Speaker position bitmask.
    pub channel_mask: u32,
    /// Sub-format GUID, byte for byte as stored.
    pub sub_format: [u8; 16],
}

impl ExtensibleFormat {
    /// Whether the sub-format is integer PCM.
    #[inline]
    pub fn is_pcm(&self) -> bool {
        self.sub_format == PCM_SUBFORMAT
    }

    /// The format code embedded in a standard sub-format GUID, if the GUID follows that layout.
    pub fn sub_format_code(&self) -> Option<FormatCode> {
        if self.sub_format[2..] == SUBFORMAT_GUID_TAIL {
            Some(u16::from_le_bytes([self.sub_format[0], self.sub_format[1]]).into())
        } else {
            None
        }
    }
}

/// The audio format described by a `fmt ` chunk.
///
/// `byte_rate` and `block_align` are kept as declared. They are only compared with the
/// derived values when the decoder runs in strict mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_code: FormatCode,
    pub channel_count: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Present only when `format_code` is `Extensible`.
    pub extension: Option<ExtensibleFormat>,
}

impl WaveFormat {
    /// Interprets a complete `fmt ` body found at `offset`.
    ///
    /// Only plain PCM and extensible PCM are accepted. The extensible sub-block is read only
    /// for the `Extensible` format code.
    pub(crate) fn parse(body: &[u8], offset: u64) -> Result<Self, DecoderError> {
        if body.len() < BASE_FMT_LEN {
            return Err(DecoderError::MalformedFormat {
                offset,
                reason: "body is shorter than 16 bytes",
            });
        }

        let format_code = FormatCode::from(le_u16(&body[0..2]));
        let mut format = WaveFormat {
            format_code,
            channel_count: le_u16(&body[2..4]),
            sample_rate: le_u32(&body[4..8]),
            byte_rate: le_u32(&body[8..12]),
            block_align: le_u16(&body[12..14]),
            bits_per_sample: le_u16(&body[14..16]),
            extension: None,
        };

        match format_code {
            FormatCode::Pcm => {}
            FormatCode::Extensible => {
                if body.len() < EXTENSIBLE_FMT_LEN {
                    return Err(DecoderError::MalformedFormat {
                        offset,
                        reason: "extensible body is shorter than 40 bytes",
                    });
                }
                // body[16..18] is the extension size, implied by the length check above
                let mut sub_format = [0; 16];
                sub_format.copy_from_slice(&body[24..40]);
                let extension = ExtensibleFormat {
                    valid_bits_per_sample: le_u16(&body[18..20]),
                    channel_mask: le_u32(&body[20..24]),
                    sub_format,
                };
                debug!(
                    offset,
                    sub_format = ?extension.sub_format_code(),
                    valid_bits = extension.valid_bits_per_sample,
                    channel_mask = extension.channel_mask,
                    "resolved extensible sub-format"
                );
                if !extension.is_pcm() {
                    return Err(DecoderError::UnsupportedFormat {
                        offset,
                        format: extension.sub_format_code().unwrap_or(FormatCode::Extensible),
                    });
                }
                format.extension = Some(extension);
            }
            other => {
                return Err(DecoderError::UnsupportedFormat {
                    offset,
                    format: other,
                })
            }
        }

        if format.channel_count == 0 {
            return Err(DecoderError::MalformedFormat {
                offset,
                reason: "channel count is zero",
            });
        }

        Ok(format)
    }

    /// Bytes occupied by one sample of one channel.
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        (usize::from(self.bits_per_sample) + 7) / 8
    }

    /// The block alignment implied by the channel count and bit depth.
    #[inline]
    pub fn expected_block_align(&self) -> u32 {
        u32::from(self.channel_count) * self.bytes_per_sample() as u32
    }

    /// The byte rate implied by the sample rate and derived block alignment.
    #[inline]
    pub fn expected_byte_rate(&self) -> u32 {
        self.sample_rate.wrapping_mul(self.expected_block_align())
    }

    /// Compares the declared `block_align` and `byte_rate` with the derived values.
    ///
    /// A mismatch is only logged unless `strict` is set.
    pub(crate) fn check_consistency(&self, offset: u64, strict: bool) -> Result<(), DecoderError> {
        let checks = [
            ("block_align", u32::from(self.block_align), self.expected_block_align()),
            ("byte_rate", self.byte_rate, self.expected_byte_rate()),
        ];
        for (field, declared, expected) in checks {
            if declared == expected {
                continue;
            }
            if strict {
                return Err(DecoderError::InconsistentFormat {
                    offset,
                    field,
                    declared,
                    expected,
                });
            }
            warn!(offset, field, declared, expected, "format chunk field disagrees with derived value");
        }
        Ok(())
    }

    /// Display name of the resolved codec, e.g. `PCM` or `Extensible (PCM)`.
    pub fn resolved_name(&self) -> String {
        match (self.format_code, self.extension.and_then(|ext| ext.sub_format_code())) {
            (FormatCode::Extensible, Some(sub)) => format!("Extensible ({})", sub),
            (code, _) => code.to_string(),
        }
    }
}

#[inline]
fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

#[inline]
fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base_body(code: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
        let align = channels * (bits / 8);
        let mut body = Vec::new();
        body.extend_from_slice(&code.to_le_bytes());
        body.extend_from_slice(&channels.to_le_bytes());
        body.extend_from_slice(&rate.to_le_bytes());
        body.extend_from_slice(&(rate * u32::from(align)).to_le_bytes());
        body.extend_from_slice(&align.to_le_bytes());
        body.extend_from_slice(&bits.to_le_bytes());
        body
    }

    fn extensible_body(channels: u16, bits: u16, sub_format: [u8; 16]) -> Vec<u8> {
        let mut body = base_body(0xFFFE, channels, 48000, bits);
        body.extend_from_slice(&22u16.to_le_bytes());
        body.extend_from_slice(&bits.to_le_bytes());
        body.extend_from_slice(&0x3u32.to_le_bytes());
        body.extend_from_slice(&sub_format);
        body
    }

    #[test]
    fn parses_plain_pcm() {
        let format = WaveFormat::parse(&base_body(1, 2, 44100, 16), 12).unwrap();
        assert_eq!(
            format,
            WaveFormat {
                format_code: FormatCode::Pcm,
                channel_count: 2,
                sample_rate: 44100,
                byte_rate: 176400,
                block_align: 4,
                bits_per_sample: 16,
                extension: None,
            }
        );
        assert_eq!(format.resolved_name(), "PCM");
    }

    #[test]
    fn pcm_ignores_trailing_extension_size() {
        let mut body = base_body(1, 1, 8000, 8);
        body.extend_from_slice(&0u16.to_le_bytes());
        let format = WaveFormat::parse(&body, 12).unwrap();
        assert_eq!(format.extension, None);
    }

    #[test]
    fn parses_extensible_pcm() {
        let format = WaveFormat::parse(&extensible_body(2, 24, PCM_SUBFORMAT), 12).unwrap();
        let ext = format.extension.unwrap();
        assert_eq!(format.format_code, FormatCode::Extensible);
        assert_eq!(ext.valid_bits_per_sample, 24);
        assert_eq!(ext.channel_mask, 0x3);
        assert_eq!(ext.sub_format_code(), Some(FormatCode::Pcm));
        assert_eq!(format.resolved_name(), "Extensible (PCM)");
    }

    #[test]
    fn rejects_extensible_float() {
        let mut float_guid = PCM_SUBFORMAT;
        float_guid[0] = 0x03;
        match WaveFormat::parse(&extensible_body(2, 32, float_guid), 12) {
            Err(DecoderError::UnsupportedFormat { offset, format }) => {
                assert_eq!(offset, 12);
                assert_eq!(format, FormatCode::IeeeFloat);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_non_pcm_codes() {
        for code in [0x0003u16, 0x0006, 0x0007, 0x0011, 0x0016, 0x0031, 0x0040, 0x0050, 0x1234] {
            let result = WaveFormat::parse(&base_body(code, 1, 8000, 16), 0);
            assert!(
                matches!(result, Err(DecoderError::UnsupportedFormat { format, .. }) if format.as_u16() == code),
                "code 0x{:04X} was not rejected",
                code
            );
        }
    }

    #[test]
    fn rejects_short_bodies() {
        assert!(matches!(
            WaveFormat::parse(&[1, 0, 1, 0], 0),
            Err(DecoderError::MalformedFormat { .. })
        ));
        let short_extensible = base_body(0xFFFE, 2, 48000, 16);
        assert!(matches!(
            WaveFormat::parse(&short_extensible, 0),
            Err(DecoderError::MalformedFormat { .. })
        ));
    }

    #[test]
    fn rejects_zero_channels() {
        assert!(matches!(
            WaveFormat::parse(&base_body(1, 0, 8000, 16), 0),
            Err(DecoderError::MalformedFormat { reason: "channel count is zero", .. })
        ));
    }

    #[test]
    fn consistency_check_is_permissive_unless_strict() {
        let mut format = WaveFormat::parse(&base_body(1, 2, 44100, 16), 0).unwrap();
        format.block_align = 3;
        assert!(format.check_consistency(0, false).is_ok());
        match format.check_consistency(0, true) {
            Err(DecoderError::InconsistentFormat {
                field,
                declared,
                expected,
                ..
            }) => {
                assert_eq!(field, "block_align");
                assert_eq!(declared, 3);
                assert_eq!(expected, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn format_code_round_trips_through_u16() {
        assert_eq!(FormatCode::from(0x0050), FormatCode::Mpeg);
        assert_eq!(u16::from(FormatCode::Unknown(0x0002)), 0x0002);
        assert_eq!(FormatCode::Unknown(0x0002).to_string(), "unknown (0x0002)");
    }
}
