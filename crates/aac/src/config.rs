use std::io;

use bytes::Bytes;
use bytes_util::BitReader;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::AacFrameHeader;

/// A Partial Audio Specific Config
/// ISO/IEC 14496-3:2019(E) - 1.6
///
/// This struct does not represent the full AudioSpecificConfig, it only
/// represents the top few fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct PartialAudioSpecificConfig {
    /// Audio Object Type
    pub audio_object_type: AudioObjectType,
    /// Sampling Frequency Index
    pub sampling_frequency_index: SampleFrequencyIndex,
    /// Sampling Frequency
    pub sampling_frequency: u32,
    /// Channel Configuration
    pub channel_configuration: u8,
}

/// Audio Object Type
/// ISO/IEC 14496-3:2019(E) - 1.5.1.1 (Table 1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum AudioObjectType {
    /// AAC main
    AacMain,
    /// AAC LC
    AacLowComplexity,
    /// Spectral Band Replication (HE-AAC)
    Sbr,
    /// Any other object type
    Unknown(u16),
}

impl AudioObjectType {
    /// Converts an AudioObjectType to a u16
    pub const fn as_u16(&self) -> u16 {
        match self {
            AudioObjectType::AacMain => 1,
            AudioObjectType::AacLowComplexity => 2,
            AudioObjectType::Sbr => 5,
            AudioObjectType::Unknown(value) => *value,
        }
    }

    /// Converts a u16 to an AudioObjectType
    pub const fn from_u16(value: u16) -> Self {
        match value {
            1 => AudioObjectType::AacMain,
            2 => AudioObjectType::AacLowComplexity,
            5 => AudioObjectType::Sbr,
            _ => AudioObjectType::Unknown(value),
        }
    }
}

impl From<u16> for AudioObjectType {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<AudioObjectType> for u16 {
    fn from(value: AudioObjectType) -> Self {
        value.as_u16()
    }
}

/// Sampling Frequency Index
///
/// The purpose of the FrequencyIndex is to encode commonly used frequencies in
/// 4 bits to save space. These are the set of commonly used frequencies defined
/// in the specification.
///
/// ISO/IEC 14496-3:2019(E) - 1.6.2.4 (Table 1.22)
#[derive(FromPrimitive, Debug, Clone, PartialEq, Copy, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[must_use]
pub enum SampleFrequencyIndex {
    /// 96000 Hz
    Freq96000 = 0x0,
    /// 88200 Hz
    Freq88200 = 0x1,
    /// 64000 Hz
    Freq64000 = 0x2,
    /// 48000 Hz
    Freq48000 = 0x3,
    /// 44100 Hz
    Freq44100 = 0x4,
    /// 32000 Hz
    Freq32000 = 0x5,
    /// 24000 Hz
    Freq24000 = 0x6,
    /// 22050 Hz
    Freq22050 = 0x7,
    /// 16000 Hz
    Freq16000 = 0x8,
    /// 12000 Hz
    Freq12000 = 0x9,
    /// 11025 Hz
    Freq11025 = 0xA,
    /// 8000 Hz
    Freq8000 = 0xB,
    /// 7350 Hz
    Freq7350 = 0xC,
    /// Reserved
    FreqReserved = 0xD,
    /// Reserved
    FreqReserved2 = 0xE,
    /// Escape (Meaning the frequency is not in the table, and we need to read
    /// an additional 24 bits to get the frequency)
    FreqEscape = 0xF,
}

impl SampleFrequencyIndex {
    /// Looks up the 4-bit index, masking off any higher bits.
    pub fn from_index(index: u8) -> Self {
        // every 4-bit value has a variant
        Self::from_u8(index & 0x0F).unwrap_or(SampleFrequencyIndex::FreqEscape)
    }

    /// The 4-bit index
    pub const fn index(&self) -> u8 {
        *self as u8
    }

    /// Convert the SampleFrequencyIndex to the actual frequency in Hz
    pub const fn to_freq(&self) -> Option<u32> {
        match self {
            SampleFrequencyIndex::Freq96000 => Some(96000),
            SampleFrequencyIndex::Freq88200 => Some(88200),
            SampleFrequencyIndex::Freq64000 => Some(64000),
            SampleFrequencyIndex::Freq48000 => Some(48000),
            SampleFrequencyIndex::Freq44100 => Some(44100),
            SampleFrequencyIndex::Freq32000 => Some(32000),
            SampleFrequencyIndex::Freq24000 => Some(24000),
            SampleFrequencyIndex::Freq22050 => Some(22050),
            SampleFrequencyIndex::Freq16000 => Some(16000),
            SampleFrequencyIndex::Freq12000 => Some(12000),
            SampleFrequencyIndex::Freq11025 => Some(11025),
            SampleFrequencyIndex::Freq8000 => Some(8000),
            SampleFrequencyIndex::Freq7350 => Some(7350),
            SampleFrequencyIndex::FreqReserved => None,
            SampleFrequencyIndex::FreqReserved2 => None,
            SampleFrequencyIndex::FreqEscape => None,
        }
    }
}

impl PartialAudioSpecificConfig {
    /// Parse the Audio Specific Config from given bytes
    /// The implementation is based on ISO/IEC 14496-3:2019(E) - 1.6.2.1 (Table
    /// 1.19) This does not parse the entire AAC Data, it only parses the
    /// top few fields.
    /// - Audio Object Type
    /// - Sampling Frequency
    /// - Channel Configuration
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        Self::read(&mut BitReader::new(data))
    }

    /// Reads the leading ASC fields from a reader positioned at the start of
    /// an AudioSpecificConfig, as embedded in a LATM StreamMuxConfig.
    pub fn read(bitreader: &mut BitReader<'_>) -> io::Result<Self> {
        // GetAudioObjectType() # ISO/IEC 14496-3:2019(E) - 1.6.2.1 (Table 1.20)
        let mut audio_object_type = bitreader.read_bits(5)? as u16;
        if audio_object_type == 31 {
            audio_object_type = 32 + bitreader.read_bits(6)? as u16;
        }

        // The table calls for us to read a 4-bit value. If the value is type FreqEscape
        // (0xF), we need to read 24 bits to get the sampling frequency.
        let sampling_frequency_index = SampleFrequencyIndex::from_u8(bitreader.read_bits(4)? as u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid sampling frequency index"))?;

        let sampling_frequency = match sampling_frequency_index {
            // Uses the extended sampling frequency to represent the freq as a non-common value
            SampleFrequencyIndex::FreqEscape => bitreader.read_bits(24)? as u32,
            _ => sampling_frequency_index
                .to_freq()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid sampling frequency index"))?,
        };

        // 4 Bits to get the channel configuration
        let channel_configuration = bitreader.read_bits(4)? as u8;

        Ok(Self {
            audio_object_type: audio_object_type.into(),
            sampling_frequency_index,
            sampling_frequency,
            channel_configuration,
        })
    }
}

/// Which AAC object type the generated AudioSpecificConfig advertises.
///
/// Some decoders only switch between LC and HE-AAC cleanly when the config
/// already announces SBR, others reject SBR outright. The caller picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AacProfilePreference {
    /// HE-AAC (SBR) only for core rates of 24 kHz and below, LC otherwise.
    #[default]
    Auto,
    /// Always LC-AAC.
    Lc,
    /// HE-AAC with an explicit SBR extension, except mono sources above 24 kHz.
    He,
}

impl std::fmt::Display for AacProfilePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AacProfilePreference::Auto => write!(f, "auto"),
            AacProfilePreference::Lc => write!(f, "lc"),
            AacProfilePreference::He => write!(f, "he"),
        }
    }
}

impl std::str::FromStr for AacProfilePreference {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(AacProfilePreference::Auto),
            "lc" => Ok(AacProfilePreference::Lc),
            "he" => Ok(AacProfilePreference::He),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown aac profile preference: {other}"),
            )),
        }
    }
}

/// An AudioSpecificConfig built for a remuxed track.
///
/// ISO/IEC 14496-3:2019(E) - 1.6.2.1, with the explicit backward compatible
/// SBR signalling of 1.6.5.2 when HE-AAC is advertised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// The serialized config, 2 bytes for LC and 4 bytes for HE-AAC.
    pub config: Bytes,
    /// Object type written into the config.
    pub audio_object_type: AudioObjectType,
    /// Object type signalled by the source stream.
    pub original_audio_object_type: AudioObjectType,
    /// Core sampling frequency.
    pub sampling_frequency: u32,
    /// `channelConfiguration`
    pub channel_count: u8,
}

const SBR_MIN_INDEX: u8 = 6;

impl AudioSpecificConfig {
    /// Builds the config for a stream whose frames carry `header`.
    pub fn new(header: &AacFrameHeader, preference: AacProfilePreference) -> Self {
        let sampling_index = header.sampling_frequency_index.index();
        let channel_config = header.channel_config;

        let (sbr, extension_sampling_index) = match preference {
            AacProfilePreference::Lc => (false, sampling_index),
            AacProfilePreference::Auto if sampling_index >= SBR_MIN_INDEX => (true, sampling_index - 3),
            AacProfilePreference::Auto => (false, sampling_index),
            AacProfilePreference::He if sampling_index >= SBR_MIN_INDEX => (true, sampling_index - 3),
            AacProfilePreference::He if channel_config == 1 => (false, sampling_index),
            AacProfilePreference::He => (true, sampling_index),
        };

        let audio_object_type = if sbr {
            AudioObjectType::Sbr
        } else {
            AudioObjectType::AacLowComplexity
        };
        let aot = audio_object_type.as_u16() as u8;

        let mut config = vec![
            (aot << 3) | ((sampling_index & 0x0F) >> 1),
            ((sampling_index & 0x01) << 7) | ((channel_config & 0x0F) << 3),
        ];
        if sbr {
            config[1] |= (extension_sampling_index & 0x0F) >> 1;
            // extension object type is always LC
            config.push(((extension_sampling_index & 0x01) << 7) | (2 << 2));
            config.push(0);
        }

        Self {
            config: Bytes::from(config),
            audio_object_type,
            original_audio_object_type: header.audio_object_type,
            sampling_frequency: header.sampling_frequency,
            channel_count: channel_config,
        }
    }

    /// `mp4a.40.N` for the advertised object type.
    pub fn codec_string(&self) -> String {
        format!("mp4a.40.{}", self.audio_object_type.as_u16())
    }

    /// `mp4a.40.N` for the object type the source signalled.
    pub fn original_codec_string(&self) -> String {
        format!("mp4a.40.{}", self.original_audio_object_type.as_u16())
    }
}
