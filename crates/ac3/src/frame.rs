use std::io;

use bytes::Bytes;
use bytes_util::BitReader;

/// Number of PCM samples in one AC-3 sync frame (6 blocks of 256).
pub const AC3_SAMPLES_PER_FRAME: u32 = 1536;

/// Length of `syncinfo()` plus the first BSI bytes we decode.
pub(crate) const AC3_MIN_HEADER_LEN: usize = 7;

/// Sample rates indexed by `fscod`.
///
/// Index 1 is kept at 44200 to stay consistent with consumers that already
/// compensate for it.
const SAMPLE_RATES: [u32; 3] = [48000, 44200, 32000];

/// Base channel count per `acmod`, ATSC A/52 Table 5.8.
const CHANNEL_COUNTS: [u8; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

/// Sync frame size in 16-bit words, indexed by `frmsizecod` then `fscod`.
/// ATSC A/52 Table 5.18
const FRAME_SIZE_WORDS: [[u16; 3]; 38] = [
    [64, 69, 96], [64, 70, 96],
    [80, 87, 120], [80, 88, 120],
    [96, 104, 144], [96, 105, 144],
    [112, 121, 168], [112, 122, 168],
    [128, 139, 192], [128, 140, 192],
    [160, 174, 240], [160, 175, 240],
    [192, 208, 288], [192, 209, 288],
    [224, 243, 336], [224, 244, 336],
    [256, 278, 384], [256, 279, 384],
    [320, 348, 480], [320, 349, 480],
    [384, 417, 576], [384, 418, 576],
    [448, 487, 672], [448, 488, 672],
    [512, 557, 768], [512, 558, 768],
    [640, 696, 960], [640, 697, 960],
    [768, 835, 1152], [768, 836, 1152],
    [896, 975, 1344], [896, 976, 1344],
    [1024, 1114, 1536], [1024, 1115, 1536],
    [1152, 1253, 1728], [1152, 1254, 1728],
    [1280, 1393, 1920], [1280, 1394, 1920],
];

/// Decoded `syncinfo()` and leading `bsi()` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ac3FrameHeader {
    /// `fscod`
    pub sampling_rate_code: u8,
    /// Sample rate looked up from `fscod`
    pub sampling_frequency: u32,
    /// `frmsizecod`
    pub frame_size_code: u8,
    /// Whole sync frame length in bytes, sync word included
    pub frame_size: usize,
    /// `bsid`
    pub bit_stream_id: u8,
    /// `bsmod`
    pub bit_stream_mode: u8,
    /// `acmod`
    pub channel_mode: u8,
    /// `lfeon`
    pub low_frequency_effects: bool,
    /// Full bandwidth channels plus the LFE channel
    pub channel_count: u8,
}

impl Ac3FrameHeader {
    /// Parses a header from data starting at the `0x0B77` sync word.
    ///
    /// Returns `InvalidData` for reserved `fscod` or out of range `frmsizecod`.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut reader = BitReader::new(data);
        let sync_word = reader.read_bits(16)?;
        if sync_word != 0x0B77 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "missing AC-3 sync word"));
        }

        // crc1
        reader.skip_bits(16)?;
        let sampling_rate_code = reader.read_bits(2)? as u8;
        let frame_size_code = reader.read_bits(6)? as u8;

        let sampling_frequency = *SAMPLE_RATES
            .get(sampling_rate_code as usize)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "reserved AC-3 fscod"))?;
        let frame_size = FRAME_SIZE_WORDS
            .get(frame_size_code as usize)
            .map(|row| row[sampling_rate_code as usize] as usize * 2)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid AC-3 frmsizecod"))?;

        let bit_stream_id = reader.read_bits(5)? as u8;
        let bit_stream_mode = reader.read_bits(3)? as u8;
        let channel_mode = reader.read_bits(3)? as u8;

        if channel_mode & 0x01 != 0 && channel_mode != 0x01 {
            // cmixlev
            reader.skip_bits(2)?;
        }
        if channel_mode & 0x04 != 0 {
            // surmixlev
            reader.skip_bits(2)?;
        }
        if channel_mode == 0x02 {
            // dsurmod
            reader.skip_bits(2)?;
        }
        let low_frequency_effects = reader.read_bit()?;

        Ok(Self {
            sampling_rate_code,
            sampling_frequency,
            frame_size_code,
            frame_size,
            bit_stream_id,
            bit_stream_mode,
            channel_mode,
            low_frequency_effects,
            channel_count: CHANNEL_COUNTS[channel_mode as usize] + low_frequency_effects as u8,
        })
    }
}

/// One complete AC-3 sync frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ac3Frame {
    /// Decoded header fields
    pub header: Ac3FrameHeader,
    /// The whole sync frame, starting at the sync word
    pub data: Bytes,
}
