use bytes::Bytes;

use crate::Ac3FrameHeader;

/// The `dac3` AC3SpecificBox payload plus the track level fields derived
/// from the same header.
///
/// ETSI TS 102 366 - F.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ac3Config {
    /// 3 byte `AC3SpecificBox` body
    pub config: Bytes,
    /// Sample rate in Hz
    pub sampling_frequency: u32,
    /// Channel count including LFE
    pub channel_count: u8,
}

impl Ac3Config {
    /// Codec string for AC-3 tracks.
    pub const CODEC: &'static str = "ac-3";

    /// Packs `fscod`, `bsid`, `bsmod`, `acmod`, `lfeon` and `bit_rate_code`.
    pub fn new(header: &Ac3FrameHeader) -> Self {
        let fscod = header.sampling_rate_code;
        let frmsizecod = header.frame_size_code;

        let config = [
            (fscod << 6) | ((header.bit_stream_id & 0x1F) << 1) | (header.bit_stream_mode >> 2),
            ((header.bit_stream_mode & 0x03) << 6)
                | ((header.channel_mode & 0x07) << 3)
                | ((header.low_frequency_effects as u8) << 2)
                | (frmsizecod >> 4),
            (frmsizecod << 4) & 0xE0,
        ];

        Self {
            config: Bytes::copy_from_slice(&config),
            sampling_frequency: header.sampling_frequency,
            channel_count: header.channel_count,
        }
    }

    /// Always `ac-3`.
    pub fn codec_string(&self) -> &'static str {
        Self::CODEC
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::frame::tests::ac3_frame;

    #[test]
    fn test_5_1_config() {
        let header = Ac3FrameHeader::parse(&ac3_frame(0, 28, 7, true)).unwrap();
        let config = Ac3Config::new(&header);

        // fscod 0, bsid 8, bsmod 0, acmod 7, lfeon 1, bit_rate_code 14
        assert_eq!(config.config.as_ref(), &[0x10, 0x3D, 0xC0]);
        assert_eq!(config.channel_count, 6);
        assert_eq!(config.sampling_frequency, 48000);
        assert_eq!(config.codec_string(), "ac-3");
    }
}
