use bytes::Bytes;

use crate::{AudioObjectType, SampleFrequencyIndex, StreamMuxConfig};

/// Number of PCM samples an AAC (LC core) frame decodes to.
pub const AAC_SAMPLES_PER_FRAME: u32 = 1024;

/// Codec parameters shared by ADTS and LATM framed AAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AacFrameHeader {
    /// Audio object type (ADTS `profile + 1`)
    pub audio_object_type: AudioObjectType,
    /// `sampling_frequency_index`
    pub sampling_frequency_index: SampleFrequencyIndex,
    /// Sampling frequency in Hz
    pub sampling_frequency: u32,
    /// `channel_configuration`
    pub channel_config: u8,
}

/// One raw AAC access unit together with the framing it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AacFrame {
    /// ADTS framed. `data` is the raw payload after the 7 or 9 byte header.
    Adts {
        /// Header fields
        header: AacFrameHeader,
        /// Raw data block(s)
        data: Bytes,
    },
    /// LOAS/LATM framed. `mux_config` is either parsed from this frame or the
    /// previous one when `useSameStreamMux` was set.
    Loas {
        /// StreamMuxConfig in effect for this frame
        mux_config: StreamMuxConfig,
        /// Payload of the single sub frame
        data: Bytes,
    },
}

impl AacFrame {
    /// Codec parameters of the frame.
    pub fn header(&self) -> &AacFrameHeader {
        match self {
            AacFrame::Adts { header, .. } => header,
            AacFrame::Loas { mux_config, .. } => &mux_config.header,
        }
    }

    /// Raw AAC payload.
    pub fn data(&self) -> &Bytes {
        match self {
            AacFrame::Adts { data, .. } | AacFrame::Loas { data, .. } => data,
        }
    }
}
