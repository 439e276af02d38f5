use crate::descriptor::{Descriptor, TAG_DVB_AC3};

/// PMT stream_type values this demuxer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// MPEG-1 Video
    Mpeg1Video,
    /// MPEG-2 Video
    Mpeg2Video,
    /// MPEG-1 Audio
    Mpeg1Audio,
    /// MPEG-2 Audio
    Mpeg2Audio,
    /// MPEG-2 Private PES packets, resolved through descriptors
    PrivatePes,
    /// ADTS AAC Audio
    AdtsAac,
    /// LATM AAC Audio in LOAS framing
    LatmAac,
    /// Metadata carried in PES packets
    MetadataPes,
    /// AVC video stream (ITU-T Rec. H.264 | ISO/IEC 14496-10)
    H264,
    /// HEVC video stream (ITU-T Rec. H.265 | ISO/IEC 23008-2)
    H265,
    /// AC-3 audio stream (ATSC A/52)
    Ac3,
    /// SCTE-35 splice information sections
    Scte35,
    /// E-AC-3 audio stream (ATSC A/52)
    EAc3,
    /// Blu-ray presentation graphics (PGS)
    Pgs,
    /// Unknown stream type
    Unknown(u8),
}

impl From<u8> for StreamType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => StreamType::Mpeg1Video,
            0x02 => StreamType::Mpeg2Video,
            0x03 => StreamType::Mpeg1Audio,
            0x04 => StreamType::Mpeg2Audio,
            0x06 => StreamType::PrivatePes,
            0x0F => StreamType::AdtsAac,
            0x11 => StreamType::LatmAac,
            0x15 => StreamType::MetadataPes,
            0x1B => StreamType::H264,
            0x24 => StreamType::H265,
            0x81 => StreamType::Ac3,
            0x86 => StreamType::Scte35,
            0x87 => StreamType::EAc3,
            0x90 => StreamType::Pgs,
            _ => StreamType::Unknown(value),
        }
    }
}

impl From<StreamType> for u8 {
    fn from(value: StreamType) -> Self {
        match value {
            StreamType::Mpeg1Video => 0x01,
            StreamType::Mpeg2Video => 0x02,
            StreamType::Mpeg1Audio => 0x03,
            StreamType::Mpeg2Audio => 0x04,
            StreamType::PrivatePes => 0x06,
            StreamType::AdtsAac => 0x0F,
            StreamType::LatmAac => 0x11,
            StreamType::MetadataPes => 0x15,
            StreamType::H264 => 0x1B,
            StreamType::H265 => 0x24,
            StreamType::Ac3 => 0x81,
            StreamType::Scte35 => 0x86,
            StreamType::EAc3 => 0x87,
            StreamType::Pgs => 0x90,
            StreamType::Unknown(value) => value,
        }
    }
}

/// What the demuxer does with an elementary PID, after descriptors have
/// been taken into account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamKind {
    /// H.264 Annex-B video
    H264,
    /// H.265 Annex-B video
    H265,
    /// AV1 video (registration `AV01`)
    Av1,
    /// ADTS framed AAC
    AdtsAac,
    /// LOAS framed AAC
    LoasAac,
    /// AC-3 audio
    Ac3,
    /// Timed ID3 metadata
    TimedId3,
    /// KLV metadata synchronised to the PES pts (stream_type 0x15)
    SynchronousKlv,
    /// KLV metadata in private PES (stream_type 0x06)
    AsynchronousKlv,
    /// SMPTE 2038 ancillary data (registration `VANC`)
    Smpte2038,
    /// SCTE-35 sections
    Scte35,
    /// PGS subtitles with their ISO 639 language, if announced
    Pgs {
        /// ISO 639-2 language code
        language: Option<String>,
    },
    /// Private PES data with no more specific route
    PesPrivate,
    /// A stream type with no handler
    Unsupported(StreamType),
}

impl StreamKind {
    /// Resolves a PMT entry to its handler.
    pub fn resolve(stream_type: StreamType, descriptors: &[Descriptor]) -> Self {
        let registration = descriptors.iter().find_map(Descriptor::registration_format_identifier);

        match stream_type {
            StreamType::H264 => StreamKind::H264,
            StreamType::H265 => StreamKind::H265,
            StreamType::AdtsAac => StreamKind::AdtsAac,
            StreamType::LatmAac => StreamKind::LoasAac,
            StreamType::Ac3 => StreamKind::Ac3,
            StreamType::Scte35 => StreamKind::Scte35,
            StreamType::Pgs => StreamKind::Pgs {
                language: descriptors.iter().find_map(Descriptor::iso_639_language),
            },
            StreamType::MetadataPes => match registration.as_ref() {
                Some(b"KLVA") => StreamKind::SynchronousKlv,
                _ => StreamKind::TimedId3,
            },
            StreamType::PrivatePes => match registration.as_ref() {
                Some(b"AV01") => StreamKind::Av1,
                Some(b"KLVA") => StreamKind::AsynchronousKlv,
                Some(b"VANC") => StreamKind::Smpte2038,
                Some(b"ID3 ") => StreamKind::TimedId3,
                _ if descriptors.iter().any(|d| d.tag == TAG_DVB_AC3) => StreamKind::Ac3,
                _ => StreamKind::PesPrivate,
            },
            other => StreamKind::Unsupported(other),
        }
    }

    /// True for video kinds
    pub fn is_video(&self) -> bool {
        matches!(self, StreamKind::H264 | StreamKind::H265 | StreamKind::Av1)
    }

    /// True for audio kinds
    pub fn is_audio(&self) -> bool {
        matches!(self, StreamKind::AdtsAac | StreamKind::LoasAac | StreamKind::Ac3)
    }

    /// True when units on this PID are PSI sections rather than PES packets
    pub fn is_section(&self) -> bool {
        matches!(self, StreamKind::Scte35)
    }
}
