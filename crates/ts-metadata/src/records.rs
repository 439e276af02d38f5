//! Records for PES streams that are delivered without decoding their
//! contents.

use bytes::Bytes;

/// A PES of a stream_type 0x06 stream without a recognised registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesPrivateData {
    /// PID of the private stream
    pub pid: u16,
    /// PES `stream_id`
    pub stream_id: u8,
    /// PES pts in 90 kHz units
    pub pts: Option<u64>,
    /// PES dts in 90 kHz units
    pub dts: Option<u64>,
    /// Most recent pts seen on any stream
    pub nearest_pts: Option<u64>,
    /// The PES payload
    pub data: Bytes,
}

/// A PGS subtitle PES (stream_type 0x90)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgsData {
    /// PID of the subtitle stream
    pub pid: u16,
    /// PES `stream_id`
    pub stream_id: u8,
    /// PES pts in 90 kHz units
    pub pts: Option<u64>,
    /// PES dts in 90 kHz units
    pub dts: Option<u64>,
    /// ISO 639 language from the PMT, if announced
    pub lang: Option<String>,
    /// The PES payload
    pub data: Bytes,
}

/// A timed ID3 PES
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedId3Data {
    /// PID of the ID3 stream
    pub pid: u16,
    /// PES `stream_id`
    pub stream_id: u8,
    /// PES pts in 90 kHz units
    pub pts: Option<u64>,
    /// PES dts in 90 kHz units
    pub dts: Option<u64>,
    /// The PES payload
    pub data: Bytes,
}

/// The ES descriptors announced in the PMT for a private data stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesPrivateDataDescriptor {
    /// PID of the private stream
    pub pid: u16,
    /// `stream_type` from the PMT
    pub stream_type: u8,
    /// Raw `ES_info` descriptor loop
    pub descriptor: Bytes,
}
