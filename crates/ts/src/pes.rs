use bytes::Bytes;

use crate::{Result, TsError};

/// Timestamps are 33-bit counters of a 90 kHz clock
pub const TIMESTAMP_MASK: u64 = (1 << 33) - 1;

/// Bytes up to and including PES_packet_length
pub const PES_PREFIX_LEN: usize = 6;

/// Stream ids whose packets carry no optional PES header:
/// program_stream_map, padding, private_stream_2, ECM, EMM,
/// program_stream_directory, DSMCC and H.222.1 type E.
const NO_OPTIONAL_HEADER: [u8; 8] = [0xBC, 0xBE, 0xBF, 0xF0, 0xF1, 0xFF, 0xF2, 0xF8];

/// A reassembled PES packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesPacket {
    /// stream_id
    pub stream_id: u8,
    /// PES_packet_length, 0 for unbounded video packets
    pub packet_length: u16,
    /// Presentation timestamp in 90 kHz units
    pub pts: Option<u64>,
    /// Decoding timestamp in 90 kHz units, equal to `pts` when only a pts is
    /// present
    pub dts: Option<u64>,
    /// Packet data after the PES header
    pub payload: Bytes,
}

/// Reads a 33-bit timestamp from its 5-byte marker-bit layout.
pub fn read_timestamp(data: &[u8]) -> u64 {
    (((data[0] as u64) & 0x0E) << 29)
        | ((data[1] as u64) << 22)
        | (((data[2] as u64) & 0xFE) << 14)
        | ((data[3] as u64) << 7)
        | ((data[4] as u64) >> 1)
}

impl PesPacket {
    /// Parses a complete PES packet.
    pub fn parse(data: Bytes) -> Result<Self> {
        if data.len() < PES_PREFIX_LEN {
            return Err(TsError::InsufficientData {
                expected: PES_PREFIX_LEN,
                actual: data.len(),
            });
        }

        let start_code = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | data[2] as u32;
        if start_code != 1 {
            return Err(TsError::InvalidPesStartCode(start_code));
        }

        let stream_id = data[3];
        let packet_length = ((data[4] as u16) << 8) | data[5] as u16;
        let end = if packet_length == 0 {
            data.len()
        } else {
            (PES_PREFIX_LEN + packet_length as usize).min(data.len())
        };

        if NO_OPTIONAL_HEADER.contains(&stream_id) {
            return Ok(Self {
                stream_id,
                packet_length,
                pts: None,
                dts: None,
                payload: data.slice(PES_PREFIX_LEN..end),
            });
        }

        if data.len() < 9 {
            return Err(TsError::InsufficientData {
                expected: 9,
                actual: data.len(),
            });
        }

        let pts_dts_flags = (data[7] & 0xC0) >> 6;
        let header_data_length = data[8] as usize;
        let payload_offset = 9 + header_data_length;
        if payload_offset > end {
            return Err(TsError::InsufficientData {
                expected: payload_offset,
                actual: end,
            });
        }

        let mut pts = None;
        let mut dts = None;
        if pts_dts_flags & 0x02 != 0 && header_data_length >= 5 {
            pts = Some(read_timestamp(&data[9..14]));
            dts = pts;
            if pts_dts_flags == 0x03 && header_data_length >= 10 {
                dts = Some(read_timestamp(&data[14..19]));
            }
        }

        Ok(Self {
            stream_id,
            packet_length,
            pts,
            dts,
            payload: data.slice(payload_offset..end),
        })
    }

    /// Total byte length announced by PES_packet_length, if bounded
    pub fn expected_length(data: &[u8]) -> Option<usize> {
        if data.len() < PES_PREFIX_LEN {
            return None;
        }
        let packet_length = ((data[4] as usize) << 8) | data[5] as usize;
        (packet_length != 0).then_some(PES_PREFIX_LEN + packet_length)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_timestamp(prefix: u8, ts: u64) -> [u8; 5] {
        [
            (prefix << 4) | (((ts >> 30) as u8 & 0x07) << 1) | 1,
            (ts >> 22) as u8,
            (((ts >> 15) as u8) << 1) | 1,
            (ts >> 7) as u8,
            ((ts as u8) << 1) | 1,
        ]
    }

    /// Builds a PES packet. `bounded` controls whether PES_packet_length is set.
    pub(crate) fn build_pes(stream_id: u8, pts: Option<u64>, dts: Option<u64>, payload: &[u8], bounded: bool) -> Vec<u8> {
        let mut header = Vec::new();
        let flags = match (pts, dts) {
            (Some(pts), Some(dts)) => {
                header.extend(write_timestamp(0x3, pts));
                header.extend(write_timestamp(0x1, dts));
                0xC0
            }
            (Some(pts), None) => {
                header.extend(write_timestamp(0x2, pts));
                0x80
            }
            _ => 0x00,
        };

        let packet_length = 3 + header.len() + payload.len();
        let length_field = if bounded { packet_length as u16 } else { 0 };
        let mut data = vec![0x00, 0x00, 0x01, stream_id, (length_field >> 8) as u8, length_field as u8];
        data.extend([0x80, flags, header.len() as u8]);
        data.extend(header);
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_parse_pts_dts() {
        let data = build_pes(0xE0, Some(0x1_2345_6789), Some(0x1_2345_0000), &[0xAA, 0xBB], true);
        let pes = PesPacket::parse(Bytes::from(data)).unwrap();

        assert_eq!(pes.stream_id, 0xE0);
        assert_eq!(pes.pts, Some(0x1_2345_6789));
        assert_eq!(pes.dts, Some(0x1_2345_0000));
        assert_eq!(pes.payload.as_ref(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_pts_only_sets_dts() {
        let data = build_pes(0xC0, Some(90_000), None, &[1, 2, 3], false);
        let pes = PesPacket::parse(Bytes::from(data)).unwrap();
        assert_eq!(pes.packet_length, 0);
        assert_eq!(pes.pts, Some(90_000));
        assert_eq!(pes.dts, Some(90_000));
        assert_eq!(pes.payload.len(), 3);
    }

    #[test]
    fn test_no_optional_header() {
        let data = vec![0x00, 0x00, 0x01, 0xBF, 0x00, 0x03, 0x10, 0x20, 0x30, 0xFF];
        let pes = PesPacket::parse(Bytes::from(data)).unwrap();
        assert_eq!(pes.pts, None);
        assert_eq!(pes.payload.as_ref(), &[0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_bad_start_code() {
        let data = vec![0x00, 0x00, 0x02, 0xE0, 0x00, 0x00, 0x80, 0x00, 0x00];
        assert!(matches!(PesPacket::parse(Bytes::from(data)), Err(TsError::InvalidPesStartCode(2))));
    }

    #[test]
    fn test_expected_length() {
        let bounded = build_pes(0xC0, None, None, &[0; 10], true);
        assert_eq!(PesPacket::expected_length(&bounded), Some(bounded.len()));
        let unbounded = build_pes(0xE0, None, None, &[0; 10], false);
        assert_eq!(PesPacket::expected_length(&unbounded), None);
        assert_eq!(PesPacket::expected_length(&[0, 0, 1]), None);
    }
}
