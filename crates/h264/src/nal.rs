use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use bytes_util::{StartCode, find_start_code};
use tracing::trace;

use crate::NALUnitType;

/// A single NAL unit, header byte included, start code stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct H264Nalu {
    /// Decoded `nal_unit_type`
    pub nal_unit_type: NALUnitType,
    /// `nal_ref_idc` (2 bits)
    pub nal_ref_idc: u8,
    /// Zero-copy view of the unit in the source buffer
    pub data: Bytes,
}

impl H264Nalu {
    /// Appends the unit to `out` as `length (u32 BE) || payload`.
    pub fn put_avc1(&self, out: &mut BytesMut) {
        out.put_u32(self.data.len() as u32);
        out.extend_from_slice(&self.data);
    }

    /// Rewrites the unit as `length (u32 BE) || payload`.
    pub fn to_avc1(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(4 + self.data.len());
        self.put_avc1(&mut out);
        out.freeze()
    }

    /// Reads the length prefix written by [`H264Nalu::to_avc1`].
    pub fn avc1_len(avc1: &[u8]) -> Option<usize> {
        (avc1.len() >= 4).then(|| BigEndian::read_u32(avc1) as usize)
    }
}

/// Scans an Annex-B buffer for NAL units.
///
/// Units with the forbidden bit set and discarded unit types (see
/// [`NALUnitType::FIRST_DISCARDED`]) are skipped silently.
#[derive(Debug)]
pub struct AnnexBParser {
    data: Bytes,
    next: Option<StartCode>,
}

impl AnnexBParser {
    /// Creates a parser positioned at the first start code of `data`.
    pub fn new(data: Bytes) -> Self {
        let next = find_start_code(&data, 0);
        if next.is_none() {
            trace!("no h264 start code in {} byte payload", data.len());
        }

        Self { data, next }
    }

    /// Returns the next kept NAL unit, or `None` once the buffer is exhausted.
    pub fn read_next_nalu(&mut self) -> Option<H264Nalu> {
        loop {
            let start = self.next.take()?;
            let offset = start.payload_offset();
            self.next = find_start_code(&self.data, offset);
            let end = self.next.map_or(self.data.len(), |s| s.offset);

            let Some(&header) = self.data.get(offset) else {
                continue;
            };
            if offset >= end {
                continue;
            }

            if header & 0x80 != 0 {
                trace!("dropping nal unit 0x{header:02X} with forbidden_zero_bit set");
                continue;
            }

            let Some(nal_unit_type) = NALUnitType::from_header(header) else {
                trace!("dropping nal unit of discarded type {}", header & 0x1F);
                continue;
            };

            return Some(H264Nalu {
                nal_unit_type,
                nal_ref_idc: (header >> 5) & 0x03,
                data: self.data.slice(offset..end),
            });
        }
    }
}

impl Iterator for AnnexBParser {
    type Item = H264Nalu;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next_nalu()
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_both_start_code_lengths() {
        let data = Bytes::from_static(&[
            0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0xC0, 0x1E, // sps
            0x00, 0x00, 0x01, 0x68, 0xCE, 0x3C, 0x80, // pps
            0x00, 0x00, 0x00, 0x01, 0x65, 0x88, // idr
        ]);

        let units: Vec<_> = AnnexBParser::new(data).collect();
        let types: Vec<_> = units.iter().map(|u| u.nal_unit_type).collect();
        assert_eq!(
            types,
            vec![NALUnitType::SPS, NALUnitType::PPS, NALUnitType::IDRSliceLayerWithoutPartitioning]
        );
        assert_eq!(&units[0].data[..], &[0x67, 0x42, 0xC0, 0x1E]);
        assert_eq!(&units[1].data[..], &[0x68, 0xCE, 0x3C, 0x80]);
        assert_eq!(&units[2].data[..], &[0x65, 0x88]);
        assert_eq!(units[2].nal_ref_idc, 3);
    }

    #[test]
    fn test_forbidden_bit_is_never_surfaced() {
        let data = Bytes::from_static(&[
            0x00, 0x00, 0x01, 0xE5, 0x11, 0x22, // forbidden bit + idr
            0x00, 0x00, 0x01, 0x41, 0x9A, // non-idr slice
        ]);

        let units: Vec<_> = AnnexBParser::new(data).collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].nal_unit_type, NALUnitType::NonIDRSliceLayerWithoutPartitioning);
        assert_eq!(&units[0].data[..], &[0x41, 0x9A]);
    }

    #[test]
    fn test_reserved_types_and_garbage_prefix() {
        let data = Bytes::from_static(&[
            0xAB, 0xCD, // junk before the first start code
            0x00, 0x00, 0x01, 0x0F, 0x01, // subset sps
            0x00, 0x00, 0x01, 0x14, 0x01, // slice extension
            0x00, 0x00, 0x01, 0x06, 0x05, // sei
        ]);

        let units: Vec<_> = AnnexBParser::new(data).collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].nal_unit_type, NALUnitType::SEI);
    }

    #[test]
    fn test_no_start_code() {
        let mut parser = AnnexBParser::new(Bytes::from_static(&[0x65, 0x88, 0x00]));
        assert!(parser.read_next_nalu().is_none());
    }

    #[test]
    fn test_avc1_rewrite() {
        let nalu = H264Nalu {
            nal_unit_type: NALUnitType::SEI,
            nal_ref_idc: 0,
            data: Bytes::from_static(&[0x06, 0x05, 0x01]),
        };

        let avc1 = nalu.to_avc1();
        assert_eq!(&avc1[..], &[0x00, 0x00, 0x00, 0x03, 0x06, 0x05, 0x01]);
        assert_eq!(H264Nalu::avc1_len(&avc1), Some(3));
        assert_eq!(H264Nalu::avc1_len(&avc1[..2]), None);
    }

    #[test]
    fn test_put_avc1_appends_access_unit() {
        let data = Bytes::from_static(&[0x00, 0x00, 0x01, 0x09, 0xF0, 0x00, 0x00, 0x01, 0x65, 0x88]);

        let mut out = BytesMut::new();
        for nalu in AnnexBParser::new(data) {
            nalu.put_avc1(&mut out);
        }
        assert_eq!(&out[..], &[0, 0, 0, 2, 0x09, 0xF0, 0, 0, 0, 2, 0x65, 0x88]);
    }
}
