use bytes::{BufMut, Bytes, BytesMut};
use bytes_util::{StartCode, find_start_code};
use tracing::trace;

use crate::NALUnitType;

/// A single H.265 NAL unit, two byte header included, start code stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct H265Nalu {
    /// `nal_unit_type` from the first header byte
    pub nal_unit_type: NALUnitType,
    /// `nuh_layer_id`
    pub nuh_layer_id: u8,
    /// `nuh_temporal_id_plus1`
    pub nuh_temporal_id_plus1: u8,
    /// Zero-copy view of the unit in the source buffer
    pub data: Bytes,
}

impl H265Nalu {
    /// Appends the unit to `out` in the length prefixed `hvc1` sample form.
    pub fn put_hvc1(&self, out: &mut BytesMut) {
        out.put_u32(self.data.len() as u32);
        out.extend_from_slice(&self.data);
    }

    /// Rewrites the unit as `length (u32 BE) || payload` for `hvc1` samples.
    pub fn to_hvc1(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(4 + self.data.len());
        self.put_hvc1(&mut out);
        out.freeze()
    }
}

/// Scans an Annex-B buffer for H.265 NAL units, skipping units whose
/// forbidden bit is set or whose header is cut short.
#[derive(Debug)]
pub struct AnnexBParser {
    data: Bytes,
    next: Option<StartCode>,
}

impl AnnexBParser {
    /// Creates a parser positioned at the first start code of `data`.
    pub fn new(data: Bytes) -> Self {
        let next = find_start_code(&data, 0);
        Self { data, next }
    }

    /// Returns the next NAL unit, or `None` once the buffer is exhausted.
    pub fn read_next_nalu(&mut self) -> Option<H265Nalu> {
        loop {
            let start = self.next.take()?;
            let offset = start.payload_offset();
            self.next = find_start_code(&self.data, offset);
            let end = self.next.map_or(self.data.len(), |s| s.offset);

            if end < offset + 2 {
                continue;
            }

            let header = [self.data[offset], self.data[offset + 1]];
            if header[0] & 0x80 != 0 {
                trace!("dropping hevc nal unit 0x{:02X}{:02X} with forbidden_zero_bit set", header[0], header[1]);
                continue;
            }

            return Some(H265Nalu {
                nal_unit_type: NALUnitType::from(header[0] >> 1),
                nuh_layer_id: ((header[0] & 0x01) << 5) | (header[1] >> 3),
                nuh_temporal_id_plus1: header[1] & 0x07,
                data: self.data.slice(offset..end),
            });
        }
    }
}

impl Iterator for AnnexBParser {
    type Item = H265Nalu;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next_nalu()
    }
}
