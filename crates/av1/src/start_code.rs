use bytes::Bytes;
use bytes_util::{BitReader, StartCode, ebsp_to_rbsp, find_start_code};
use tracing::trace;

use crate::{ObuHeader, ObuType};

/// One OBU lifted out of a transport stream PES payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Av1Obu {
    /// Parsed OBU header. `size` reflects the source, which may omit it.
    pub header: ObuHeader,
    /// OBU payload with emulation prevention removed.
    pub payload: Bytes,
}

impl Av1Obu {
    /// Appends the OBU in low overhead bitstream format (size field set).
    pub fn write_low_overhead(&self, out: &mut Vec<u8>) {
        self.header.write_sized(out, self.payload.len());
        out.extend_from_slice(&self.payload);
    }

    /// The OBU in low overhead bitstream format.
    pub fn to_low_overhead(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.payload.len() + 10);
        self.write_low_overhead(&mut out);
        Bytes::from(out)
    }
}

/// Splits an AV1 PES payload into OBUs.
///
/// In MPEG-2 TS every OBU is preceded by a `00 00 01` start code and carries
/// emulation prevention bytes. Units whose header cannot be parsed, or whose
/// declared size overruns the unit, are skipped.
#[derive(Debug)]
pub struct StartCodeObuParser {
    data: Bytes,
    next: Option<StartCode>,
}

impl StartCodeObuParser {
    /// Creates a parser positioned at the first start code of `data`.
    pub fn new(data: Bytes) -> Self {
        let next = find_start_code(&data, 0);
        Self { data, next }
    }

    /// Returns the next OBU, or `None` once the buffer is exhausted.
    pub fn read_next_obu(&mut self) -> Option<Av1Obu> {
        loop {
            let start = self.next.take()?;
            let offset = start.payload_offset();
            self.next = find_start_code(&self.data, offset);
            let end = self.next.map_or(self.data.len(), |s| s.offset);
            if end <= offset {
                continue;
            }

            let unit = ebsp_to_rbsp(&self.data.slice(offset..end));
            let mut reader = BitReader::new(&unit);
            let header = match ObuHeader::parse(&mut reader) {
                Ok(header) => header,
                Err(e) => {
                    trace!("skipping av1 unit at {offset}: {e}");
                    continue;
                }
            };

            let payload_start = reader.byte_offset();
            let payload_end = match header.size {
                Some(size) => payload_start.saturating_add(size as usize),
                None => unit.len(),
            };
            if payload_end > unit.len() {
                trace!("skipping {:?} obu at {offset}: size {payload_end} overruns unit of {}", header.obu_type, unit.len());
                continue;
            }

            return Some(Av1Obu {
                header,
                payload: unit.slice(payload_start..payload_end),
            });
        }
    }
}

impl Iterator for StartCodeObuParser {
    type Item = Av1Obu;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next_obu()
    }
}

/// Serializes the OBUs of one access unit as a sample: low overhead format,
/// temporal delimiters and padding dropped.
pub fn to_sample(obus: &[Av1Obu]) -> Bytes {
    let capacity = obus.iter().map(|obu| obu.payload.len() + 10).sum();
    let mut out = Vec::with_capacity(capacity);
    for obu in obus {
        if matches!(obu.header.obu_type, ObuType::TemporalDelimiter | ObuType::Padding) {
            continue;
        }
        obu.write_low_overhead(&mut out);
    }
    Bytes::from(out)
}
