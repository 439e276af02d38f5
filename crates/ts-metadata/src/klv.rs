use bytes::Bytes;
use tracing::trace;

/// Size of the cell header preceding every access unit
const CELL_HEADER_LEN: usize = 5;

/// One metadata access unit cell, ISO/IEC 13818-1 2.12.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlvAccessUnit {
    /// `metadata_service_id`
    pub service_id: u8,
    /// `sequence_number`
    pub sequence_number: u8,
    /// `cell_fragment_indication`, `decoder_config_flag` and
    /// `random_access_indicator` as they appear in the header byte
    pub flags: u8,
    /// The KLV bytes of the cell
    pub data: Bytes,
}

impl KlvAccessUnit {
    /// Splits a PES payload into access unit cells. A cell whose declared
    /// size overruns the payload ends the walk.
    pub fn parse_all(data: &Bytes) -> Vec<KlvAccessUnit> {
        let mut units = Vec::new();
        let mut offset = 0;

        while data.len() - offset >= CELL_HEADER_LEN {
            let size = u16::from_be_bytes([data[offset + 3], data[offset + 4]]) as usize;
            let start = offset + CELL_HEADER_LEN;
            if start + size > data.len() {
                trace!(
                    "KLV cell of {size} bytes overruns payload ({} bytes left)",
                    data.len() - start
                );
                break;
            }

            units.push(KlvAccessUnit {
                service_id: data[offset],
                sequence_number: data[offset + 1],
                flags: data[offset + 2],
                data: data.slice(start..start + size),
            });
            offset = start + size;
        }

        units
    }
}

/// A KLV metadata PES
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlvData {
    /// PID of the metadata stream
    pub pid: u16,
    /// PES `stream_id`
    pub stream_id: u8,
    /// PES pts in 90 kHz units
    pub pts: Option<u64>,
    /// PES dts in 90 kHz units
    pub dts: Option<u64>,
    /// Decoded cells
    pub access_units: Vec<KlvAccessUnit>,
    /// The PES payload
    pub data: Bytes,
}

impl KlvData {
    /// Builds the record for one PES payload
    pub fn new(pid: u16, stream_id: u8, pts: Option<u64>, dts: Option<u64>, data: Bytes) -> Self {
        Self {
            pid,
            stream_id,
            pts,
            dts,
            access_units: KlvAccessUnit::parse_all(&data),
            data,
        }
    }
}
