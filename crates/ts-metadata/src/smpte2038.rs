use bytes::Bytes;
use bytes_util::BitReader;
use tracing::trace;

/// One `ANC_data_packet()`, SMPTE ST 2038 2008 - 4.2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancillary {
    /// `c_not_y_channel_flag`
    pub yc_indicator: bool,
    /// `line_number`
    pub line_number: u16,
    /// `horizontal_offset`
    pub horizontal_offset: u16,
    /// `DID` without its parity bits
    pub did: u8,
    /// `SDID` without its parity bits
    pub sdid: u8,
    /// `user_data_words` without their parity bits
    pub user_data: Vec<u8>,
    /// Registered service for the DID/SDID pair
    pub description: &'static str,
}

impl Ancillary {
    /// Decodes the packets of a PES payload. Decoding stops at the first
    /// packet whose leading marker bits are not zero or which is truncated.
    pub fn parse_all(data: &[u8]) -> Vec<Ancillary> {
        let mut reader = BitReader::new(data);
        let mut ancillaries = Vec::new();

        while reader.bits_left() >= 6 {
            match read_packet(&mut reader) {
                Ok(Some(ancillary)) => ancillaries.push(ancillary),
                Ok(None) => break,
                Err(err) => {
                    trace!("truncated ANC packet: {err}");
                    break;
                }
            }
        }

        ancillaries
    }
}

fn read_packet(reader: &mut BitReader<'_>) -> std::io::Result<Option<Ancillary>> {
    if reader.read_bits(6)? != 0 {
        return Ok(None);
    }

    let yc_indicator = reader.read_bit()?;
    let line_number = reader.read_bits(11)? as u16;
    let horizontal_offset = reader.read_bits(12)? as u16;
    let did = reader.read_bits(10)? as u8;
    let sdid = reader.read_bits(10)? as u8;
    let data_count = reader.read_bits(10)? as u8;

    let mut user_data = Vec::with_capacity(data_count as usize);
    for _ in 0..data_count {
        user_data.push(reader.read_bits(10)? as u8);
    }
    // checksum_word
    reader.skip_bits(10)?;
    reader.align();

    Ok(Some(Ancillary {
        yc_indicator,
        line_number,
        horizontal_offset,
        did,
        sdid,
        user_data,
        description: describe(did, sdid),
    }))
}

/// SMPTE RP 291 registrations seen in broadcast streams
fn describe(did: u8, sdid: u8) -> &'static str {
    match (did, sdid) {
        (0x41, 0x07) => "SCTE-104",
        (0x5F, 0xDC) => "ARIB STD-B37 (Analog Closed Caption)",
        (0x5F, 0xDD) => "ARIB STD-B37 (Digital Closed Caption)",
        (0x5F, 0xDE) => "ARIB STD-B37 (Mobile Closed Caption)",
        (0x61, 0x01) => "EIA-708",
        (0x61, 0x02) => "EIA-608",
        _ => "Reserved",
    }
}

/// A SMPTE 2038 ancillary data PES
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smpte2038Data {
    /// PID of the ancillary stream
    pub pid: u16,
    /// PES `stream_id`
    pub stream_id: u8,
    /// PES pts in 90 kHz units
    pub pts: Option<u64>,
    /// PES dts in 90 kHz units
    pub dts: Option<u64>,
    /// Most recent pts seen on any stream, for PES without their own
    pub nearest_pts: Option<u64>,
    /// Decoded packets
    pub ancillaries: Vec<Ancillary>,
    /// The PES payload
    pub data: Bytes,
}

impl Smpte2038Data {
    /// Builds the record for one PES payload
    pub fn new(
        pid: u16,
        stream_id: u8,
        pts: Option<u64>,
        dts: Option<u64>,
        nearest_pts: Option<u64>,
        data: Bytes,
    ) -> Self {
        Self {
            pid,
            stream_id,
            pts,
            dts,
            nearest_pts,
            ancillaries: Ancillary::parse_all(&data),
            data,
        }
    }
}
