use bytes::{Buf, Bytes};

use crate::{Result, TsError};

/// PAT PID (always 0x0000)
pub const PID_PAT: u16 = 0x0000;

/// NULL PID (always 0x1FFF)
pub const PID_NULL: u16 = 0x1FFF;

/// Every transport packet starts with this byte
pub const SYNC_BYTE: u8 = 0x47;

/// Plain transport packet size
pub const TS_PACKET_SIZE: usize = 188;

/// BDAV (M2TS) packet size: a 4-byte timestamp prefix plus a transport packet
pub const BDAV_PACKET_SIZE: usize = 192;

/// One 188-byte transport packet. Payload and adaptation field are slices of
/// the source buffer.
#[derive(Debug, Clone)]
pub struct TsPacket {
    /// Transport Error Indicator
    pub transport_error_indicator: bool,
    /// Payload Unit Start Indicator
    pub payload_unit_start_indicator: bool,
    /// Transport Priority
    pub transport_priority: bool,
    /// Packet Identifier
    pub pid: u16,
    /// Transport Scrambling Control
    pub transport_scrambling_control: u8,
    /// Adaptation Field Control
    pub adaptation_field_control: u8,
    /// Continuity Counter
    pub continuity_counter: u8,
    /// Adaptation field bytes after the length byte (if present)
    pub adaptation_field: Option<Bytes>,
    /// Payload bytes (if present), pointer field not stripped
    pub payload: Option<Bytes>,
}

impl TsPacket {
    /// Parse a TS packet from exactly 188 bytes
    pub fn parse(data: Bytes) -> Result<Self> {
        if data.len() != TS_PACKET_SIZE {
            return Err(TsError::InvalidPacketSize(data.len()));
        }

        let mut reader = &data[..];
        let sync_byte = reader.get_u8();
        if sync_byte != SYNC_BYTE {
            return Err(TsError::InvalidSyncByte(sync_byte));
        }

        let byte1 = reader.get_u8();
        let byte2 = reader.get_u8();
        let byte3 = reader.get_u8();

        let transport_error_indicator = (byte1 & 0x80) != 0;
        let payload_unit_start_indicator = (byte1 & 0x40) != 0;
        let transport_priority = (byte1 & 0x20) != 0;
        let pid = ((byte1 as u16 & 0x1F) << 8) | byte2 as u16;

        let transport_scrambling_control = (byte3 >> 6) & 0x03;
        let adaptation_field_control = (byte3 >> 4) & 0x03;
        let continuity_counter = byte3 & 0x0F;

        let mut offset = 4;
        let mut adaptation_field = None;
        let mut payload = None;

        if adaptation_field_control == 0x02 || adaptation_field_control == 0x03 {
            let adaptation_field_length = data[offset] as usize;
            offset += 1;

            if offset + adaptation_field_length > data.len() {
                return Err(TsError::InsufficientData {
                    expected: offset + adaptation_field_length,
                    actual: data.len(),
                });
            }

            if adaptation_field_length > 0 {
                adaptation_field = Some(data.slice(offset..offset + adaptation_field_length));
            }
            offset += adaptation_field_length;
        }

        if (adaptation_field_control == 0x01 || adaptation_field_control == 0x03) && offset < data.len() {
            payload = Some(data.slice(offset..));
        }

        Ok(TsPacket {
            transport_error_indicator,
            payload_unit_start_indicator,
            transport_priority,
            pid,
            transport_scrambling_control,
            adaptation_field_control,
            continuity_counter,
            adaptation_field,
            payload,
        })
    }

    /// Check if this packet has a payload
    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control == 0x01 || self.adaptation_field_control == 0x03
    }

    /// Check if this packet has an adaptation field
    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control == 0x02 || self.adaptation_field_control == 0x03
    }

    /// Check if the adaptation field sets random_access_indicator
    pub fn random_access_indicator(&self) -> bool {
        self.adaptation_field
            .as_ref()
            .is_some_and(|field| !field.is_empty() && (field[0] & 0x40) != 0)
    }

    /// Get the PSI payload (removes pointer field if PUSI is set)
    pub fn psi_payload(&self) -> Option<Bytes> {
        let payload = self.payload.as_ref()?;
        if self.payload_unit_start_indicator {
            let pointer_field = *payload.first()? as usize;
            (1 + pointer_field < payload.len()).then(|| payload.slice(1 + pointer_field..))
        } else {
            Some(payload.clone())
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
pub(crate) mod tests {
    use super::*;

    /// Builds a 188-byte packet, padding with an adaptation field so the
    /// payload ends exactly at the packet end.
    pub(crate) fn build_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8], random_access: bool) -> Vec<u8> {
        assert!(payload.len() <= 184);
        let mut packet = vec![
            SYNC_BYTE,
            ((pusi as u8) << 6) | ((pid >> 8) as u8 & 0x1F),
            pid as u8,
            0,
        ];

        let stuffing = 184 - payload.len();
        if stuffing == 0 && !random_access {
            packet[3] = 0x10 | (cc & 0x0F);
        } else {
            assert!(stuffing >= 2 || !random_access);
            packet[3] = 0x30 | (cc & 0x0F);
            let adaptation_field_length = stuffing - 1;
            packet.push(adaptation_field_length as u8);
            if adaptation_field_length > 0 {
                packet.push(if random_access { 0x40 } else { 0x00 });
                packet.extend(std::iter::repeat_n(0xFF, adaptation_field_length - 1));
            }
        }

        packet.extend_from_slice(payload);
        assert_eq!(packet.len(), TS_PACKET_SIZE);
        packet
    }

    #[test]
    fn test_invalid_sync_byte() {
        let mut data = vec![0u8; 188];
        data[0] = 0x46;
        assert!(matches!(TsPacket::parse(Bytes::from(data)), Err(TsError::InvalidSyncByte(0x46))));
    }

    #[test]
    fn test_invalid_size() {
        assert!(matches!(
            TsPacket::parse(Bytes::from(vec![0x47; 100])),
            Err(TsError::InvalidPacketSize(100))
        ));
    }

    #[test]
    fn test_valid_packet_parsing() {
        let mut data = vec![0u8; 188];
        data[0] = 0x47;
        data[1] = 0x00;
        data[2] = 0x00;
        data[3] = 0x10;

        let packet = TsPacket::parse(Bytes::from(data)).unwrap();
        assert_eq!(packet.pid, 0);
        assert!(!packet.transport_error_indicator);
        assert!(!packet.payload_unit_start_indicator);
        assert!(!packet.transport_priority);
        assert_eq!(packet.transport_scrambling_control, 0);
        assert_eq!(packet.adaptation_field_control, 1);
        assert_eq!(packet.continuity_counter, 0);
        assert!(packet.has_payload());
        assert!(!packet.has_adaptation_field());
        assert_eq!(packet.payload.unwrap().len(), 184);
    }

    #[test]
    fn test_adaptation_field_and_random_access() {
        let data = build_packet(0x0100, true, 7, &[1, 2, 3], true);
        let packet = TsPacket::parse(Bytes::from(data)).unwrap();

        assert_eq!(packet.pid, 0x0100);
        assert_eq!(packet.continuity_counter, 7);
        assert!(packet.payload_unit_start_indicator);
        assert!(packet.random_access_indicator());
        assert_eq!(packet.payload.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_adaptation_only_has_no_payload() {
        let mut data = vec![0xFFu8; 188];
        data[..5].copy_from_slice(&[0x47, 0x01, 0x00, 0x20, 183]);
        let packet = TsPacket::parse(Bytes::from(data)).unwrap();
        assert!(packet.payload.is_none());
        assert!(packet.psi_payload().is_none());
    }

    #[test]
    fn test_psi_payload_skips_pointer_field() {
        let mut payload = vec![2, 0xAA, 0xBB, 0x00, 0xB0, 0x0D];
        payload.resize(184, 0xFF);
        let packet = TsPacket::parse(Bytes::from(build_packet(0, true, 0, &payload, false))).unwrap();
        let psi = packet.psi_payload().unwrap();
        assert_eq!(psi[..3], [0x00, 0xB0, 0x0D]);
    }
}
