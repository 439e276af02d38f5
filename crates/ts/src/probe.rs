use crate::packet::{BDAV_PACKET_SIZE, SYNC_BYTE, TS_PACKET_SIZE};

/// Leading bytes scanned for a sync pattern
const PROBE_WINDOW: usize = 1000;

/// Outcome of [`probe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// Three sync bytes were found `packet_size` apart.
    Match {
        /// 188, or 192 for BDAV/M2TS
        packet_size: usize,
        /// Offset of the first packet. For 192-byte packets this points at
        /// the 4-byte timestamp prefix, not at the sync byte.
        sync_offset: usize,
    },
    /// Not enough bytes to decide yet.
    NeedMoreData,
    /// Neither packet size matched.
    NoMatch,
}

impl ProbeResult {
    /// True for [`ProbeResult::Match`]
    pub fn is_match(&self) -> bool {
        matches!(self, ProbeResult::Match { .. })
    }
}

/// Looks for three sync bytes spaced by a candidate packet size within the
/// first bytes of `data`, trying 188 before 192.
pub fn probe(data: &[u8]) -> ProbeResult {
    if data.len() <= 3 * TS_PACKET_SIZE {
        return ProbeResult::NeedMoreData;
    }

    for packet_size in [TS_PACKET_SIZE, BDAV_PACKET_SIZE] {
        // a BDAV packet carries its timestamp before the sync byte
        let prefix = packet_size - TS_PACKET_SIZE;
        let window = PROBE_WINDOW.min(data.len().saturating_sub(3 * packet_size));

        let found = (prefix..window).find(|&i| {
            data[i] == SYNC_BYTE && data[i + packet_size] == SYNC_BYTE && data[i + 2 * packet_size] == SYNC_BYTE
        });

        if let Some(offset) = found {
            return ProbeResult::Match {
                packet_size,
                sync_offset: offset - prefix,
            };
        }
    }

    ProbeResult::NoMatch
}
