use bytes::{Bytes, BytesMut};

use crate::pes::{PES_PREFIX_LEN, PesPacket};
use crate::psi::{SECTION_HEADER_LEN, section_total_length};

/// Framing of the units carried on a PID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFraming {
    /// PES packets, sized by PES_packet_length
    Pes,
    /// PSI sections, sized by section_length
    Section,
}

/// A reassembled unit taken out of a [`PidQueue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUnit {
    /// The unit bytes, trimmed to the announced length when known
    pub data: Bytes,
    /// Stream offset of the packet that started the unit
    pub file_position: u64,
    /// Set when the starting packet carried random_access_indicator
    pub random_access_indicator: bool,
}

/// Per-PID payload accumulator.
///
/// Holds slices of the packets seen since the last payload_unit_start until
/// the announced length is reached.
#[derive(Debug, Clone)]
pub struct PidQueue {
    framing: UnitFraming,
    slices: Vec<Bytes>,
    total_length: usize,
    expected_length: Option<usize>,
    file_position: u64,
    random_access_indicator: bool,
}

impl PidQueue {
    /// Creates an empty queue
    pub fn new(framing: UnitFraming) -> Self {
        Self {
            framing,
            slices: Vec::new(),
            total_length: 0,
            expected_length: None,
            file_position: 0,
            random_access_indicator: false,
        }
    }

    /// Drops anything queued and begins a new unit with `first`.
    pub fn start(&mut self, first: Bytes, file_position: u64, random_access_indicator: bool) {
        self.reset();
        self.file_position = file_position;
        self.random_access_indicator = random_access_indicator;
        self.push(first);
    }

    /// Appends a continuation slice.
    pub fn push(&mut self, slice: Bytes) {
        if slice.is_empty() {
            return;
        }
        self.total_length += slice.len();
        self.slices.push(slice);

        if self.expected_length.is_none() {
            self.expected_length = match self.framing {
                UnitFraming::Pes => PesPacket::expected_length(&self.prefix(PES_PREFIX_LEN)),
                UnitFraming::Section => section_total_length(&self.prefix(SECTION_HEADER_LEN)),
            };
        }
    }

    /// Bytes queued so far
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Announced unit length, once the length field has been seen
    pub fn expected_length(&self) -> Option<usize> {
        self.expected_length
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// True once the announced length has been reached
    pub fn is_complete(&self) -> bool {
        self.expected_length.is_some_and(|expected| self.total_length >= expected)
    }

    /// Takes the queued unit and resets the queue.
    pub fn take(&mut self) -> Option<QueuedUnit> {
        if self.slices.is_empty() {
            return None;
        }

        let length = self.expected_length.map_or(self.total_length, |e| e.min(self.total_length));
        let data = if self.slices.len() == 1 {
            self.slices[0].slice(..length)
        } else {
            let mut buf = BytesMut::with_capacity(self.total_length);
            for slice in &self.slices {
                buf.extend_from_slice(slice);
            }
            buf.truncate(length);
            buf.freeze()
        };

        let unit = QueuedUnit {
            data,
            file_position: self.file_position,
            random_access_indicator: self.random_access_indicator,
        };
        self.reset();
        Some(unit)
    }

    /// Drops anything queued
    pub fn reset(&mut self) {
        self.slices.clear();
        self.total_length = 0;
        self.expected_length = None;
        self.random_access_indicator = false;
    }

    fn prefix(&self, len: usize) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(len);
        for slice in &self.slices {
            let take = (len - prefix.len()).min(slice.len());
            prefix.extend_from_slice(&slice[..take]);
            if prefix.len() == len {
                break;
            }
        }
        prefix
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::pes::tests::build_pes;

    #[test]
    fn test_bounded_pes_across_slices() {
        let pes = Bytes::from(build_pes(0xC0, Some(1000), None, &[7; 300], true));
        let mut queue = PidQueue::new(UnitFraming::Pes);

        queue.start(pes.slice(..4), 376, true);
        assert_eq!(queue.expected_length(), None);
        queue.push(pes.slice(4..184));
        assert_eq!(queue.expected_length(), Some(pes.len()));
        assert!(!queue.is_complete());
        queue.push(pes.slice(184..));
        assert!(queue.is_complete());

        let unit = queue.take().unwrap();
        assert_eq!(unit.data, pes);
        assert_eq!(unit.file_position, 376);
        assert!(unit.random_access_indicator);
        assert!(queue.is_empty());
        assert_eq!(queue.total_length(), 0);
    }

    #[test]
    fn test_single_slice_is_not_copied() {
        let pes = Bytes::from(build_pes(0xC0, None, None, &[1; 20], true));
        let mut queue = PidQueue::new(UnitFraming::Pes);
        queue.start(pes.clone(), 0, false);
        let unit = queue.take().unwrap();
        assert_eq!(unit.data.as_ptr(), pes.as_ptr());
    }

    #[test]
    fn test_section_trims_stuffing() {
        let mut payload = vec![0x86, 0xB0, 0x05, 1, 2, 3, 4, 5];
        payload.extend([0xFF; 20]);
        let mut queue = PidQueue::new(UnitFraming::Section);
        queue.start(Bytes::from(payload), 0, false);

        assert!(queue.is_complete());
        assert_eq!(queue.take().unwrap().data.as_ref(), &[0x86, 0xB0, 0x05, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unbounded_pes_never_completes() {
        let pes = Bytes::from(build_pes(0xE0, Some(0), None, &[0; 400], false));
        let mut queue = PidQueue::new(UnitFraming::Pes);
        queue.start(pes.slice(..184), 0, false);
        queue.push(pes.slice(184..));
        assert!(!queue.is_complete());
        assert_eq!(queue.take().unwrap().data, pes);
    }
}
