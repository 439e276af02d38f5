use bytes::Bytes;
use tracing::trace;

use crate::frame::AC3_MIN_HEADER_LEN;
use crate::{Ac3Frame, Ac3FrameHeader};

/// Scans a buffer for AC-3 sync frames.
#[derive(Debug)]
pub struct Ac3Parser {
    data: Bytes,
    offset: usize,
    sync_offset: usize,
    eof: bool,
    has_incomplete_data: bool,
}

impl Ac3Parser {
    /// Creates a parser over `data`.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            sync_offset: 0,
            eof: false,
            has_incomplete_data: false,
        }
    }

    /// Returns the next complete sync frame.
    pub fn read_next_frame(&mut self) -> Option<Ac3Frame> {
        let data = &self.data;

        while !self.eof && self.offset + 1 < data.len() {
            let offset = self.offset;
            if data[offset] != 0x0B || data[offset + 1] != 0x77 {
                self.offset += 1;
                continue;
            }

            self.sync_offset = offset;
            if offset + AC3_MIN_HEADER_LEN > data.len() {
                self.eof = true;
                self.has_incomplete_data = true;
                break;
            }

            let header = match Ac3FrameHeader::parse(&data[offset..]) {
                Ok(header) => header,
                Err(err) => {
                    trace!("ac-3 sync at {offset} rejected: {err}");
                    self.offset += 1;
                    continue;
                }
            };

            if offset + header.frame_size > data.len() {
                self.eof = true;
                self.has_incomplete_data = true;
                break;
            }

            self.offset = offset + header.frame_size;
            return Some(Ac3Frame {
                header,
                data: data.slice(offset..offset + header.frame_size),
            });
        }

        if !self.has_incomplete_data && self.offset + 1 == data.len() && data[self.offset] == 0x0B {
            self.sync_offset = self.offset;
            self.has_incomplete_data = true;
        }
        self.eof = true;
        None
    }

    /// True once the scan stopped at a frame cut short by the buffer end.
    pub fn has_incomplete_data(&self) -> bool {
        self.has_incomplete_data
    }

    /// The unconsumed suffix starting at the truncated frame's sync word.
    pub fn incomplete_data(&self) -> Option<Bytes> {
        self.has_incomplete_data.then(|| self.data.slice(self.sync_offset..))
    }
}

impl Iterator for Ac3Parser {
    type Item = Ac3Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next_frame()
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::frame::tests::ac3_frame;

    #[test]
    fn test_splits_consecutive_frames() {
        let mut data = vec![0xFF, 0x00, 0x0B];
        data.extend(ac3_frame(0, 8, 2, false));
        data.extend(ac3_frame(0, 8, 2, false));

        let frames: Vec<_> = Ac3Parser::new(Bytes::from(data)).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data.len(), 256);
        assert_eq!(frames[0].data[..2], [0x0B, 0x77]);
        assert_eq!(frames[1].header, frames[0].header);
    }

    #[test]
    fn test_truncated_tail_is_reported() {
        let first = ac3_frame(0, 8, 7, true);
        let mut data = first.clone();
        data.extend_from_slice(&ac3_frame(0, 8, 7, true)[..100]);
        let data = Bytes::from(data);

        let mut parser = Ac3Parser::new(data.clone());
        assert!(parser.read_next_frame().is_some());
        assert!(parser.read_next_frame().is_none());
        assert!(parser.has_incomplete_data());
        assert_eq!(parser.incomplete_data().unwrap(), data.slice(first.len()..));
    }

    #[test]
    fn test_truncated_header_is_reported() {
        let mut data = ac3_frame(0, 8, 2, false);
        data.extend_from_slice(&[0x0B, 0x77, 0x00]);
        let data = Bytes::from(data);

        let mut parser = Ac3Parser::new(data.clone());
        assert_eq!(parser.by_ref().count(), 1);
        assert_eq!(parser.incomplete_data().unwrap(), data.slice(256..));
    }
}
