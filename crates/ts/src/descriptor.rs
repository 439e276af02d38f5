use bytes::Bytes;

use crate::{Result, TsError};

/// registration_descriptor
pub const TAG_REGISTRATION: u8 = 0x05;
/// ISO_639_language_descriptor
pub const TAG_ISO_639_LANGUAGE: u8 = 0x0A;
/// DVB AC-3_descriptor
pub const TAG_DVB_AC3: u8 = 0x6A;

/// One descriptor from a PMT descriptor loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// descriptor_tag
    pub tag: u8,
    /// Bytes after descriptor_length
    pub data: Bytes,
}

impl Descriptor {
    /// Splits a descriptor loop into descriptors.
    pub fn parse_loop(mut data: Bytes) -> Result<Vec<Descriptor>> {
        let mut descriptors = Vec::new();

        while data.len() >= 2 {
            let tag = data[0];
            let length = data[1] as usize;
            if data.len() < 2 + length {
                return Err(TsError::InsufficientData {
                    expected: 2 + length,
                    actual: data.len(),
                });
            }

            let mut descriptor = data.split_to(2 + length);
            descriptors.push(Descriptor {
                tag,
                data: descriptor.split_off(2),
            });
        }

        Ok(descriptors)
    }

    /// format_identifier of a registration descriptor
    pub fn registration_format_identifier(&self) -> Option<[u8; 4]> {
        if self.tag != TAG_REGISTRATION {
            return None;
        }
        self.data.get(..4)?.try_into().ok()
    }

    /// First ISO_639_language_code of a language descriptor
    pub fn iso_639_language(&self) -> Option<String> {
        if self.tag != TAG_ISO_639_LANGUAGE {
            return None;
        }
        self.data.get(..3).map(|code| String::from_utf8_lossy(code).into_owned())
    }
}
