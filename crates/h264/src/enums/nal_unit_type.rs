/// NAL (Network Abstraction Layer) unit types as defined by ISO/IEC 14496-10:2022 (Table 7-1).
///
/// Only the types a transport stream demuxer keeps are listed; everything from
/// [`NALUnitType::FIRST_DISCARDED`] upwards (prefix units, subset SPS, 3D/MVC
/// extensions, reserved and unspecified values) is dropped by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NALUnitType {
    /// Unspecified (not used in decoding)
    Unspecified = 0,

    /// Regular video slice (non-IDR picture)
    NonIDRSliceLayerWithoutPartitioning = 1,

    /// Coded slice data partition A
    SliceDataPartitionALayer = 2,

    /// Coded slice data partition B
    SliceDataPartitionBLayer = 3,

    /// Coded slice data partition C
    SliceDataPartitionCLayer = 4,

    /// IDR picture (used to refresh the video stream)
    IDRSliceLayerWithoutPartitioning = 5,

    /// Extra metadata (Supplemental Enhancement Information)
    SEI = 6,

    /// Sequence Parameter Set (SPS)
    SPS = 7,

    /// Picture Parameter Set (PPS)
    PPS = 8,

    /// Marks the start of a new access unit
    AccessUnitDelimiter = 9,

    /// End of video sequence
    EndOfSeq = 10,

    /// End of video stream
    EndOfStream = 11,

    /// Filler data
    FillerData = 12,

    /// Extension to SPS
    SPSExtension = 13,
}

impl NALUnitType {
    /// The first `nal_unit_type` value that is never surfaced.
    pub const FIRST_DISCARDED: u8 = 14;

    /// Maps the low five bits of a NAL header byte, `None` for discarded types.
    pub const fn from_header(byte: u8) -> Option<Self> {
        Some(match byte & 0x1F {
            0 => Self::Unspecified,
            1 => Self::NonIDRSliceLayerWithoutPartitioning,
            2 => Self::SliceDataPartitionALayer,
            3 => Self::SliceDataPartitionBLayer,
            4 => Self::SliceDataPartitionCLayer,
            5 => Self::IDRSliceLayerWithoutPartitioning,
            6 => Self::SEI,
            7 => Self::SPS,
            8 => Self::PPS,
            9 => Self::AccessUnitDelimiter,
            10 => Self::EndOfSeq,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            13 => Self::SPSExtension,
            _ => return None,
        })
    }

    /// True for slices of an IDR picture
    pub const fn is_idr(&self) -> bool {
        matches!(self, Self::IDRSliceLayerWithoutPartitioning)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        assert_eq!(NALUnitType::from_header(0x67), Some(NALUnitType::SPS));
        assert_eq!(NALUnitType::from_header(0x68), Some(NALUnitType::PPS));
        assert_eq!(NALUnitType::from_header(0x65), Some(NALUnitType::IDRSliceLayerWithoutPartitioning));
        assert_eq!(NALUnitType::from_header(0x0E), None);
        assert_eq!(NALUnitType::from_header(0x14), None);
        assert_eq!(NALUnitType::from_header(0x1F), None);
    }
}
