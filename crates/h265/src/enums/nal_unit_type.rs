/// NAL unit types as defined by ISO/IEC 23008-2 Table 7-1.
///
/// Reserved and unspecified values are kept as [`NALUnitType::Other`].
#[derive(Debug, Clone, PartialEq, Copy, Eq, Hash)]
pub enum NALUnitType {
    /// Trailing picture, sub-layer non-reference
    TrailN,
    /// Trailing picture, sub-layer reference
    TrailR,
    /// Temporal sub-layer access, non-reference
    TsaN,
    /// Temporal sub-layer access, reference
    TsaR,
    /// Step-wise temporal sub-layer access, non-reference
    StsaN,
    /// Step-wise temporal sub-layer access, reference
    StsaR,
    /// Random access decodable leading, non-reference
    RadlN,
    /// Random access decodable leading, reference
    RadlR,
    /// Random access skipped leading, non-reference
    RaslN,
    /// Random access skipped leading, reference
    RaslR,
    /// Broken link access with leading pictures
    BlaWLp,
    /// Broken link access with RADL pictures
    BlaWRadl,
    /// Broken link access without leading pictures
    BlaNLp,
    /// IDR with RADL pictures
    IdrWRadl,
    /// IDR without leading pictures
    IdrNLp,
    /// Clean random access
    CraNut,
    /// Video parameter set
    VpsNut,
    /// Sequence parameter set
    SpsNut,
    /// Picture parameter set
    PpsNut,
    /// Access unit delimiter
    AudNut,
    /// End of sequence
    EosNut,
    /// End of bitstream
    EobNut,
    /// Filler data
    FdNut,
    /// Prefix SEI
    PrefixSeiNut,
    /// Suffix SEI
    SuffixSeiNut,
    /// Reserved (10..=15, 22..=31, 41..=47) or unspecified (48..=63)
    Other(u8),
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value & 0x3F {
            0 => Self::TrailN,
            1 => Self::TrailR,
            2 => Self::TsaN,
            3 => Self::TsaR,
            4 => Self::StsaN,
            5 => Self::StsaR,
            6 => Self::RadlN,
            7 => Self::RadlR,
            8 => Self::RaslN,
            9 => Self::RaslR,
            16 => Self::BlaWLp,
            17 => Self::BlaWRadl,
            18 => Self::BlaNLp,
            19 => Self::IdrWRadl,
            20 => Self::IdrNLp,
            21 => Self::CraNut,
            32 => Self::VpsNut,
            33 => Self::SpsNut,
            34 => Self::PpsNut,
            35 => Self::AudNut,
            36 => Self::EosNut,
            37 => Self::EobNut,
            38 => Self::FdNut,
            39 => Self::PrefixSeiNut,
            40 => Self::SuffixSeiNut,
            other => Self::Other(other),
        }
    }
}

impl NALUnitType {
    /// The 6-bit `nal_unit_type` value.
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::TrailN => 0,
            Self::TrailR => 1,
            Self::TsaN => 2,
            Self::TsaR => 3,
            Self::StsaN => 4,
            Self::StsaR => 5,
            Self::RadlN => 6,
            Self::RadlR => 7,
            Self::RaslN => 8,
            Self::RaslR => 9,
            Self::BlaWLp => 16,
            Self::BlaWRadl => 17,
            Self::BlaNLp => 18,
            Self::IdrWRadl => 19,
            Self::IdrNLp => 20,
            Self::CraNut => 21,
            Self::VpsNut => 32,
            Self::SpsNut => 33,
            Self::PpsNut => 34,
            Self::AudNut => 35,
            Self::EosNut => 36,
            Self::EobNut => 37,
            Self::FdNut => 38,
            Self::PrefixSeiNut => 39,
            Self::SuffixSeiNut => 40,
            Self::Other(value) => *value,
        }
    }

    /// Intra random access point picture (BLA, IDR, CRA and reserved 22/23).
    pub fn is_irap(&self) -> bool {
        (16..=23).contains(&self.as_u8())
    }

    /// Returns `true` if the NAL unit type class of this NAL unit type is VCL (Video Coding Layer).
    pub fn is_vcl(&self) -> bool {
        self.as_u8() <= 31
    }
}
