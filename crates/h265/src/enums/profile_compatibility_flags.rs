bitflags::bitflags! {
    /// `general_profile_compatibility_flag[j]` for `j` in `0..32`, kept in
    /// bitstream order: flag 0 is the most significant bit.
    ///
    /// Named constants cover the profiles of ISO/IEC 23008-2 Annex A. Bits
    /// for reserved profile indices are kept through `from_bits_retain`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProfileCompatibilityFlags: u32 {
        /// Main (A.3.2)
        const MAIN = 1 << 30;
        /// Main 10 (A.3.3)
        const MAIN_10 = 1 << 29;
        /// Main Still Picture (A.3.4)
        const MAIN_STILL_PICTURE = 1 << 28;
        /// Format range extensions (A.3.5)
        const RANGE_EXTENSIONS = 1 << 27;
        /// High throughput (A.3.6)
        const HIGH_THROUGHPUT = 1 << 26;
        /// Screen content coding extensions (A.3.7)
        const SCREEN_CONTENT_CODING = 1 << 22;
        /// High throughput screen content coding extensions (A.3.8)
        const HIGH_THROUGHPUT_SCREEN_CONTENT_CODING = 1 << 20;
    }
}

impl ProfileCompatibilityFlags {
    /// The single flag for `general_profile_idc`. Empty for values above 31.
    pub const fn for_profile_idc(profile_idc: u8) -> Self {
        if profile_idc > 31 {
            Self::empty()
        } else {
            Self::from_bits_retain(1 << (31 - profile_idc as u32))
        }
    }

    /// True when the stream declares conformance to `profile_idc`.
    pub const fn is_compatible_with(&self, profile_idc: u8) -> bool {
        let flag = Self::for_profile_idc(profile_idc).bits();
        flag != 0 && self.bits() & flag == flag
    }

    /// The flags with flag 0 in the least significant bit, which is the
    /// hex value RFC 6381 puts in the codec string.
    pub const fn reversed_bits(&self) -> u32 {
        self.bits().reverse_bits()
    }
}
