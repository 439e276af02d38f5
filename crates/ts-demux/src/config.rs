use std::fmt::Display;

use aac::AacProfilePreference;

/// Demuxer settings
#[derive(Debug, Clone)]
pub struct DemuxerConfig {
    /// Program to track, the first program of the PAT when `None`
    pub program_number: Option<u16>,

    /// AudioSpecificConfig object type policy
    pub aac_profile: AacProfilePreference,

    /// Report the PMT descriptors of private data streams
    pub emit_pes_private_descriptors: bool,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            program_number: None,
            aac_profile: AacProfilePreference::Auto,
            emit_pes_private_descriptors: true,
        }
    }
}

impl Display for DemuxerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let program_display = match self.program_number {
            Some(program_number) => program_number.to_string(),
            None => "first".to_string(),
        };

        write!(
            f,
            "DemuxerConfig {{ program_number: {}, aac_profile: {}, emit_pes_private_descriptors: {} }}",
            program_display, self.aac_profile, self.emit_pes_private_descriptors
        )
    }
}

impl DemuxerConfig {
    /// Starts a builder from the defaults
    pub fn builder() -> DemuxerConfigBuilder {
        DemuxerConfigBuilder::default()
    }
}

/// Chained setters for [`DemuxerConfig`]
#[derive(Debug, Clone, Default)]
pub struct DemuxerConfigBuilder {
    config: DemuxerConfig,
}

impl DemuxerConfigBuilder {
    /// Tracks `program_number` instead of the first program
    pub fn program_number(mut self, program_number: u16) -> Self {
        self.config.program_number = Some(program_number);
        self
    }

    /// Sets the AudioSpecificConfig policy
    pub fn aac_profile(mut self, aac_profile: AacProfilePreference) -> Self {
        self.config.aac_profile = aac_profile;
        self
    }

    /// Enables or disables private data descriptor records
    pub fn emit_pes_private_descriptors(mut self, emit: bool) -> Self {
        self.config.emit_pes_private_descriptors = emit;
        self
    }

    /// Finishes the configuration
    pub fn build(self) -> DemuxerConfig {
        self.config
    }
}
