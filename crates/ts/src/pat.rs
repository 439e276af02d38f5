use bytes::Buf;

use crate::psi::SectionHeader;
use crate::Result;

/// PAT table_id
pub const PAT_TABLE_ID: u8 = 0x00;

/// Program Association Table (PAT) - Table ID 0x00
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pat {
    /// Transport Stream ID
    pub transport_stream_id: u16,
    /// Version number
    pub version_number: u8,
    /// Current/next indicator
    pub current_next_indicator: bool,
    /// Section number
    pub section_number: u8,
    /// Last section number
    pub last_section_number: u8,
    /// Network PID from the program_number 0 entry
    pub network_pid: Option<u16>,
    /// Programs in table order, network entry excluded
    pub programs: Vec<PatProgram>,
}

/// Program entry in PAT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatProgram {
    /// Program number
    pub program_number: u16,
    /// PID of the program's PMT
    pub pmt_pid: u16,
}

impl Pat {
    /// Parse PAT from PSI section data
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = SectionHeader::parse(data, PAT_TABLE_ID)?;

        let mut network_pid = None;
        let mut programs = Vec::new();
        let mut reader = &data[SectionHeader::LEN..header.body_end()];

        while reader.remaining() >= 4 {
            let program_number = reader.get_u16();
            let pid = reader.get_u16() & 0x1FFF;

            if program_number == 0 {
                network_pid = Some(pid);
            } else {
                programs.push(PatProgram {
                    program_number,
                    pmt_pid: pid,
                });
            }
        }

        Ok(Pat {
            transport_stream_id: header.table_id_extension,
            version_number: header.version_number,
            current_next_indicator: header.current_next_indicator,
            section_number: header.section_number,
            last_section_number: header.last_section_number,
            network_pid,
            programs,
        })
    }

    /// First program in table order
    pub fn first_program(&self) -> Option<&PatProgram> {
        self.programs.first()
    }

    /// Get PMT PID for a specific program number
    pub fn get_pmt_pid(&self, program_number: u16) -> Option<u16> {
        self.programs
            .iter()
            .find(|p| p.program_number == program_number)
            .map(|p| p.pmt_pid)
    }

    /// True when the section may replace the active table
    pub fn is_applicable(&self) -> bool {
        self.current_next_indicator && self.section_number == 0
    }
}
