use bytes::Bytes;
use tracing::debug;

use crate::pmt::PmtStream;
use crate::{Pat, Pmt, Result};

/// Outcome of feeding a PAT section to the [`ProgramTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatUpdate {
    /// Tracking started or moved to another program/PMT PID. The previous
    /// PMT has been dropped.
    Tracking {
        /// Program now tracked
        program_number: u16,
        /// PID its PMT arrives on
        pmt_pid: u16,
    },
    /// Accepted, the tracked program is unchanged
    Unchanged,
    /// Not applicable or the wanted program is absent
    Ignored,
}

/// Outcome of feeding a PMT section to the [`ProgramTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmtUpdate {
    /// A new or newer version became the active PMT
    Activated,
    /// Same version as the active PMT
    Unchanged,
    /// Not for the tracked program or not applicable
    Ignored,
}

/// Tracks PAT -> PMT -> elementary PID mapping for a single program.
#[derive(Debug, Default)]
pub struct ProgramTracker {
    /// Wanted program; the first program in the PAT when `None`
    wanted_program: Option<u16>,
    pat: Option<Pat>,
    program_number: Option<u16>,
    pmt_pid: Option<u16>,
    pmt: Option<Pmt>,
}

impl ProgramTracker {
    /// Creates a tracker for `program_number`, or the first program seen.
    pub fn new(program_number: Option<u16>) -> Self {
        Self {
            wanted_program: program_number,
            ..Default::default()
        }
    }

    /// Handles a complete PAT section.
    pub fn handle_pat(&mut self, section: &[u8]) -> Result<PatUpdate> {
        let pat = Pat::parse(section)?;
        if !pat.is_applicable() {
            debug!(
                "Ignoring PAT version {} (current_next {}, section {})",
                pat.version_number, pat.current_next_indicator, pat.section_number
            );
            return Ok(PatUpdate::Ignored);
        }

        let selected = match self.wanted_program {
            Some(program_number) => pat.get_pmt_pid(program_number).map(|pid| (program_number, pid)),
            None => pat.first_program().map(|p| (p.program_number, p.pmt_pid)),
        };

        let Some((program_number, pmt_pid)) = selected else {
            debug!("PAT version {} has no program to track", pat.version_number);
            self.pat = Some(pat);
            return Ok(PatUpdate::Ignored);
        };

        self.pat = Some(pat);
        if self.program_number == Some(program_number) && self.pmt_pid == Some(pmt_pid) {
            return Ok(PatUpdate::Unchanged);
        }

        debug!("Tracking program {program_number} with PMT on PID 0x{pmt_pid:04x}");
        self.program_number = Some(program_number);
        self.pmt_pid = Some(pmt_pid);
        self.pmt = None;

        Ok(PatUpdate::Tracking {
            program_number,
            pmt_pid,
        })
    }

    /// Handles a complete PMT section that arrived on `pid`.
    pub fn handle_pmt(&mut self, pid: u16, section: Bytes) -> Result<PmtUpdate> {
        if self.pmt_pid != Some(pid) {
            return Ok(PmtUpdate::Ignored);
        }

        let pmt = Pmt::parse(section)?;
        if !pmt.is_applicable() || Some(pmt.program_number) != self.program_number {
            debug!(
                "Ignoring PMT for program {} version {} on PID 0x{pid:04x}",
                pmt.program_number, pmt.version_number
            );
            return Ok(PmtUpdate::Ignored);
        }

        if self.pmt.as_ref().is_some_and(|active| active.version_number == pmt.version_number) {
            return Ok(PmtUpdate::Unchanged);
        }

        debug!(
            "Activated PMT version {} for program {} with {} streams",
            pmt.version_number,
            pmt.program_number,
            pmt.streams.len()
        );
        self.pmt = Some(pmt);
        Ok(PmtUpdate::Activated)
    }

    /// True when `pid` carries the tracked program's PMT
    pub fn is_pmt_pid(&self, pid: u16) -> bool {
        self.pmt_pid == Some(pid)
    }

    /// The tracked program number
    pub fn program_number(&self) -> Option<u16> {
        self.program_number
    }

    /// The latest applicable PAT
    pub fn pat(&self) -> Option<&Pat> {
        self.pat.as_ref()
    }

    /// The active PMT
    pub fn pmt(&self) -> Option<&Pmt> {
        self.pmt.as_ref()
    }

    /// The active PMT's entry for `pid`
    pub fn stream(&self, pid: u16) -> Option<&PmtStream> {
        self.pmt.as_ref()?.get_stream(pid)
    }
}
