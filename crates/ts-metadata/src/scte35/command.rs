use std::io;

use bytes::Bytes;
use bytes_util::BitReader;

/// `splice_time()`, SCTE 35 2019 - 9.8.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpliceTime {
    /// `pts_time` when `time_specified_flag` is set, in 90 kHz units
    pub pts_time: Option<u64>,
}

impl SpliceTime {
    fn read(reader: &mut BitReader<'_>) -> io::Result<Self> {
        let time_specified = reader.read_bit()?;
        if time_specified {
            reader.skip_bits(6)?;
            Ok(Self {
                pts_time: Some(reader.read_bits_u64(33)?),
            })
        } else {
            reader.skip_bits(7)?;
            Ok(Self { pts_time: None })
        }
    }
}

/// `break_duration()`, SCTE 35 2019 - 9.8.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakDuration {
    /// `auto_return`
    pub auto_return: bool,
    /// `duration` in 90 kHz units
    pub duration: u64,
}

impl BreakDuration {
    fn read(reader: &mut BitReader<'_>) -> io::Result<Self> {
        let auto_return = reader.read_bit()?;
        reader.skip_bits(6)?;
        Ok(Self {
            auto_return,
            duration: reader.read_bits_u64(33)?,
        })
    }
}

/// Fields shared by the scheduled and the immediate splice events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpliceEventTrailer {
    /// `unique_program_id`
    pub unique_program_id: u16,
    /// `avail_num`
    pub avail_num: u8,
    /// `avails_expected`
    pub avails_expected: u8,
}

impl SpliceEventTrailer {
    fn read(reader: &mut BitReader<'_>) -> io::Result<Self> {
        Ok(Self {
            unique_program_id: reader.read_bits(16)? as u16,
            avail_num: reader.read_u8()?,
            avails_expected: reader.read_u8()?,
        })
    }
}

/// One component of a component level splice_schedule event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleComponent {
    /// `component_tag`
    pub component_tag: u8,
    /// `utc_splice_time`
    pub utc_splice_time: u32,
}

/// Event body of a splice_schedule entry that is not cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEventDetail {
    /// `out_of_network_indicator`
    pub out_of_network: bool,
    /// `utc_splice_time` for program level splices
    pub utc_splice_time: Option<u32>,
    /// Components for component level splices
    pub components: Vec<ScheduleComponent>,
    /// `break_duration()` when `duration_flag` is set
    pub break_duration: Option<BreakDuration>,
    /// Trailing ids
    pub trailer: SpliceEventTrailer,
}

/// One entry of `splice_schedule()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEvent {
    /// `splice_event_id`
    pub splice_event_id: u32,
    /// `None` when `splice_event_cancel_indicator` is set
    pub detail: Option<ScheduleEventDetail>,
}

/// One component of a component level splice_insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertComponent {
    /// `component_tag`
    pub component_tag: u8,
    /// `splice_time()` unless the splice is immediate
    pub splice_time: Option<SpliceTime>,
}

/// Body of a splice_insert that is not cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceInsertDetail {
    /// `out_of_network_indicator`
    pub out_of_network: bool,
    /// `program_splice_flag`
    pub program_splice: bool,
    /// `splice_immediate_flag`
    pub splice_immediate: bool,
    /// Program level `splice_time()`
    pub splice_time: Option<SpliceTime>,
    /// Components for component level splices
    pub components: Vec<InsertComponent>,
    /// `break_duration()` when `duration_flag` is set
    pub break_duration: Option<BreakDuration>,
    /// Trailing ids
    pub trailer: SpliceEventTrailer,
}

/// `splice_insert()`, SCTE 35 2019 - 9.7.3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceInsert {
    /// `splice_event_id`
    pub splice_event_id: u32,
    /// `None` when `splice_event_cancel_indicator` is set
    pub detail: Option<SpliceInsertDetail>,
}

/// `splice_command()` variants, SCTE 35 2019 - 9.7
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceCommand {
    /// `splice_null()` (0x00)
    SpliceNull,
    /// `splice_schedule()` (0x04)
    SpliceSchedule(Vec<ScheduleEvent>),
    /// `splice_insert()` (0x05)
    SpliceInsert(SpliceInsert),
    /// `time_signal()` (0x06)
    TimeSignal(SpliceTime),
    /// `bandwidth_reservation()` (0x07)
    BandwidthReservation,
    /// `private_command()` (0xFF)
    PrivateCommand {
        /// `identifier`
        identifier: u32,
        /// `private_byte`s
        data: Bytes,
    },
    /// A reserved command type, or any command of an encrypted section
    Unknown {
        /// `splice_command_type`
        command_type: u8,
        /// Raw command bytes
        data: Bytes,
    },
}

impl SpliceCommand {
    /// `splice_command_type` of this command
    pub fn command_type(&self) -> u8 {
        match self {
            SpliceCommand::SpliceNull => 0x00,
            SpliceCommand::SpliceSchedule(_) => 0x04,
            SpliceCommand::SpliceInsert(_) => 0x05,
            SpliceCommand::TimeSignal(_) => 0x06,
            SpliceCommand::BandwidthReservation => 0x07,
            SpliceCommand::PrivateCommand { .. } => 0xFF,
            SpliceCommand::Unknown { command_type, .. } => *command_type,
        }
    }

    /// The program level `pts_time` this command carries, if any
    pub fn pts_time(&self) -> Option<u64> {
        match self {
            SpliceCommand::TimeSignal(time) => time.pts_time,
            SpliceCommand::SpliceInsert(SpliceInsert {
                detail: Some(detail), ..
            }) => detail.splice_time.and_then(|time| time.pts_time),
            _ => None,
        }
    }

    /// `break_duration()` of a splice_insert
    pub fn break_duration(&self) -> Option<BreakDuration> {
        match self {
            SpliceCommand::SpliceInsert(SpliceInsert {
                detail: Some(detail), ..
            }) => detail.break_duration,
            _ => None,
        }
    }

    /// Decodes a command of `command_type` from `data`. `data` is the command
    /// bytes when the section announces a length, or the rest of the section.
    /// Returns the command and the number of bytes it used.
    pub(crate) fn read(command_type: u8, data: &Bytes) -> io::Result<(Self, usize)> {
        let mut reader = BitReader::new(data);

        let command = match command_type {
            0x00 => SpliceCommand::SpliceNull,
            0x04 => {
                let splice_count = reader.read_u8()?;
                let mut events = Vec::with_capacity(splice_count as usize);
                for _ in 0..splice_count {
                    events.push(read_schedule_event(&mut reader)?);
                }
                SpliceCommand::SpliceSchedule(events)
            }
            0x05 => SpliceCommand::SpliceInsert(read_splice_insert(&mut reader)?),
            0x06 => SpliceCommand::TimeSignal(SpliceTime::read(&mut reader)?),
            0x07 => SpliceCommand::BandwidthReservation,
            0xFF => {
                let identifier = reader.read_bits(32)?;
                return Ok((
                    SpliceCommand::PrivateCommand {
                        identifier,
                        data: data.slice(4..),
                    },
                    data.len(),
                ));
            }
            command_type => {
                return Ok((
                    SpliceCommand::Unknown {
                        command_type,
                        data: data.clone(),
                    },
                    data.len(),
                ));
            }
        };

        Ok((command, reader.byte_offset()))
    }
}

fn read_schedule_event(reader: &mut BitReader<'_>) -> io::Result<ScheduleEvent> {
    let splice_event_id = reader.read_bits(32)?;
    let cancel = reader.read_bit()?;
    reader.skip_bits(7)?;
    if cancel {
        return Ok(ScheduleEvent {
            splice_event_id,
            detail: None,
        });
    }

    let out_of_network = reader.read_bit()?;
    let program_splice = reader.read_bit()?;
    let duration_flag = reader.read_bit()?;
    reader.skip_bits(5)?;

    let mut utc_splice_time = None;
    let mut components = Vec::new();
    if program_splice {
        utc_splice_time = Some(reader.read_bits(32)?);
    } else {
        let component_count = reader.read_u8()?;
        for _ in 0..component_count {
            components.push(ScheduleComponent {
                component_tag: reader.read_u8()?,
                utc_splice_time: reader.read_bits(32)?,
            });
        }
    }

    let break_duration = duration_flag.then(|| BreakDuration::read(reader)).transpose()?;

    Ok(ScheduleEvent {
        splice_event_id,
        detail: Some(ScheduleEventDetail {
            out_of_network,
            utc_splice_time,
            components,
            break_duration,
            trailer: SpliceEventTrailer::read(reader)?,
        }),
    })
}

fn read_splice_insert(reader: &mut BitReader<'_>) -> io::Result<SpliceInsert> {
    let splice_event_id = reader.read_bits(32)?;
    let cancel = reader.read_bit()?;
    reader.skip_bits(7)?;
    if cancel {
        return Ok(SpliceInsert {
            splice_event_id,
            detail: None,
        });
    }

    let out_of_network = reader.read_bit()?;
    let program_splice = reader.read_bit()?;
    let duration_flag = reader.read_bit()?;
    let splice_immediate = reader.read_bit()?;
    reader.skip_bits(4)?;

    let mut splice_time = None;
    let mut components = Vec::new();
    if program_splice {
        if !splice_immediate {
            splice_time = Some(SpliceTime::read(reader)?);
        }
    } else {
        let component_count = reader.read_u8()?;
        for _ in 0..component_count {
            let component_tag = reader.read_u8()?;
            let splice_time = (!splice_immediate).then(|| SpliceTime::read(reader)).transpose()?;
            components.push(InsertComponent {
                component_tag,
                splice_time,
            });
        }
    }

    let break_duration = duration_flag.then(|| BreakDuration::read(reader)).transpose()?;

    Ok(SpliceInsert {
        splice_event_id,
        detail: Some(SpliceInsertDetail {
            out_of_network,
            program_splice,
            splice_immediate,
            splice_time,
            components,
            break_duration,
            trailer: SpliceEventTrailer::read(reader)?,
        }),
    })
}
