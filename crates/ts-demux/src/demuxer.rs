use bytes::Bytes;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};
use ts::{
    PID_PAT, PatUpdate, PesPacket, PidQueue, PmtStream, PmtUpdate, ProbeResult, ProgramTracker, QueuedUnit, StreamKind,
    StreamType, SYNC_BYTE, TS_PACKET_SIZE, TsPacket, UnitFraming,
};
use ts_metadata::{KlvData, PesPrivateData, PesPrivateDataDescriptor, PgsData, Scte35Data, Smpte2038Data, TimedId3Data};

use crate::audio::{AudioEvent, AudioFormat, AudioState};
use crate::config::DemuxerConfig;
use crate::error::{DemuxError, ErrorKind, Result};
use crate::handler::DemuxerHandler;
use crate::media_info::{AudioMetadata, MediaInfo, TrackMetadata, VideoMetadata};
use crate::track::{AUDIO_TRACK_ID, AudioTrack, VIDEO_TRACK_ID, VideoTrack};
use crate::video::{AccessUnitInfo, VideoState};

/// Packet layout found by [`TsDemuxer::probe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PacketLayout {
    packet_size: usize,
    sync_offset: usize,
}

/// Streaming MPEG-2 transport stream demuxer.
///
/// Probe once, then feed consecutive chunks to [`TsDemuxer::parse_chunks`].
/// Each call returns how many bytes it consumed; the caller prepends the
/// rest to the next chunk.
#[derive(Debug)]
pub struct TsDemuxer {
    config: DemuxerConfig,
    layout: Option<PacketLayout>,
    /// Bytes of the lead-in before the first sync already consumed
    lead_in_skipped: usize,
    tracker: ProgramTracker,
    queues: FxHashMap<u16, PidQueue>,
    video: Option<(u16, VideoState)>,
    audio: Option<(u16, AudioState)>,
    video_track: VideoTrack,
    audio_track: AudioTrack,
    video_metadata: Option<VideoMetadata>,
    audio_metadata: Option<AudioMetadata>,
    media_info_sent: bool,
    reported_pids: FxHashSet<u16>,
    nearest_pts: Option<u64>,
}

impl TsDemuxer {
    /// Creates a demuxer. Nothing is parsed until [`TsDemuxer::probe`]
    /// succeeds.
    pub fn new(config: DemuxerConfig) -> Self {
        Self {
            tracker: ProgramTracker::new(config.program_number),
            config,
            layout: None,
            lead_in_skipped: 0,
            queues: FxHashMap::default(),
            video: None,
            audio: None,
            video_track: VideoTrack::new(VIDEO_TRACK_ID),
            audio_track: AudioTrack::new(AUDIO_TRACK_ID),
            video_metadata: None,
            audio_metadata: None,
            media_info_sent: false,
            reported_pids: FxHashSet::default(),
            nearest_pts: None,
        }
    }

    /// Detects the packet size and sync offset from the head of the stream
    /// and remembers them for [`TsDemuxer::parse_chunks`].
    pub fn probe(&mut self, data: &[u8]) -> ProbeResult {
        let result = ts::probe(data);
        if let ProbeResult::Match {
            packet_size,
            sync_offset,
        } = result
        {
            debug!("Transport stream with {packet_size} byte packets, first sync at {sync_offset}");
            self.layout = Some(PacketLayout {
                packet_size,
                sync_offset,
            });
        }
        result
    }

    /// Like [`TsDemuxer::probe`], failing when the data is not a transport
    /// stream.
    pub fn probe_or_fail(&mut self, data: &[u8]) -> Result<ProbeResult> {
        match self.probe(data) {
            ProbeResult::NoMatch => Err(DemuxError::NotTransportStream),
            result => Ok(result),
        }
    }

    /// Packet size found by the probe
    pub fn packet_size(&self) -> Option<usize> {
        self.layout.map(|layout| layout.packet_size)
    }

    /// The active configuration
    pub fn config(&self) -> &DemuxerConfig {
        &self.config
    }

    /// Demuxes every whole packet in `chunk`.
    ///
    /// `byte_start` is the stream offset of `chunk[0]` and is only used for
    /// sample file positions. Returns the number of bytes consumed, which
    /// includes any lead-in before the first sync byte; parsing stops early
    /// at a packet without a sync byte.
    pub fn parse_chunks(&mut self, chunk: Bytes, byte_start: u64, handler: &mut impl DemuxerHandler) -> Result<usize> {
        let layout = self.layout.ok_or(DemuxError::NotProbed)?;
        let prefix = layout.packet_size - TS_PACKET_SIZE;

        // The lead-in may straddle calls when the first chunk is short.
        let mut offset = layout.sync_offset.saturating_sub(self.lead_in_skipped).min(chunk.len());
        self.lead_in_skipped += offset;

        while offset + layout.packet_size <= chunk.len() {
            let packet_start = offset + prefix;
            if chunk[packet_start] != SYNC_BYTE {
                warn!(
                    "Sync byte lost at stream offset {}, found 0x{:02x}",
                    byte_start + packet_start as u64,
                    chunk[packet_start]
                );
                break;
            }

            match TsPacket::parse(chunk.slice(packet_start..packet_start + TS_PACKET_SIZE)) {
                Ok(packet) => self.handle_packet(packet, byte_start + offset as u64, handler),
                Err(e) => trace!("Skipping packet at stream offset {}: {e}", byte_start + offset as u64),
            }
            offset += layout.packet_size;
        }

        self.dispatch_samples(handler);
        Ok(offset)
    }

    /// Emits whatever is still queued at the end of the input, including
    /// the last PES of every stream whose length was never announced.
    pub fn flush(&mut self, handler: &mut impl DemuxerHandler) {
        let mut pending: Vec<(u16, QueuedUnit)> = self
            .queues
            .iter_mut()
            .filter(|(pid, _)| self.tracker.stream(**pid).is_some_and(|s| !s.kind.is_section()))
            .filter_map(|(pid, queue)| queue.take().map(|unit| (*pid, unit)))
            .collect();
        pending.sort_by_key(|(_, unit)| unit.file_position);

        for (pid, unit) in pending {
            self.handle_pes(pid, unit, handler);
        }
        self.dispatch_samples(handler);
    }

    fn handle_packet(&mut self, packet: TsPacket, file_position: u64, handler: &mut impl DemuxerHandler) {
        if packet.transport_error_indicator {
            trace!("Dropping packet with transport_error_indicator on PID 0x{:04x}", packet.pid);
            return;
        }

        let pid = packet.pid;
        let framing = if pid == PID_PAT || self.tracker.is_pmt_pid(pid) {
            UnitFraming::Section
        } else {
            match self.tracker.stream(pid).map(|stream| &stream.kind) {
                Some(StreamKind::Unsupported(_)) | None => return,
                Some(kind) if kind.is_section() => UnitFraming::Section,
                Some(_) => UnitFraming::Pes,
            }
        };

        let Some(payload) = packet.payload.clone() else {
            return;
        };
        let random_access = packet.random_access_indicator();

        let mut completed = Vec::with_capacity(2);
        let queue = self.queues.entry(pid).or_insert_with(|| PidQueue::new(framing));

        if packet.payload_unit_start_indicator {
            match framing {
                UnitFraming::Section => {
                    let Some(&pointer_field) = payload.first() else {
                        return;
                    };
                    let pointer_field = pointer_field as usize;
                    if !queue.is_empty() && pointer_field > 0 && 1 + pointer_field <= payload.len() {
                        queue.push(payload.slice(1..1 + pointer_field));
                        if queue.is_complete() {
                            completed.extend(queue.take());
                        }
                    }
                    match packet.psi_payload() {
                        Some(section) => queue.start(section, file_position, random_access),
                        None => queue.reset(),
                    }
                }
                UnitFraming::Pes => {
                    completed.extend(queue.take());
                    queue.start(payload, file_position, random_access);
                }
            }
        } else if queue.is_empty() {
            trace!("Dropping continuation without a unit start on PID 0x{pid:04x}");
            return;
        } else {
            queue.push(payload);
        }

        if queue.is_complete() {
            completed.extend(queue.take());
        }

        for unit in completed {
            match framing {
                UnitFraming::Section => self.handle_section(pid, unit, handler),
                UnitFraming::Pes => self.handle_pes(pid, unit, handler),
            }
        }
    }

    fn handle_section(&mut self, pid: u16, unit: QueuedUnit, handler: &mut impl DemuxerHandler) {
        if pid == PID_PAT {
            match self.tracker.handle_pat(&unit.data) {
                Ok(PatUpdate::Tracking { .. }) => {
                    self.queues.retain(|queued_pid, _| *queued_pid == PID_PAT);
                }
                Ok(_) => {}
                Err(e) => debug!("Ignoring PAT section: {e}"),
            }
            return;
        }

        if self.tracker.is_pmt_pid(pid) {
            match self.tracker.handle_pmt(pid, unit.data) {
                Ok(PmtUpdate::Activated) => self.activate_pmt(handler),
                Ok(_) => {}
                Err(e) => debug!("Ignoring PMT section on PID 0x{pid:04x}: {e}"),
            }
            return;
        }

        match Scte35Data::decode(pid, unit.data, self.nearest_pts) {
            Ok(data) => handler.on_scte35_metadata(data),
            Err(e) => debug!("Ignoring SCTE-35 section on PID 0x{pid:04x}: {e}"),
        }
    }

    fn activate_pmt(&mut self, handler: &mut impl DemuxerHandler) {
        let Some(pmt) = self.tracker.pmt().cloned() else {
            return;
        };

        self.queues
            .retain(|pid, _| *pid == PID_PAT || self.tracker.is_pmt_pid(*pid) || pmt.get_stream(*pid).is_some());

        let video = pmt.video_stream().map(|s| (s.elementary_pid, s.kind.clone()));
        if self.video.as_ref().map(|(pid, state)| (*pid, state.kind())) != video {
            self.video = video.and_then(|(pid, kind)| Some((pid, VideoState::for_kind(&kind)?)));
            self.video_metadata = None;
            self.media_info_sent = false;
        }

        let audio = pmt.audio_stream().map(|s| (s.elementary_pid, s.kind.clone()));
        if self.audio.as_ref().map(|(pid, state)| (*pid, state.kind())) != audio {
            let preference = self.config.aac_profile;
            self.audio = audio.and_then(|(pid, kind)| Some((pid, AudioState::new(AudioFormat::for_kind(&kind)?, preference))));
            self.audio_metadata = None;
            self.media_info_sent = false;
        }

        for stream in &pmt.streams {
            self.announce_stream(stream, handler);
        }
    }

    fn announce_stream(&mut self, stream: &PmtStream, handler: &mut impl DemuxerHandler) {
        let pid = stream.elementary_pid;
        let selected = self.video.as_ref().is_some_and(|(p, _)| *p == pid) || self.audio.as_ref().is_some_and(|(p, _)| *p == pid);

        match &stream.kind {
            StreamKind::Unsupported(stream_type) if is_media_stream_type(*stream_type) => {
                if self.reported_pids.insert(pid) {
                    warn!("Unsupported codec {stream_type:?} on PID 0x{pid:04x}");
                    handler.on_error(
                        ErrorKind::CodecUnsupported,
                        &format!("Unsupported stream type 0x{:02x} on PID 0x{pid:04x}", u8::from(*stream_type)),
                    );
                }
            }
            StreamKind::Unsupported(stream_type) => {
                trace!("Ignoring stream type 0x{:02x} on PID 0x{pid:04x}", u8::from(*stream_type));
            }
            kind if (kind.is_video() || kind.is_audio()) && !selected => {
                debug!("Ignoring additional {kind:?} stream on PID 0x{pid:04x}");
            }
            StreamKind::PesPrivate if self.config.emit_pes_private_descriptors => {
                handler.on_pes_private_data_descriptor(PesPrivateDataDescriptor {
                    pid,
                    stream_type: u8::from(stream.stream_type),
                    descriptor: stream.es_info.clone(),
                });
            }
            kind => debug!("Stream {kind:?} on PID 0x{pid:04x}"),
        }
    }

    fn handle_pes(&mut self, pid: u16, unit: QueuedUnit, handler: &mut impl DemuxerHandler) {
        let Some(kind) = self.tracker.stream(pid).map(|s| s.kind.clone()) else {
            return;
        };

        let QueuedUnit {
            data,
            file_position,
            random_access_indicator,
        } = unit;
        let pes = match PesPacket::parse(data) {
            Ok(pes) => pes,
            Err(e) => {
                debug!("Dropping PES on PID 0x{pid:04x}: {e}");
                return;
            }
        };

        let nearest_pts = self.nearest_pts;
        let pes_pts = pes.pts;
        match kind {
            StreamKind::H264 | StreamKind::H265 | StreamKind::Av1 => {
                self.handle_video(pid, pes, file_position, random_access_indicator, handler)
            }
            StreamKind::AdtsAac | StreamKind::LoasAac | StreamKind::Ac3 => self.handle_audio(pid, pes, handler),
            StreamKind::TimedId3 => handler.on_timed_id3_metadata(TimedId3Data {
                pid,
                stream_id: pes.stream_id,
                pts: pes.pts,
                dts: pes.dts,
                data: pes.payload,
            }),
            StreamKind::SynchronousKlv => handler.on_synchronous_klv_metadata(KlvData::new(
                pid,
                pes.stream_id,
                pes.pts,
                pes.dts,
                pes.payload,
            )),
            StreamKind::AsynchronousKlv => handler.on_asynchronous_klv_metadata(KlvData::new(
                pid,
                pes.stream_id,
                pes.pts,
                pes.dts,
                pes.payload,
            )),
            StreamKind::Smpte2038 => handler.on_smpte2038_metadata(Smpte2038Data::new(
                pid,
                pes.stream_id,
                pes.pts,
                pes.dts,
                nearest_pts,
                pes.payload,
            )),
            StreamKind::Pgs { language } => handler.on_pgs_subtitle_data(PgsData {
                pid,
                stream_id: pes.stream_id,
                pts: pes.pts,
                dts: pes.dts,
                lang: language,
                data: pes.payload,
            }),
            StreamKind::PesPrivate => handler.on_pes_private_data(PesPrivateData {
                pid,
                stream_id: pes.stream_id,
                pts: pes.pts,
                dts: pes.dts,
                nearest_pts,
                data: pes.payload,
            }),
            StreamKind::Scte35 | StreamKind::Unsupported(_) => {}
        }

        if pes_pts.is_some() {
            self.nearest_pts = pes_pts;
        }
    }

    fn handle_video(
        &mut self,
        pid: u16,
        pes: PesPacket,
        file_position: u64,
        random_access_indicator: bool,
        handler: &mut impl DemuxerHandler,
    ) {
        let Some((_, state)) = self.video.as_mut().filter(|(video_pid, _)| *video_pid == pid) else {
            return;
        };
        let Some(pts) = pes.pts else {
            debug!("Dropping video PES without pts on PID 0x{pid:04x}");
            return;
        };

        let info = AccessUnitInfo {
            pts,
            dts: pes.dts.unwrap_or(pts),
            file_position,
            random_access_indicator,
        };

        match state.process(pes.payload, info) {
            Ok(output) => {
                if let Some(metadata) = output.metadata {
                    self.dispatch_samples(handler);
                    handler.on_track_metadata(&TrackMetadata::Video(metadata.clone()));
                    self.video_metadata = Some(metadata);
                    self.dispatch_media_info(handler);
                }
                if let Some(sample) = output.sample {
                    self.video_track.push(sample);
                }
            }
            Err(e) => {
                warn!("Bad video codec configuration on PID 0x{pid:04x}: {e}");
                handler.on_error(ErrorKind::FormatError, &format!("Video on PID 0x{pid:04x}: {e}"));
            }
        }
    }

    fn handle_audio(&mut self, pid: u16, pes: PesPacket, handler: &mut impl DemuxerHandler) {
        let Some((_, state)) = self.audio.as_mut().filter(|(audio_pid, _)| *audio_pid == pid) else {
            return;
        };

        for event in state.process(pes.payload, pes.pts) {
            match event {
                AudioEvent::Metadata(metadata) => {
                    self.dispatch_samples(handler);
                    handler.on_track_metadata(&TrackMetadata::Audio(metadata.clone()));
                    self.audio_metadata = Some(metadata);
                    self.dispatch_media_info(handler);
                }
                AudioEvent::Sample(sample) => self.audio_track.push(sample),
            }
        }
    }

    fn dispatch_media_info(&mut self, handler: &mut impl DemuxerHandler) {
        if self.media_info_sent {
            return;
        }

        let has_video = self.video.is_some();
        let has_audio = self.audio.is_some();
        if (has_video && self.video_metadata.is_none()) || (has_audio && self.audio_metadata.is_none()) {
            return;
        }

        let info = MediaInfo::new(has_video, has_audio, self.video_metadata.as_ref(), self.audio_metadata.as_ref());
        debug!("Media info complete: {}", info.mime_type);
        handler.on_media_info(&info);
        self.media_info_sent = true;
    }

    fn dispatch_samples(&mut self, handler: &mut impl DemuxerHandler) {
        let has_audio = self.audio_track.has_samples();
        let has_video = self.video_track.has_samples();
        if !has_audio && !has_video {
            return;
        }

        handler.on_data_available(&mut self.audio_track, &mut self.video_track);
        if has_audio {
            self.audio_track.sequence_number += 1;
        }
        if has_video {
            self.video_track.sequence_number += 1;
        }
    }
}

/// Audio and video stream types worth an `on_error` when they cannot be
/// demuxed
fn is_media_stream_type(stream_type: StreamType) -> bool {
    matches!(
        stream_type,
        StreamType::Mpeg1Video | StreamType::Mpeg2Video | StreamType::Mpeg1Audio | StreamType::Mpeg2Audio | StreamType::EAc3
    )
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::test_utils::{
        AV1C_4K, BASELINE_PPS, HEVC_PPS, HEVC_SPS, HEVC_VPS, ac3_frame, adts_frame, anc_packet, annex_b,
        av1_temporal_unit, hevc_slice, high_sps, idr_slice, loas_unit, non_idr_slice, packetize, pat_section,
        pes_packet, pmt_section, section_packet,
    };

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        video_metadata: Vec<VideoMetadata>,
        audio_metadata: Vec<AudioMetadata>,
        video_data: Vec<Bytes>,
        audio_data: Vec<Bytes>,
    }

    impl DemuxerHandler for Recorder {
        fn on_error(&mut self, kind: ErrorKind, info: &str) {
            self.events.push(format!("error {kind}: {info}"));
        }

        fn on_media_info(&mut self, info: &MediaInfo) {
            self.events.push(format!("media_info {}", info.mime_type));
        }

        fn on_track_metadata(&mut self, metadata: &TrackMetadata) {
            match metadata {
                TrackMetadata::Video(video) => {
                    self.events.push(format!("video_metadata {}", video.codec_string));
                    self.video_metadata.push(video.clone());
                }
                TrackMetadata::Audio(audio) => {
                    self.events
                        .push(format!("audio_metadata {} {}", audio.codec_string, audio.sample_rate));
                    self.audio_metadata.push(audio.clone());
                }
            }
        }

        fn on_data_available(&mut self, audio: &mut AudioTrack, video: &mut VideoTrack) {
            let audio = audio.take_samples();
            if !audio.is_empty() {
                let pts: Vec<i64> = audio.iter().map(|s| s.pts).collect();
                self.events.push(format!("audio {pts:?}"));
                self.audio_data.extend(audio.into_iter().map(|s| s.data));
            }
            let video = video.take_samples();
            if !video.is_empty() {
                let timing: Vec<(i64, i64, bool)> = video.iter().map(|s| (s.pts, s.dts, s.is_keyframe)).collect();
                self.events.push(format!("video {timing:?}"));
                self.video_data.extend(video.into_iter().map(|s| s.data));
            }
        }

        fn on_timed_id3_metadata(&mut self, data: TimedId3Data) {
            self.events.push(format!("id3 {:?} {}", data.pts, data.data.len()));
        }

        fn on_synchronous_klv_metadata(&mut self, data: KlvData) {
            self.events.push(format!("klv sync {:?} {:?}", data.pts, klv_cells(&data)));
        }

        fn on_asynchronous_klv_metadata(&mut self, data: KlvData) {
            self.events.push(format!("klv async {:?} {:?}", data.pts, klv_cells(&data)));
        }

        fn on_smpte2038_metadata(&mut self, data: Smpte2038Data) {
            let packets: Vec<_> = data
                .ancillaries
                .iter()
                .map(|anc| (anc.line_number, anc.description, &anc.user_data[..]))
                .collect();
            self.events
                .push(format!("anc {:?} {:?} {packets:?}", data.pts, data.nearest_pts));
        }

        fn on_scte35_metadata(&mut self, data: Scte35Data) {
            self.events.push(format!("scte35 {:?} {:?}", data.pts, data.nearest_pts));
        }

        fn on_pes_private_data(&mut self, data: PesPrivateData) {
            self.events
                .push(format!("private {:?} {:?} {:?}", data.pts, data.nearest_pts, &data.data[..]));
        }

        fn on_pes_private_data_descriptor(&mut self, descriptor: PesPrivateDataDescriptor) {
            self.events
                .push(format!("descriptor 0x{:04x} {:?}", descriptor.pid, &descriptor.descriptor[..]));
        }
    }

    fn klv_cells(data: &KlvData) -> Vec<(u8, u8, &[u8])> {
        data.access_units
            .iter()
            .map(|unit| (unit.service_id, unit.sequence_number, &unit.data[..]))
            .collect()
    }

    const TIME_SIGNAL: [u8; 25] = [
        0xFC, 0x00, 0x16, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x06, 0x80, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    /// One program with video, audio, ID3, SCTE-35, an MPEG-2 video stream
    /// and a private stream.
    fn program_stream() -> Vec<Vec<u8>> {
        let registration: &[u8] = &[0x05, 0x04, b'T', b'E', b'S', b'T'];
        let pmt = pmt_section(
            1,
            0,
            &[
                (0x1B, 0x100, &[]),
                (0x0F, 0x101, &[]),
                (0x15, 0x102, &[]),
                (0x86, 0x103, &[]),
                (0x02, 0x104, &[]),
                (0x06, 0x105, registration),
            ],
        );

        let video = annex_b(&[&[0x09, 0xF0], &high_sps(), BASELINE_PPS, &idr_slice()]);
        let mut audio = adts_frame(3, 2, 10);
        audio.extend(adts_frame(3, 2, 10));

        let mut cc = 0;
        vec![
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt),
            section_packet(0x1000, &pmt),
            packetize(0x100, &mut cc, &pes_packet(0xE0, Some(189_000), Some(180_000), &video, false), true),
            packetize(0x101, &mut cc, &pes_packet(0xC0, Some(90_000), None, &audio, true), false),
            packetize(0x102, &mut cc, &pes_packet(0xBD, Some(93_000), None, b"ID3\x04", true), false),
            section_packet(0x103, &TIME_SIGNAL),
            packetize(0x105, &mut cc, &pes_packet(0xBD, Some(95_000), None, &[1, 2, 3], true), false),
        ]
    }

    fn run(stream: &[u8], chunk_size: usize) -> Vec<String> {
        run_recorder(stream, chunk_size).events
    }

    fn run_recorder(stream: &[u8], chunk_size: usize) -> Recorder {
        let mut demuxer = TsDemuxer::new(DemuxerConfig::default());
        assert!(demuxer.probe(stream).is_match());

        let mut handler = Recorder::default();
        let mut pending = Vec::new();
        let mut position = 0u64;
        for chunk in stream.chunks(chunk_size) {
            pending.extend_from_slice(chunk);
            let consumed = demuxer
                .parse_chunks(Bytes::from(pending.clone()), position, &mut handler)
                .unwrap();
            pending.drain(..consumed);
            position += consumed as u64;
        }
        demuxer.flush(&mut handler);
        handler
    }

    #[test]
    fn test_program_is_demuxed_in_order() {
        let stream = program_stream().concat();
        assert_eq!(
            run(&stream, stream.len()),
            vec![
                "error CodecUnsupported: Unsupported stream type 0x02 on PID 0x0104",
                "descriptor 0x0105 [5, 4, 84, 69, 83, 84]",
                "audio_metadata mp4a.40.2 48000",
                "id3 Some(93000) 4",
                "scte35 Some(0) Some(93000)",
                "private Some(95000) Some(93000) [1, 2, 3]",
                "audio [1000, 1021]",
                "video_metadata avc1.64001f",
                "media_info video/mp2t; codecs=\"avc1.64001f,mp4a.40.2\"",
                "video [(2100, 2000, true)]",
            ]
        );
    }

    #[test]
    fn test_chunked_input_is_deterministic() {
        let stream = program_stream().concat();
        let first = run(&stream, 100);
        assert_eq!(first, run(&stream, 100));

        let mut chunked = first.clone();
        let mut whole = run(&stream, stream.len());
        chunked.sort();
        whole.sort();
        assert_eq!(chunked, whole);
    }

    #[test]
    fn test_bdav_packets_with_leading_junk() {
        let packets = program_stream();
        let mut stream = vec![0x00; 5];
        for packet in packets.iter().flat_map(|p| p.chunks(TS_PACKET_SIZE)) {
            stream.extend([0x00, 0x00, 0x00, 0x00]);
            stream.extend_from_slice(packet);
        }

        let mut demuxer = TsDemuxer::new(DemuxerConfig::default());
        assert_eq!(
            demuxer.probe(&stream),
            ProbeResult::Match {
                packet_size: 192,
                sync_offset: 5
            }
        );
        assert_eq!(demuxer.packet_size(), Some(192));

        let mut handler = Recorder::default();
        let consumed = demuxer.parse_chunks(Bytes::from(stream.clone()), 0, &mut handler).unwrap();
        assert_eq!(consumed, stream.len());
        demuxer.flush(&mut handler);

        let single = packets.concat();
        assert_eq!(handler.events, run(&single, single.len()));
    }

    #[test]
    fn test_sync_loss_stops_the_call() {
        let mut stream = program_stream()[..4].concat();
        let valid = stream.len();
        stream.extend([0x00; TS_PACKET_SIZE]);

        let mut demuxer = TsDemuxer::new(DemuxerConfig::default());
        assert!(demuxer.probe(&stream).is_match());

        let mut handler = Recorder::default();
        assert_eq!(demuxer.parse_chunks(Bytes::from(stream.clone()), 0, &mut handler).unwrap(), valid);
        assert_eq!(
            demuxer
                .parse_chunks(Bytes::from(stream[valid..].to_vec()), valid as u64, &mut handler)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_parse_without_layout_fails() {
        let mut demuxer = TsDemuxer::new(DemuxerConfig::default());
        let result = demuxer.parse_chunks(Bytes::from_static(&[0x47; 188]), 0, &mut Recorder::default());
        assert!(matches!(result, Err(DemuxError::NotProbed)));
        assert!(matches!(demuxer.probe_or_fail(&[0x00; 1000]), Err(DemuxError::NotTransportStream)));
    }

    #[test]
    fn test_unbounded_video_completes_on_next_unit_start() {
        let pmt = pmt_section(1, 0, &[(0x1B, 0x100, &[])]);
        let first = annex_b(&[&high_sps(), BASELINE_PPS, &idr_slice()]);
        let second = annex_b(&[&non_idr_slice()]);

        let mut cc = 0;
        let stream = [
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt),
            packetize(0x100, &mut cc, &pes_packet(0xE0, Some(180_000), None, &first, false), false),
            packetize(0x100, &mut cc, &pes_packet(0xE0, Some(183_000), None, &second, false), false),
        ]
        .concat();

        let mut demuxer = TsDemuxer::new(DemuxerConfig::default());
        assert!(demuxer.probe(&stream).is_match());
        let mut handler = Recorder::default();
        demuxer.parse_chunks(Bytes::from(stream), 0, &mut handler).unwrap();
        assert_eq!(
            handler.events,
            vec![
                "video_metadata avc1.64001f",
                "media_info video/mp2t; codecs=\"avc1.64001f\"",
                "video [(2000, 2000, true)]",
            ]
        );

        handler.events.clear();
        demuxer.flush(&mut handler);
        assert_eq!(handler.events, vec!["video [(2033, 2033, false)]"]);
    }

    #[test]
    fn test_new_first_program_switches_tracks() {
        let mut ac3 = ac3_frame();
        ac3.extend(ac3_frame());

        let mut cc = 0;
        let stream = [
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt_section(1, 0, &[(0x0F, 0x101, &[])])),
            section_packet(PID_PAT, &pat_section(&[(2, 0x1001)])),
            section_packet(0x1000, &pmt_section(1, 0, &[(0x0F, 0x101, &[])])),
            section_packet(0x1001, &pmt_section(2, 0, &[(0x81, 0x201, &[])])),
            packetize(0x101, &mut cc, &pes_packet(0xC0, Some(0), None, &adts_frame(3, 2, 10), true), false),
            packetize(0x201, &mut cc, &pes_packet(0xBD, Some(0), None, &ac3, true), false),
        ]
        .concat();

        assert_eq!(
            run(&stream, stream.len()),
            vec![
                "audio_metadata ac-3 48000",
                "media_info video/mp2t; codecs=\"ac-3\"",
                "audio [0, 32]",
            ]
        );
    }

    #[test]
    fn test_h265_program() {
        let pmt = pmt_section(1, 0, &[(0x24, 0x100, &[])]);
        let cra = hevc_slice(21);
        let trail = hevc_slice(1);
        let idr = hevc_slice(19);

        let mut cc = 0;
        let stream = [
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt),
            packetize(
                0x100,
                &mut cc,
                &pes_packet(0xE0, Some(180_000), None, &annex_b(&[HEVC_VPS, HEVC_SPS, HEVC_PPS, &cra]), false),
                false,
            ),
            packetize(0x100, &mut cc, &pes_packet(0xE0, Some(183_000), None, &annex_b(&[&trail]), false), false),
            packetize(0x100, &mut cc, &pes_packet(0xE0, Some(186_000), None, &annex_b(&[&idr]), false), false),
        ]
        .concat();

        let recorder = run_recorder(&stream, stream.len());
        assert_eq!(
            recorder.events,
            vec![
                "video_metadata hvc1.1.2.L153.90",
                "media_info video/mp2t; codecs=\"hvc1.1.2.L153.90\"",
                "video [(2000, 2000, true), (2033, 2033, false)]",
                "video [(2066, 2066, true)]",
            ]
        );

        let metadata = &recorder.video_metadata[0];
        assert_eq!((metadata.codec_width, metadata.codec_height), (2560, 1440));
        let record = h265::HEVCDecoderConfigurationRecord::parse(&metadata.config).unwrap();
        assert_eq!(record.general_profile_idc, 1);
        assert_eq!(record.arrays.len(), 3);

        // parameter sets stay in hvcC, slices are length prefixed
        let mut first = vec![0, 0, 0, cra.len() as u8];
        first.extend(&cra);
        assert_eq!(&recorder.video_data[0][..], &first[..]);
        assert_eq!(recorder.video_data[1].len(), 4 + trail.len());
    }

    #[test]
    fn test_av1_program() {
        let registration: &[u8] = &[0x05, 0x04, b'A', b'V', b'0', b'1'];
        let pmt = pmt_section(1, 0, &[(0x06, 0x100, registration)]);
        // key frame: shown, no size override, order_hint 0, frame size equal to render size
        let key_frame = av1_temporal_unit(true, &[0x10, 0x00]);
        // inter frame: shown, not error resilient
        let inter_frame = av1_temporal_unit(false, &[0x30]);

        let mut cc = 0;
        let stream = [
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt),
            packetize(0x100, &mut cc, &pes_packet(0xBD, Some(180_000), None, &key_frame, false), false),
            packetize(0x100, &mut cc, &pes_packet(0xBD, Some(183_000), None, &inter_frame, false), false),
        ]
        .concat();

        let recorder = run_recorder(&stream, stream.len());
        assert_eq!(
            recorder.events,
            vec![
                "video_metadata av01.0.13M.08",
                "media_info video/mp2t; codecs=\"av01.0.13M.08\"",
                "video [(2000, 2000, true)]",
                "video [(2033, 2033, false)]",
            ]
        );

        let metadata = &recorder.video_metadata[0];
        assert_eq!(&metadata.config[..], AV1C_4K);
        assert_eq!((metadata.codec_width, metadata.codec_height), (3840, 2160));

        // temporal delimiters are dropped and every OBU gets a size field
        let mut key_sample = AV1C_4K[4..].to_vec();
        key_sample.extend([0x32, 0x02, 0x10, 0x00]);
        assert_eq!(&recorder.video_data[0][..], &key_sample[..]);
        assert_eq!(&recorder.video_data[1][..], &[0x32, 0x01, 0x30]);
    }

    #[test]
    fn test_loas_skips_unsupported_unit() {
        let pmt = pmt_section(1, 0, &[(0x11, 0x101, &[])]);
        let payload = [
            loas_unit(false, 0, &[0xAA; 4]),
            loas_unit(false, 1, &[0x11; 4]),
            loas_unit(true, 0, &[0xBB; 6]),
        ]
        .concat();

        let mut cc = 0;
        let stream = [
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt),
            packetize(0x101, &mut cc, &pes_packet(0xC0, Some(90_000), None, &payload, true), false),
        ]
        .concat();

        let recorder = run_recorder(&stream, stream.len());
        assert_eq!(
            recorder.events,
            vec![
                "audio_metadata mp4a.40.2 44100",
                "media_info video/mp2t; codecs=\"mp4a.40.2\"",
                "audio [1000, 1023]",
            ]
        );
        assert_eq!(&recorder.audio_metadata[0].config[..], &[0x12, 0x10]);
        assert_eq!(recorder.audio_data, vec![Bytes::from(vec![0xAA; 4]), Bytes::from(vec![0xBB; 6])]);
    }

    #[test]
    fn test_dvb_ac3_stream_gets_dac3_config() {
        let dvb_ac3_descriptor: &[u8] = &[0x6A, 0x01, 0x00];
        let pmt = pmt_section(1, 0, &[(0x06, 0x101, dvb_ac3_descriptor)]);
        let mut ac3 = ac3_frame();
        ac3.extend(ac3_frame());

        let mut cc = 0;
        let stream = [
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt),
            packetize(0x101, &mut cc, &pes_packet(0xBD, Some(0), None, &ac3, true), false),
        ]
        .concat();

        let recorder = run_recorder(&stream, stream.len());
        assert_eq!(
            recorder.events,
            vec![
                "audio_metadata ac-3 48000",
                "media_info video/mp2t; codecs=\"ac-3\"",
                "audio [0, 32]",
            ]
        );
        let metadata = &recorder.audio_metadata[0];
        assert_eq!(metadata.channel_count, 2);
        assert_eq!(&metadata.config[..], &[0x10, 0x10, 0x00]);
        assert_eq!(recorder.audio_data[0].len(), 128);
    }

    #[test]
    fn test_klv_and_smpte2038_reach_callbacks() {
        let klva: &[u8] = &[0x05, 0x04, b'K', b'L', b'V', b'A'];
        let vanc: &[u8] = &[0x05, 0x04, b'V', b'A', b'N', b'C'];
        let pmt = pmt_section(1, 0, &[(0x15, 0x102, klva), (0x06, 0x103, klva), (0x06, 0x104, vanc)]);

        let sync_cells = [0x01, 0x07, 0x80, 0x00, 0x03, 0x06, 0x0E, 0x2B];
        // the second cell claims more bytes than remain
        let async_cells = [0x02, 0x00, 0x00, 0x00, 0x01, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x09, 0xBB];
        let anc = anc_packet(9, 0x161, 0x101, &[0x1C5, 0x102]);

        let mut cc = 0;
        let stream = [
            section_packet(PID_PAT, &pat_section(&[(1, 0x1000)])),
            section_packet(0x1000, &pmt),
            packetize(0x102, &mut cc, &pes_packet(0xFC, Some(90_000), None, &sync_cells, true), false),
            packetize(0x103, &mut cc, &pes_packet(0xBD, None, None, &async_cells, true), false),
            packetize(0x104, &mut cc, &pes_packet(0xBD, None, None, &anc, true), false),
        ]
        .concat();

        assert_eq!(
            run(&stream, stream.len()),
            vec![
                "klv sync Some(90000) [(1, 7, [6, 14, 43])]",
                "klv async None [(2, 0, [170])]",
                "anc None Some(90000) [(9, \"EIA-708\", [197, 2])]",
            ]
        );
    }

    #[test]
    fn test_short_first_chunk_keeps_skipping_lead_in() {
        let packets = program_stream();
        let mut stream = vec![0x00; 5];
        for packet in packets.iter().flat_map(|p| p.chunks(TS_PACKET_SIZE)) {
            stream.extend([0x00, 0x00, 0x00, 0x00]);
            stream.extend_from_slice(packet);
        }

        let mut demuxer = TsDemuxer::new(DemuxerConfig::default());
        assert!(matches!(demuxer.probe(&stream), ProbeResult::Match { sync_offset: 5, .. }));

        let mut handler = Recorder::default();
        assert_eq!(demuxer.parse_chunks(Bytes::copy_from_slice(&stream[..3]), 0, &mut handler).unwrap(), 3);
        assert!(handler.events.is_empty());

        let rest = Bytes::copy_from_slice(&stream[3..]);
        assert_eq!(demuxer.parse_chunks(rest, 3, &mut handler).unwrap(), stream.len() - 3);
        demuxer.flush(&mut handler);

        let single = packets.concat();
        assert_eq!(handler.events, run(&single, single.len()));
    }
}
