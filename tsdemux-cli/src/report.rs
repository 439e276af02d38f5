use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use ts_demux::ts_metadata::{
    KlvData, PesPrivateData, PesPrivateDataDescriptor, PgsData, Scte35Data, Smpte2038Data, TimedId3Data,
};
use ts_demux::{AudioTrack, DemuxerHandler, ErrorKind, MediaInfo, TrackMetadata, VideoTrack};

/// Per-track totals
#[derive(Debug, Default)]
pub struct TrackTotals {
    pub samples: usize,
    pub bytes: usize,
    pub keyframes: usize,
    pub first_pts: Option<i64>,
    pub last_pts: Option<i64>,
}

impl TrackTotals {
    fn add(&mut self, pts: i64, bytes: usize) {
        self.samples += 1;
        self.bytes += bytes;
        self.first_pts.get_or_insert(pts);
        self.last_pts = Some(pts);
    }

    fn duration_ms(&self) -> i64 {
        match (self.first_pts, self.last_pts) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        }
    }
}

/// Logs every callback and keeps totals for the final summary.
#[derive(Debug, Default)]
pub struct Report {
    pub media_info: Option<MediaInfo>,
    pub video: TrackTotals,
    pub audio: TrackTotals,
    pub batches: usize,
    pub errors: usize,
    pub metadata: BTreeMap<&'static str, usize>,
}

impl Report {
    fn count(&mut self, kind: &'static str) {
        *self.metadata.entry(kind).or_default() += 1;
    }

    pub fn print_summary(&self) {
        info!("==================================================================");
        match &self.media_info {
            Some(media_info) => info!("Media: {}", media_info.mime_type),
            None => info!("Media: no complete program found"),
        }
        info!(
            "Video: {} samples ({} keyframes), {} bytes, {} ms",
            self.video.samples,
            self.video.keyframes,
            self.video.bytes,
            self.video.duration_ms()
        );
        info!(
            "Audio: {} samples, {} bytes, {} ms",
            self.audio.samples,
            self.audio.bytes,
            self.audio.duration_ms()
        );
        info!("Sample batches: {}, errors: {}", self.batches, self.errors);
        for (kind, count) in &self.metadata {
            info!("{kind}: {count}");
        }
    }
}

impl DemuxerHandler for Report {
    fn on_error(&mut self, kind: ErrorKind, info: &str) {
        self.errors += 1;
        warn!("{kind}: {info}");
    }

    fn on_media_info(&mut self, media_info: &MediaInfo) {
        info!(
            mime_type = %media_info.mime_type,
            width = ?media_info.width,
            height = ?media_info.height,
            fps = ?media_info.fps,
            sample_rate = ?media_info.audio_sample_rate,
            channels = ?media_info.audio_channel_count,
            "Media info"
        );
        self.media_info = Some(media_info.clone());
    }

    fn on_track_metadata(&mut self, metadata: &TrackMetadata) {
        match metadata {
            TrackMetadata::Video(video) => info!(
                "Video track: {} {}x{} (present {}x{}), profile {} level {}, {} bit, frame rate {:?}",
                video.codec_string,
                video.codec_width,
                video.codec_height,
                video.present_width,
                video.present_height,
                video.profile,
                video.level,
                video.bit_depth,
                video.frame_rate.map(|rate| rate.fps)
            ),
            TrackMetadata::Audio(audio) => info!(
                "Audio track: {} ({}), {} Hz, {} channels",
                audio.codec_string, audio.original_codec_string, audio.sample_rate, audio.channel_count
            ),
        }
    }

    fn on_data_available(&mut self, audio: &mut AudioTrack, video: &mut VideoTrack) {
        self.batches += 1;
        debug!(
            "Batch {}: {} audio samples, {} video samples",
            self.batches,
            audio.samples.len(),
            video.samples.len()
        );

        for sample in audio.take_samples() {
            self.audio.add(sample.pts, sample.data.len());
        }
        for sample in video.take_samples() {
            if sample.is_keyframe {
                self.video.keyframes += 1;
            }
            self.video.add(sample.pts, sample.data.len());
        }
    }

    fn on_timed_id3_metadata(&mut self, data: TimedId3Data) {
        debug!("ID3 on PID 0x{:04x}: {} bytes at {:?}", data.pid, data.data.len(), data.pts);
        self.count("Timed ID3");
    }

    fn on_pgs_subtitle_data(&mut self, data: PgsData) {
        debug!("PGS on PID 0x{:04x} ({:?}): {} bytes", data.pid, data.lang, data.data.len());
        self.count("PGS");
    }

    fn on_synchronous_klv_metadata(&mut self, data: KlvData) {
        debug!("KLV on PID 0x{:04x}: {} access units", data.pid, data.access_units.len());
        self.count("Synchronous KLV");
    }

    fn on_asynchronous_klv_metadata(&mut self, data: KlvData) {
        debug!("KLV on PID 0x{:04x}: {} access units", data.pid, data.access_units.len());
        self.count("Asynchronous KLV");
    }

    fn on_smpte2038_metadata(&mut self, data: Smpte2038Data) {
        for ancillary in &data.ancillaries {
            debug!(
                "SMPTE 2038 on PID 0x{:04x}: line {} {}",
                data.pid, ancillary.line_number, ancillary.description
            );
        }
        self.count("SMPTE 2038");
    }

    fn on_scte35_metadata(&mut self, data: Scte35Data) {
        info!(
            "SCTE-35 on PID 0x{:04x}: command 0x{:02x}, pts {:?}, nearest pts {:?}",
            data.pid, data.splice_command_type, data.pts, data.nearest_pts
        );
        self.count("SCTE-35");
    }

    fn on_pes_private_data(&mut self, data: PesPrivateData) {
        debug!("Private PES on PID 0x{:04x}: {} bytes", data.pid, data.data.len());
        self.count("Private PES");
    }

    fn on_pes_private_data_descriptor(&mut self, descriptor: PesPrivateDataDescriptor) {
        debug!(
            "Private stream 0x{:02x} on PID 0x{:04x} with {} descriptor bytes",
            descriptor.stream_type,
            descriptor.pid,
            descriptor.descriptor.len()
        );
    }
}
