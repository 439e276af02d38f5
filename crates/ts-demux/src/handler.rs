use ts_metadata::{KlvData, PesPrivateData, PesPrivateDataDescriptor, PgsData, Scte35Data, Smpte2038Data, TimedId3Data};

use crate::error::ErrorKind;
use crate::media_info::{MediaInfo, TrackMetadata};
use crate::track::{AudioTrack, VideoTrack};

/// Receives everything the demuxer produces.
///
/// Callbacks run synchronously from inside [`crate::TsDemuxer::parse_chunks`]
/// and [`crate::TsDemuxer::flush`]. Timed metadata callbacks default to
/// ignoring their record.
pub trait DemuxerHandler {
    /// A problem the consumer may want to surface, such as a codec the
    /// demuxer cannot handle.
    fn on_error(&mut self, kind: ErrorKind, info: &str);

    /// Program summary, sent once every track the PMT announces has
    /// metadata.
    fn on_media_info(&mut self, info: &MediaInfo);

    /// Initialization data for a track. Samples queued before a change are
    /// flushed through [`Self::on_data_available`] first.
    fn on_track_metadata(&mut self, metadata: &TrackMetadata);

    /// Pending samples. Samples left in the tracks are offered again with
    /// the next batch.
    fn on_data_available(&mut self, audio: &mut AudioTrack, video: &mut VideoTrack);

    /// Timed ID3 PES
    fn on_timed_id3_metadata(&mut self, _data: TimedId3Data) {}

    /// PGS subtitle PES
    fn on_pgs_subtitle_data(&mut self, _data: PgsData) {}

    /// KLV from a stream_type 0x15 stream
    fn on_synchronous_klv_metadata(&mut self, _data: KlvData) {}

    /// KLV from a private PES stream
    fn on_asynchronous_klv_metadata(&mut self, _data: KlvData) {}

    /// SMPTE 2038 ancillary data
    fn on_smpte2038_metadata(&mut self, _data: Smpte2038Data) {}

    /// SCTE-35 splice information
    fn on_scte35_metadata(&mut self, _data: Scte35Data) {}

    /// Private PES without a more specific route
    fn on_pes_private_data(&mut self, _data: PesPrivateData) {}

    /// ES descriptors of a private stream, sent when a PMT activates
    fn on_pes_private_data_descriptor(&mut self, _descriptor: PesPrivateDataDescriptor) {}
}
