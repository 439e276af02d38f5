//! Turns video PES payloads into samples and track metadata.
//!
//! One PES carries one access unit. Parameter sets are pulled out of the
//! sample and folded into the decoder configuration record; the metadata is
//! reissued whenever that record changes.

use av1::seq::SequenceHeader;
use av1::{AV1CodecConfigurationRecord, FrameHeader, FrameSize, ObuType, StartCodeObuParser};
use bytes::{Bytes, BytesMut};
use h264::{AVCDecoderConfigurationRecord, NALUnitType as AvcNalType};
use h265::{HEVCDecoderConfigurationRecord, NALUnitType as HevcNalType};
use tracing::trace;
use ts::StreamKind;

use crate::error::Result;
use crate::media_info::{FrameRate, VideoCodec, VideoMetadata};
use crate::track::{TIMESCALE, VIDEO_TRACK_ID, VideoSample, ticks_to_ms};

/// Timing and position of the PES an access unit arrived in
#[derive(Debug, Clone, Copy)]
pub(crate) struct AccessUnitInfo {
    pub pts: u64,
    pub dts: u64,
    pub file_position: u64,
    pub random_access_indicator: bool,
}

/// Output of one access unit. `metadata` applies to `sample` and must be
/// dispatched first.
#[derive(Debug, Default)]
pub(crate) struct VideoOutput {
    pub metadata: Option<VideoMetadata>,
    pub sample: Option<VideoSample>,
}

#[derive(Debug)]
pub(crate) enum VideoState {
    H264(AvcState),
    H265(HevcState),
    Av1(Av1State),
}

impl VideoState {
    pub(crate) fn h264() -> Self {
        VideoState::H264(AvcState::default())
    }

    pub(crate) fn h265() -> Self {
        VideoState::H265(HevcState::default())
    }

    pub(crate) fn av1() -> Self {
        VideoState::Av1(Av1State::default())
    }

    /// State for a video stream kind, `None` for anything else
    pub(crate) fn for_kind(kind: &StreamKind) -> Option<Self> {
        match kind {
            StreamKind::H264 => Some(Self::h264()),
            StreamKind::H265 => Some(Self::h265()),
            StreamKind::Av1 => Some(Self::av1()),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> StreamKind {
        match self {
            VideoState::H264(_) => StreamKind::H264,
            VideoState::H265(_) => StreamKind::H265,
            VideoState::Av1(_) => StreamKind::Av1,
        }
    }

    pub(crate) fn process(&mut self, payload: Bytes, info: AccessUnitInfo) -> Result<VideoOutput> {
        match self {
            VideoState::H264(state) => state.process(payload, info),
            VideoState::H265(state) => state.process(payload, info),
            VideoState::Av1(state) => state.process(payload, info),
        }
    }
}

fn build_sample(data: Bytes, is_keyframe: bool, info: AccessUnitInfo) -> VideoSample {
    let dts = ticks_to_ms(info.dts);
    let pts = ticks_to_ms(info.pts);
    VideoSample {
        data,
        dts,
        pts,
        cts: pts - dts,
        is_keyframe,
        file_position: info.file_position,
    }
}

#[derive(Debug, Default)]
pub(crate) struct AvcState {
    sps: Option<Bytes>,
    pps: Option<Bytes>,
    details: Option<h264::SpsDetails>,
    dirty: bool,
    configured: bool,
}

impl AvcState {
    fn process(&mut self, payload: Bytes, info: AccessUnitInfo) -> Result<VideoOutput> {
        let mut out = BytesMut::with_capacity(payload.len() + 16);
        let mut is_keyframe = info.random_access_indicator;

        for nalu in h264::AnnexBParser::new(payload) {
            match nalu.nal_unit_type {
                AvcNalType::SPS => {
                    if self.sps.as_ref() != Some(&nalu.data) {
                        self.details = Some(h264::SpsDetails::parse(&nalu.data)?);
                        self.sps = Some(nalu.data);
                        self.dirty = true;
                    }
                }
                AvcNalType::PPS => {
                    if self.pps.as_ref() != Some(&nalu.data) {
                        self.pps = Some(nalu.data);
                        self.dirty = true;
                    }
                }
                nal_unit_type => {
                    is_keyframe |= nal_unit_type.is_idr();
                    nalu.put_avc1(&mut out);
                }
            }
        }

        let mut output = VideoOutput::default();
        if self.dirty {
            if let (Some(sps), Some(pps), Some(details)) = (&self.sps, &self.pps, &self.details) {
                self.dirty = false;
                self.configured = true;
                output.metadata = Some(avc_metadata(sps, pps, details)?);
            }
        }

        if self.configured && !out.is_empty() {
            output.sample = Some(build_sample(out.freeze(), is_keyframe, info));
        } else if !out.is_empty() {
            trace!("dropping h264 access unit before SPS/PPS");
        }

        Ok(output)
    }
}

fn avc_metadata(sps: &Bytes, pps: &Bytes, details: &h264::SpsDetails) -> Result<VideoMetadata> {
    let record = AVCDecoderConfigurationRecord::from_parameter_sets(sps.clone(), pps.clone(), details)?;

    Ok(VideoMetadata {
        id: VIDEO_TRACK_ID,
        timescale: TIMESCALE,
        codec: VideoCodec::Avc,
        codec_string: details.codec_string(),
        codec_width: details.width,
        codec_height: details.height,
        present_width: details.present_width(),
        present_height: details.height,
        profile: details.profile_name().to_string(),
        level: details.level_string(),
        bit_depth: details.bit_depth,
        chroma_format: details.chroma_format_idc,
        sar: details.sar,
        frame_rate: details
            .frame_rate
            .and_then(|(num, den)| FrameRate::new(details.fixed_frame_rate, num, den)),
        ref_frames: Some(details.ref_frames),
        config: record.to_bytes()?,
    })
}

#[derive(Debug, Default)]
pub(crate) struct HevcState {
    vps: Option<Bytes>,
    sps: Option<Bytes>,
    pps: Option<Bytes>,
    details: Option<h265::SpsDetails>,
    dirty: bool,
    configured: bool,
}

impl HevcState {
    fn process(&mut self, payload: Bytes, info: AccessUnitInfo) -> Result<VideoOutput> {
        let mut out = BytesMut::with_capacity(payload.len() + 16);
        let mut is_keyframe = info.random_access_indicator;

        for nalu in h265::AnnexBParser::new(payload) {
            let slot = match nalu.nal_unit_type {
                HevcNalType::VpsNut => &mut self.vps,
                HevcNalType::SpsNut => &mut self.sps,
                HevcNalType::PpsNut => &mut self.pps,
                nal_unit_type => {
                    is_keyframe |= nal_unit_type.is_irap();
                    nalu.put_hvc1(&mut out);
                    continue;
                }
            };

            if slot.as_ref() != Some(&nalu.data) {
                if nalu.nal_unit_type == HevcNalType::SpsNut {
                    self.details = Some(h265::SpsDetails::parse(&nalu.data)?);
                }
                *slot = Some(nalu.data);
                self.dirty = true;
            }
        }

        let mut output = VideoOutput::default();
        if self.dirty {
            if let (Some(vps), Some(sps), Some(pps), Some(details)) = (&self.vps, &self.sps, &self.pps, &self.details) {
                self.dirty = false;
                self.configured = true;
                output.metadata = Some(hevc_metadata(vps, sps, pps, details)?);
            }
        }

        if self.configured && !out.is_empty() {
            output.sample = Some(build_sample(out.freeze(), is_keyframe, info));
        } else if !out.is_empty() {
            trace!("dropping h265 access unit before VPS/SPS/PPS");
        }

        Ok(output)
    }
}

fn hevc_profile_name(profile_idc: u8) -> String {
    match profile_idc {
        1 => "Main".to_string(),
        2 => "Main10".to_string(),
        3 => "MainStillPicture".to_string(),
        4 => "RExt".to_string(),
        9 => "SCC".to_string(),
        other => other.to_string(),
    }
}

fn hevc_metadata(vps: &Bytes, sps: &Bytes, pps: &Bytes, details: &h265::SpsDetails) -> Result<VideoMetadata> {
    let record = HEVCDecoderConfigurationRecord::from_parameter_sets(vps.clone(), sps.clone(), pps.clone())?;

    Ok(VideoMetadata {
        id: VIDEO_TRACK_ID,
        timescale: TIMESCALE,
        codec: VideoCodec::Hevc,
        codec_string: details.codec_string(),
        codec_width: details.width,
        codec_height: details.height,
        present_width: details.present_width(),
        present_height: details.height,
        profile: hevc_profile_name(details.profile.profile_idc),
        level: format!("{:.1}", details.profile.level_idc as f64 / 30.0),
        bit_depth: details.bit_depth_luma,
        chroma_format: details.chroma_format_idc,
        sar: details.sar,
        // VUI timing declares a constant tick, there is no fixed_frame_rate flag
        frame_rate: details
            .frame_rate
            .and_then(|(time_scale, num_units)| FrameRate::new(true, time_scale, num_units)),
        ref_frames: None,
        config: record.to_bytes()?,
    })
}

#[derive(Debug, Default)]
pub(crate) struct Av1State {
    seq_payload: Option<Bytes>,
    seq: Option<SequenceHeader>,
    config: Option<Bytes>,
    frame_size: Option<FrameSize>,
    dirty: bool,
    configured: bool,
}

impl Av1State {
    fn process(&mut self, payload: Bytes, info: AccessUnitInfo) -> Result<VideoOutput> {
        let obus: Vec<_> = StartCodeObuParser::new(payload).collect();
        let mut is_keyframe = info.random_access_indicator;

        for obu in &obus {
            match obu.header.obu_type {
                ObuType::SequenceHeader => {
                    if self.seq_payload.as_ref() == Some(&obu.payload) {
                        continue;
                    }
                    let seq = SequenceHeader::parse(obu.header, &obu.payload)?;
                    let record = AV1CodecConfigurationRecord::from_sequence_header(&seq, obu.to_low_overhead());
                    self.config = Some(record.to_bytes()?);
                    self.seq = Some(seq);
                    self.seq_payload = Some(obu.payload.clone());
                    self.dirty = true;
                }
                ObuType::Frame | ObuType::FrameHeader => {
                    let Some(seq) = &self.seq else {
                        continue;
                    };
                    match FrameHeader::parse(&obu.header, &obu.payload, seq) {
                        Ok(frame) if frame.is_key_frame() => {
                            is_keyframe = true;
                            if let FrameHeader::Coded { size: Some(size), .. } = frame {
                                if self.frame_size != Some(size) {
                                    self.frame_size = Some(size);
                                    self.dirty = true;
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => trace!("undecodable av1 frame header: {e}"),
                    }
                }
                _ => {}
            }
        }

        let mut output = VideoOutput::default();
        if self.dirty {
            if let (Some(seq), Some(config)) = (&self.seq, &self.config) {
                self.dirty = false;
                self.configured = true;
                output.metadata = Some(av1_metadata(seq, config.clone(), self.frame_size));
            }
        }

        if self.configured {
            let sample = av1::to_sample(&obus);
            if !sample.is_empty() {
                output.sample = Some(build_sample(sample, is_keyframe, info));
            }
        }

        Ok(output)
    }
}

fn av1_metadata(seq: &SequenceHeader, config: Bytes, frame_size: Option<FrameSize>) -> VideoMetadata {
    let (codec_width, codec_height, present_width, present_height) = match frame_size {
        Some(size) => (size.upscaled_width, size.frame_height, size.render_width, size.render_height),
        None => {
            let width = seq.max_frame_width;
            let height = seq.max_frame_height;
            (width, height, width, height)
        }
    };

    VideoMetadata {
        id: VIDEO_TRACK_ID,
        timescale: TIMESCALE,
        codec: VideoCodec::Av1,
        codec_string: seq.codec_string(),
        codec_width,
        codec_height,
        present_width,
        present_height,
        profile: seq.seq_profile.to_string(),
        level: seq.seq_level_idx_0().to_string(),
        bit_depth: seq.color.bit_depth,
        chroma_format: seq.chroma_format_idc(),
        sar: (1, 1),
        frame_rate: seq.frame_rate().and_then(|(num, den)| {
            u32::try_from(den)
                .ok()
                .and_then(|den| FrameRate::new(seq.equal_picture_interval(), num, den))
        }),
        ref_frames: None,
        config,
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::test_utils::{BASELINE_PPS, annex_b, high_sps, idr_slice};

    fn info(pts: u64, dts: u64) -> AccessUnitInfo {
        AccessUnitInfo {
            pts,
            dts,
            file_position: 376,
            random_access_indicator: false,
        }
    }

    #[test]
    fn test_h264_parameter_sets_become_metadata() {
        let mut state = VideoState::h264();
        let payload = annex_b(&[&[0x09, 0xF0], &high_sps(), BASELINE_PPS, &idr_slice()]);

        let output = state.process(payload.clone(), info(183_000, 180_000)).unwrap();
        let metadata = output.metadata.unwrap();
        assert_eq!(metadata.codec_string, "avc1.64001f");
        assert_eq!((metadata.codec_width, metadata.codec_height), (480, 852));
        assert_eq!(metadata.profile, "High");
        assert_eq!(metadata.level, "3.1");
        assert_eq!(metadata.config[0], 0x01);
        assert_eq!(metadata.frame_rate.map(|rate| rate.fps), Some(30.0));

        let sample = output.sample.unwrap();
        assert!(sample.is_keyframe);
        assert_eq!((sample.dts, sample.pts, sample.cts), (2000, 2033, 33));
        assert_eq!(sample.file_position, 376);
        // AUD and IDR slice only
        assert_eq!(&sample.data[..6], &[0x00, 0x00, 0x00, 0x02, 0x09, 0xF0]);
        assert_eq!(sample.data.len(), 6 + 4 + idr_slice().len());

        // same parameter sets again: no new metadata
        let output = state.process(payload, info(186_000, 183_000)).unwrap();
        assert!(output.metadata.is_none());
        assert!(output.sample.is_some());
    }

    #[test]
    fn test_h264_samples_wait_for_parameter_sets() {
        let mut state = VideoState::h264();
        let output = state.process(annex_b(&[&idr_slice()]), info(0, 0)).unwrap();
        assert!(output.metadata.is_none());
        assert!(output.sample.is_none());
    }

    #[test]
    fn test_h264_bad_sps_is_an_error() {
        let mut state = VideoState::h264();
        let result = state.process(annex_b(&[&[0x67, 0x64, 0x00, 0x1F, 0xAC]]), info(0, 0));
        assert!(result.is_err());
    }
}
