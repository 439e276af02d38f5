//! Builders for synthetic elementary streams and transport streams.

use bytes::Bytes;
use bytes_util::BitWriter;
use ts::{SYNC_BYTE, TS_PACKET_SIZE};

/// High profile 480x852 SPS at 30 fps
pub(crate) fn high_sps() -> Vec<u8> {
    b"gd\0\x1f\xac\xd9A\xe0m\xf9\xe6\xa0  (\0\0\x03\0\x08\0\0\x03\x01\xe0x\xc1\x8c\xb0".to_vec()
}

pub(crate) const BASELINE_PPS: &[u8] = &[0x68, 0xEB, 0xE3, 0xCB, 0x22, 0xC0];

pub(crate) fn idr_slice() -> Vec<u8> {
    vec![0x65, 0x88, 0x84, 0x21, 0xA0, 0x33, 0xFF]
}

pub(crate) fn non_idr_slice() -> Vec<u8> {
    vec![0x41, 0x9A, 0x21, 0x6C, 0x42]
}

/// Joins NAL units with 4-byte start codes.
pub(crate) fn annex_b(units: &[&[u8]]) -> Bytes {
    let mut out = Vec::new();
    for unit in units {
        out.extend_from_slice(&[0, 0, 0, 1]);
        out.extend_from_slice(unit);
    }
    Bytes::from(out)
}

/// Main profile 2560x1440 VPS, SPS and PPS at 144 fps.
pub(crate) const HEVC_VPS: &[u8] = b"@\x01\x0c\x01\xff\xff\x01@\0\0\x03\0\x90\0\0\x03\0\0\x03\0\x99\x95@\x90";
pub(crate) const HEVC_SPS: &[u8] = b"B\x01\x01\x01@\0\0\x03\0\x90\0\0\x03\0\0\x03\0\x99\xa0\x01@ \x05\xa1e\x95R\x90\x84d_\xf8\xc0Z\x80\x80\x80\x82\0\0\x03\0\x02\0\0\x03\x01 \xc0\x0b\xbc\xa2\0\x02bX\0\x011-\x08";
pub(crate) const HEVC_PPS: &[u8] = b"D\x01\xc0\x93|\x0c\xc9";

/// Slice NAL unit of the given HEVC type.
pub(crate) fn hevc_slice(nal_unit_type: u8) -> Vec<u8> {
    vec![nal_unit_type << 1, 0x01, 0xAF, 0x3C, 0x22]
}

/// Low-overhead `av1C` for an 8 bit 4:2:0 3840x2160 main profile stream.
/// Bytes 4.. are the sized sequence header OBU.
pub(crate) const AV1C_4K: &[u8] = b"\x81\r\x0c\0\n\x0f\0\0\0j\xef\xbf\xe1\xbc\x02\x19\x90\x10\x10\x10@";

/// Start-code delimited AV1 temporal unit. The sequence header OBU carries
/// no size field and one emulation prevention byte.
pub(crate) fn av1_temporal_unit(with_sequence_header: bool, frame: &[u8]) -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x01, 0x12, 0x00];
    if with_sequence_header {
        out.extend([0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x03]);
        out.extend_from_slice(&AV1C_4K[8..]);
    }
    out.extend([0x00, 0x00, 0x01, 0x30]);
    out.extend_from_slice(frame);
    out
}

/// LOAS unit with `audioMuxVersion` 0, AAC-LC 44.1 kHz stereo. A non-zero
/// `num_sub_frames` gives a layout the parser does not support.
pub(crate) fn loas_unit(same_stream_mux: bool, num_sub_frames: u64, payload: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_bit(same_stream_mux).unwrap();
    if !same_stream_mux {
        writer.write_bits(0, 1).unwrap(); // audioMuxVersion
        writer.write_bit(true).unwrap(); // allStreamsSameTimeFraming
        writer.write_bits(num_sub_frames, 6).unwrap();
        writer.write_bits(0, 4).unwrap(); // numProgram
        writer.write_bits(0, 3).unwrap(); // numLayer
        writer.write_bits(2, 5).unwrap(); // AAC LC
        writer.write_bits(4, 4).unwrap(); // 44100
        writer.write_bits(2, 4).unwrap(); // stereo
        writer.write_bits(0, 3).unwrap(); // GASpecificConfig
        writer.write_bits(0, 3).unwrap(); // frameLengthType
        writer.write_bits(0xFF, 8).unwrap(); // latmBufferFullness
        writer.write_bit(false).unwrap(); // otherDataPresent
        writer.write_bit(false).unwrap(); // crcCheckPresent
    }
    writer.write_bits(payload.len() as u64, 8).unwrap();
    for byte in payload {
        writer.write_bits(*byte as u64, 8).unwrap();
    }

    let body = writer.finish();
    let mut out = vec![0x56, 0xE0 | (body.len() >> 8) as u8, body.len() as u8];
    out.extend(body);
    out
}

/// One SMPTE ST 2038 ANC packet with a zero checksum.
pub(crate) fn anc_packet(line_number: u16, did: u16, sdid: u16, user_words: &[u16]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_bits(0, 6).unwrap();
    writer.write_bit(false).unwrap(); // c_not_y_channel_flag
    writer.write_bits(line_number as u64, 11).unwrap();
    writer.write_bits(0, 12).unwrap(); // horizontal_offset
    writer.write_bits(did as u64, 10).unwrap();
    writer.write_bits(sdid as u64, 10).unwrap();
    writer.write_bits(user_words.len() as u64, 10).unwrap();
    for word in user_words {
        writer.write_bits(*word as u64, 10).unwrap();
    }
    writer.write_bits(0, 10).unwrap(); // checksum_word
    writer.finish()
}

/// AAC-LC ADTS frame without CRC.
pub(crate) fn adts_frame(sampling_index: u8, channel_config: u8, payload_len: usize) -> Vec<u8> {
    let frame_len = 7 + payload_len;
    let mut out = vec![
        0xFF,
        0xF1,
        (1 << 6) | (sampling_index << 2) | (channel_config >> 2),
        ((channel_config & 0x03) << 6) | ((frame_len >> 11) as u8 & 0x03),
        (frame_len >> 3) as u8,
        (((frame_len & 0x07) as u8) << 5) | 0x1F,
        0xFC,
    ];
    out.extend((0..payload_len).map(|i| i as u8));
    out
}

/// 48 kHz stereo AC-3 frame, 128 bytes long.
pub(crate) fn ac3_frame() -> Vec<u8> {
    // bsid 8, bsmod 0, acmod 2 (stereo), dsurmod 0, lfeon 0
    let bsi: u16 = (8 << 11) | (2 << 5);
    let mut out = vec![0x0B, 0x77, 0x12, 0x34, 0x00, (bsi >> 8) as u8, bsi as u8];
    out.resize(128, 0x55);
    out
}

/// A single 188-byte packet, padded through the adaptation field.
pub(crate) fn ts_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8], random_access: bool) -> Vec<u8> {
    assert!(payload.len() <= 184);
    let mut packet = vec![
        SYNC_BYTE,
        ((pusi as u8) << 6) | ((pid >> 8) as u8 & 0x1F),
        pid as u8,
        0x10 | (cc & 0x0F),
    ];

    let stuffing = 184 - payload.len();
    if stuffing > 0 || random_access {
        assert!(stuffing >= 2 || !random_access);
        packet[3] |= 0x20;
        let adaptation_field_length = stuffing - 1;
        packet.push(adaptation_field_length as u8);
        if adaptation_field_length > 0 {
            packet.push(if random_access { 0x40 } else { 0x00 });
            packet.extend(std::iter::repeat_n(0xFF, adaptation_field_length - 1));
        }
    }

    packet.extend_from_slice(payload);
    assert_eq!(packet.len(), TS_PACKET_SIZE);
    packet
}

/// Splits `unit` over as many packets as it needs, starting at `cc`.
pub(crate) fn packetize(pid: u16, cc: &mut u8, unit: &[u8], random_access: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for (index, chunk) in unit.chunks(182).enumerate() {
        out.extend(ts_packet(pid, index == 0, *cc, chunk, index == 0 && random_access));
        *cc = cc.wrapping_add(1) & 0x0F;
    }
    out
}

/// A section behind a zero pointer_field, in one packet.
pub(crate) fn section_packet(pid: u16, section: &[u8]) -> Vec<u8> {
    let mut payload = vec![0x00];
    payload.extend_from_slice(section);
    ts_packet(pid, true, 0, &payload, false)
}

/// PAT section for `(program_number, pmt_pid)` entries. The CRC is not
/// checked.
pub(crate) fn pat_section(programs: &[(u16, u16)]) -> Vec<u8> {
    let mut body = vec![0x00, 0x01, 0xC1, 0x00, 0x00];
    for (program_number, pmt_pid) in programs {
        body.extend(program_number.to_be_bytes());
        body.extend((0xE000 | pmt_pid).to_be_bytes());
    }
    body.extend([0, 0, 0, 0]);

    let mut section = vec![0x00, 0xB0 | (body.len() >> 8) as u8, body.len() as u8];
    section.extend(body);
    section
}

/// PMT section for `(stream_type, pid, es_info)` entries.
pub(crate) fn pmt_section(program_number: u16, version: u8, streams: &[(u8, u16, &[u8])]) -> Vec<u8> {
    let mut body = vec![
        (program_number >> 8) as u8,
        program_number as u8,
        0xC1 | (version << 1),
        0x00,
        0x00,
        0xE1,
        0x00,
        0xF0,
        0x00,
    ];
    for (stream_type, pid, es_info) in streams {
        body.push(*stream_type);
        body.push(0xE0 | (pid >> 8) as u8);
        body.push(*pid as u8);
        body.push(0xF0 | (es_info.len() >> 8) as u8);
        body.push(es_info.len() as u8);
        body.extend_from_slice(es_info);
    }
    body.extend([0, 0, 0, 0]);

    let mut section = vec![0x02, 0xB0 | (body.len() >> 8) as u8, body.len() as u8];
    section.extend(body);
    section
}

fn timestamp(prefix: u8, ts: u64) -> [u8; 5] {
    [
        (prefix << 4) | ((ts >> 29) as u8 & 0x0E) | 1,
        (ts >> 22) as u8,
        ((ts >> 14) as u8 & 0xFE) | 1,
        (ts >> 7) as u8,
        ((ts << 1) as u8 & 0xFE) | 1,
    ]
}

/// PES packet with optional timestamps. `bounded` writes PES_packet_length,
/// otherwise it is left at zero.
pub(crate) fn pes_packet(stream_id: u8, pts: Option<u64>, dts: Option<u64>, payload: &[u8], bounded: bool) -> Vec<u8> {
    let mut header = Vec::new();
    let flags = match (pts, dts) {
        (Some(pts), Some(dts)) => {
            header.extend(timestamp(0x3, pts));
            header.extend(timestamp(0x1, dts));
            0xC0
        }
        (Some(pts), None) => {
            header.extend(timestamp(0x2, pts));
            0x80
        }
        _ => 0x00,
    };

    let packet_length = if bounded { 3 + header.len() + payload.len() } else { 0 };
    let mut out = vec![
        0x00,
        0x00,
        0x01,
        stream_id,
        (packet_length >> 8) as u8,
        packet_length as u8,
        0x80,
        flags,
        header.len() as u8,
    ];
    out.extend(header);
    out.extend_from_slice(payload);
    out
}
