//! Minimal AIFF / AIFF-C reader
//!
//! Only uncompressed integer PCM is understood: plain AIFF, and AIFF-C with
//! the `NONE`, `twos` (big-endian) or `sowt` (little-endian) compression
//! types. Samples are returned exactly as stored, widened to `i32`, so
//! re-encoding with the same channel count, rate and width is lossless.

use std::path::Path;

use crate::audio::encoder::PcmAudio;
use crate::error::{Error, Result};

/// Stream parameters from the COMM chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiffInfo {
    pub channels: u16,
    pub frame_count: u32,
    /// Significant bits per sample as declared by the file
    pub sample_size: u16,
    pub sample_rate: f64,
    pub little_endian: bool,
}

impl AiffInfo {
    /// Bytes each sample occupies in the sound data
    pub fn sample_width(&self) -> usize {
        (self.sample_size as usize).div_ceil(8)
    }
}

/// Read an AIFF file from disk
pub fn read(path: &Path) -> Result<PcmAudio> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Decode an in-memory AIFF file into PCM
pub fn decode(bytes: &[u8]) -> Result<PcmAudio> {
    let (info, sound) = parse(bytes)?;
    let width = info.sample_width();
    let expected = info.frame_count as usize * info.channels as usize * width;

    if sound.len() < expected {
        return Err(Error::AudioError(format!(
            "sound data truncated: {} of {} bytes",
            sound.len(),
            expected
        )));
    }

    let samples = sound[..expected]
        .chunks_exact(width)
        .map(|raw| sample_from_bytes(raw, info.little_endian))
        .collect();

    let sample_rate = info.sample_rate.round();
    if !(1.0..=u32::MAX as f64).contains(&sample_rate) {
        return Err(Error::AudioError(format!(
            "invalid sample rate {}",
            info.sample_rate
        )));
    }

    Ok(PcmAudio {
        channels: info.channels,
        sample_rate: sample_rate as u32,
        bits_per_sample: (width * 8) as u16,
        samples,
    })
}

/// Locate the COMM and SSND chunks
pub fn parse(bytes: &[u8]) -> Result<(AiffInfo, &[u8])> {
    if bytes.len() < 12 || &bytes[0..4] != b"FORM" {
        return Err(Error::AudioError("not an IFF file".to_string()));
    }
    let is_aifc = match &bytes[8..12] {
        b"AIFF" => false,
        b"AIFC" => true,
        other => {
            return Err(Error::AudioError(format!(
                "unexpected form type {:?}",
                String::from_utf8_lossy(other)
            )))
        }
    };

    let mut info = None;
    let mut sound = None;
    let mut offset = 12;

    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = be_u32(&bytes[offset + 4..offset + 8]) as usize;
        let body_start = offset + 8;
        let body_end = body_start
            .checked_add(size)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| Error::AudioError("chunk runs past end of file".to_string()))?;
        let body = &bytes[body_start..body_end];

        match id {
            b"COMM" => info = Some(parse_comm(body, is_aifc)?),
            b"SSND" => {
                if body.len() < 8 {
                    return Err(Error::AudioError("SSND chunk too short".to_string()));
                }
                let data_offset = be_u32(&body[0..4]) as usize;
                let data = body
                    .get(8 + data_offset..)
                    .ok_or_else(|| Error::AudioError("SSND offset out of range".to_string()))?;
                sound = Some(data);
            }
            _ => {}
        }

        // chunks are padded to an even length
        offset = body_end + (size & 1);
    }

    let info = info.ok_or_else(|| Error::AudioError("missing COMM chunk".to_string()))?;
    if info.frame_count == 0 {
        return Ok((info, &[][..]));
    }
    let sound = sound.ok_or_else(|| Error::AudioError("missing SSND chunk".to_string()))?;
    Ok((info, sound))
}

fn parse_comm(body: &[u8], is_aifc: bool) -> Result<AiffInfo> {
    if body.len() < 18 {
        return Err(Error::AudioError("COMM chunk too short".to_string()));
    }

    let channels = u16::from_be_bytes([body[0], body[1]]);
    let frame_count = be_u32(&body[2..6]);
    let sample_size = u16::from_be_bytes([body[6], body[7]]);
    let mut rate = [0u8; 10];
    rate.copy_from_slice(&body[8..18]);
    let sample_rate = extended_to_f64(rate);

    let little_endian = if is_aifc {
        let compression = body
            .get(18..22)
            .ok_or_else(|| Error::AudioError("AIFF-C COMM chunk lacks compression type".to_string()))?;
        match compression {
            b"NONE" | b"twos" => false,
            b"sowt" => true,
            other => {
                return Err(Error::AudioError(format!(
                    "unsupported compression {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        }
    } else {
        false
    };

    if channels == 0 {
        return Err(Error::AudioError("zero channels".to_string()));
    }
    if !(1..=32).contains(&sample_size) {
        return Err(Error::AudioError(format!("unsupported sample size {}", sample_size)));
    }
    if little_endian && sample_size > 16 {
        return Err(Error::AudioError("sowt is only defined for 16-bit samples".to_string()));
    }

    Ok(AiffInfo {
        channels,
        frame_count,
        sample_size,
        sample_rate,
        little_endian,
    })
}

fn sample_from_bytes(raw: &[u8], little_endian: bool) -> i32 {
    let mut value: i32 = 0;
    if little_endian {
        for &b in raw.iter().rev() {
            value = (value << 8) | b as i32;
        }
    } else {
        for &b in raw {
            value = (value << 8) | b as i32;
        }
    }
    // sign-extend from the stored width
    let shift = 32 - 8 * raw.len() as u32;
    (value << shift) >> shift
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// IEEE 754 80-bit extended precision, as used for the AIFF sample rate
pub fn extended_to_f64(bytes: [u8; 10]) -> f64 {
    let negative = bytes[0] & 0x80 != 0;
    let exponent = (((bytes[0] & 0x7f) as i32) << 8) | bytes[1] as i32;
    let mut mantissa_bytes = [0u8; 8];
    mantissa_bytes.copy_from_slice(&bytes[2..10]);
    let mantissa = u64::from_be_bytes(mantissa_bytes);

    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }
    if exponent == 0x7fff {
        return f64::NAN;
    }

    let value = mantissa as f64 * 2f64.powi(exponent - 16383 - 63);
    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_bytes(rate: u32) -> [u8; 10] {
        let shift = rate.leading_zeros();
        let mantissa = (rate as u64) << (32 + shift);
        let exponent = (16383 + 31 - shift) as u16;
        let mut out = [0u8; 10];
        out[0..2].copy_from_slice(&exponent.to_be_bytes());
        out[2..10].copy_from_slice(&mantissa.to_be_bytes());
        out
    }

    fn build(form: &[u8; 4], comm_extra: &[u8], channels: u16, bits: u16, sound: &[u8]) -> Vec<u8> {
        let width = (bits as usize).div_ceil(8);
        let frames = (sound.len() / width / channels as usize) as u32;

        let mut comm = Vec::new();
        comm.extend_from_slice(&channels.to_be_bytes());
        comm.extend_from_slice(&frames.to_be_bytes());
        comm.extend_from_slice(&bits.to_be_bytes());
        comm.extend_from_slice(&rate_bytes(22050));
        comm.extend_from_slice(comm_extra);

        let mut body = Vec::new();
        body.extend_from_slice(form);
        body.extend_from_slice(b"COMM");
        body.extend_from_slice(&(comm.len() as u32).to_be_bytes());
        body.extend_from_slice(&comm);
        if comm.len() % 2 == 1 {
            body.push(0);
        }
        body.extend_from_slice(b"SSND");
        body.extend_from_slice(&(sound.len() as u32 + 8).to_be_bytes());
        body.extend_from_slice(&[0u8; 8]);
        body.extend_from_slice(sound);

        let mut file = Vec::new();
        file.extend_from_slice(b"FORM");
        file.extend_from_slice(&(body.len() as u32).to_be_bytes());
        file.extend_from_slice(&body);
        file
    }

    #[test]
    fn test_extended_rates() {
        for rate in [8000u32, 22050, 44100, 48000] {
            assert_eq!(extended_to_f64(rate_bytes(rate)), rate as f64);
        }
        assert_eq!(extended_to_f64([0; 10]), 0.0);
    }

    #[test]
    fn test_decode_big_endian_16bit() {
        let sound = [0x00, 0x01, 0xff, 0xff, 0x7f, 0xff, 0x80, 0x00];
        let audio = decode(&build(b"AIFF", &[], 1, 16, &sound)).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.bits_per_sample, 16);
        assert_eq!(audio.samples, vec![1, -1, 32767, -32768]);
    }

    #[test]
    fn test_decode_aifc_sowt() {
        let mut extra = b"sowt".to_vec();
        extra.extend_from_slice(&[0]);
        let sound = [0x01, 0x00, 0xff, 0xff];
        let audio = decode(&build(b"AIFC", &extra, 2, 16, &sound)).unwrap();
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frame_count(), 1);
        assert_eq!(audio.samples, vec![1, -1]);
    }

    #[test]
    fn test_decode_24bit_sign_extension() {
        let sound = [0xff, 0xff, 0xfe, 0x00, 0x00, 0x02];
        let audio = decode(&build(b"AIFF", &[], 1, 24, &sound)).unwrap();
        assert_eq!(audio.bits_per_sample, 24);
        assert_eq!(audio.samples, vec![-2, 2]);
    }

    #[test]
    fn test_rejects_compressed_aifc() {
        let mut extra = b"ima4".to_vec();
        extra.extend_from_slice(&[0]);
        let err = decode(&build(b"AIFC", &extra, 1, 16, &[0, 0])).unwrap_err();
        assert!(err.to_string().contains("unsupported compression"));
    }

    #[test]
    fn test_rejects_wav_bytes() {
        assert!(decode(b"RIFF\0\0\0\0WAVEfmt ").is_err());
    }

    #[test]
    fn test_rejects_truncated_sound() {
        let mut file = build(b"AIFF", &[], 1, 16, &[0, 1, 0, 2]);
        // claim more frames than are stored
        let comm_frames = 12 + 8 + 2;
        file[comm_frames..comm_frames + 4].copy_from_slice(&100u32.to_be_bytes());
        assert!(decode(&file).is_err());
    }
}
