//! Container-agnostic decoding through symphonia

use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::audio::encoder::PcmAudio;
use crate::error::{Error, Result};

/// Decode the first audio track of `path` to interleaved integer PCM.
///
/// Sources up to 16 bits come out as 16-bit samples; wider sources keep
/// 24 or 32 bits.
pub fn decode_file(path: &Path) -> Result<PcmAudio> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::AudioError("no audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

    let bits_per_sample = output_width(
        track
            .codec_params
            .bits_per_sample
            .or(track.codec_params.bits_per_coded_sample),
    );

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<i32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;
        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u16);

        if bits_per_sample == 16 {
            let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend(buffer.samples().iter().map(|&s| s as i32));
        } else {
            // full-scale i32, shifted down to the output width
            let shift = 32 - u32::from(bits_per_sample);
            let mut buffer = SampleBuffer::<i32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend(buffer.samples().iter().map(|&s| s >> shift));
        }
    }

    let audio = PcmAudio {
        channels: channels.ok_or_else(|| Error::AudioError("unknown channel layout".to_string()))?,
        sample_rate: sample_rate
            .ok_or_else(|| Error::AudioError("unknown sample rate".to_string()))?,
        bits_per_sample,
        samples,
    };
    debug!(
        "Decoded {} frames at {} Hz from {}",
        audio.frame_count(),
        audio.sample_rate,
        path.display()
    );
    Ok(audio)
}

/// WAV sample width that holds `source_bits` without loss
fn output_width(source_bits: Option<u32>) -> u16 {
    match source_bits {
        Some(bits) if bits > 24 => 32,
        Some(bits) if bits > 16 => 24,
        _ => 16,
    }
}
