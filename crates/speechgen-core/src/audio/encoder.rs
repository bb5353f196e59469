//! WAV encoding of decoded PCM

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Interleaved integer PCM with its stream parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    pub channels: u16,
    pub sample_rate: u32,
    /// Bits per sample: 8, 16, 24 or 32
    pub bits_per_sample: u16,
    /// Interleaved samples, each within the range of `bits_per_sample`
    pub samples: Vec<i32>,
}

impl PcmAudio {
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_ms(&self) -> f32 {
        (self.frame_count() as f32 / self.sample_rate as f32) * 1000.0
    }

    fn wav_spec(&self) -> Result<WavSpec> {
        if self.channels == 0 || self.sample_rate == 0 {
            return Err(Error::AudioError(format!(
                "invalid stream: {} channels at {} Hz",
                self.channels, self.sample_rate
            )));
        }
        if !matches!(self.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(Error::AudioError(format!(
                "unsupported sample width: {} bits",
                self.bits_per_sample
            )));
        }
        Ok(WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: SampleFormat::Int,
        })
    }
}

/// Writes [`PcmAudio`] into WAV containers without changing its parameters
pub struct WavEncoder;

impl WavEncoder {
    /// Encode to a WAV file at `path`, returning the number of bytes written.
    ///
    /// Parameters are validated before the file is created, so a validation
    /// `AudioError` never leaves anything on disk.
    pub fn encode_to_file(audio: &PcmAudio, path: &Path) -> Result<u64> {
        let spec = audio.wav_spec()?;

        let mut writer = WavWriter::create(path, spec)?;
        write_samples(&mut writer, audio)?;
        writer.finalize()?;

        let size = std::fs::metadata(path)?.len();
        debug!(
            "Encoded {} frames ({:.0} ms) to {} ({} bytes)",
            audio.frame_count(),
            audio.duration_ms(),
            path.display(),
            size
        );
        Ok(size)
    }

    /// Validate that `audio` can be encoded at all
    pub fn check(audio: &PcmAudio) -> Result<()> {
        audio.wav_spec().map(|_| ())
    }
}

fn write_samples<W>(writer: &mut WavWriter<W>, audio: &PcmAudio) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    match audio.bits_per_sample {
        8 => {
            for &sample in &audio.samples {
                writer.write_sample(sample as i8)?;
            }
        }
        16 => {
            for &sample in &audio.samples {
                writer.write_sample(sample as i16)?;
            }
        }
        _ => {
            for &sample in &audio.samples {
                writer.write_sample(sample)?;
            }
        }
    }
    Ok(())
}
