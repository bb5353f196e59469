//! Shared fixtures for the fallback chain tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use speechgen_core::{
    ConversionConfig, Error, FormatNormalizer, NeuralBackend, Orchestrator, PrimaryAdapter,
    Result, SystemAdapter, SystemConfig,
};

/// Serializes tests that write and then execute shell scripts. Executing a
/// file while another thread still holds it open for writing fails with
/// ETXTBSY on Linux.
pub static SCRIPT_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

pub const SAMPLE_RATE: u32 = 22050;

/// A 16-bit mono AIFF holding a short ramp
pub fn aiff_fixture() -> Vec<u8> {
    let samples: Vec<i16> = (0..2205).map(|i| ((i % 64) * 512 - 16384) as i16).collect();
    let sound: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();

    let mut comm = Vec::new();
    comm.extend_from_slice(&1u16.to_be_bytes());
    comm.extend_from_slice(&(samples.len() as u32).to_be_bytes());
    comm.extend_from_slice(&16u16.to_be_bytes());
    comm.extend_from_slice(&[0x40, 0x0d, 0xac, 0x44, 0, 0, 0, 0, 0, 0]);

    let mut body = b"AIFF".to_vec();
    body.extend_from_slice(b"COMM");
    body.extend_from_slice(&(comm.len() as u32).to_be_bytes());
    body.extend_from_slice(&comm);
    body.extend_from_slice(b"SSND");
    body.extend_from_slice(&(sound.len() as u32 + 8).to_be_bytes());
    body.extend_from_slice(&[0u8; 8]);
    body.extend_from_slice(&sound);

    let mut file = b"FORM".to_vec();
    file.extend_from_slice(&(body.len() as u32).to_be_bytes());
    file.extend_from_slice(&body);
    file
}

/// Write a small valid WAV file
pub fn write_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..SAMPLE_RATE / 10 {
        writer.write_sample(((i % 50) * 100) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Sorted file names directly inside `dir`
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A `say` stand-in that copies the AIFF fixture to its `-o` argument
#[cfg(unix)]
pub fn fake_say(dir: &Path) -> PathBuf {
    let fixture = dir.join("fixture.aiff");
    std::fs::write(&fixture, aiff_fixture()).unwrap();
    let body = format!(
        r#"out=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -v) shift 2 ;;
    *) shift ;;
  esac
done
cp "{}" "$out""#,
        fixture.display()
    );
    write_script(dir, "say", &body)
}

/// A transcoder stand-in that copies `source` to its last argument
#[cfg(unix)]
pub fn fake_transcoder(dir: &Path, name: &str, source: &Path) -> PathBuf {
    let body = format!(
        "for last; do :; done\ncp \"{}\" \"$last\"",
        source.display()
    );
    write_script(dir, name, &body)
}

#[derive(Clone, Copy)]
pub enum PrimaryMode {
    WritesWav,
    Fails,
    ClaimsSuccessOnly,
    /// Writes a truncated file, then times out
    WritesGarbageThenFails,
}

pub struct FakeBackend(pub PrimaryMode);

#[async_trait]
impl NeuralBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn synthesize(&self, _text: &str, _model: &str, output: &Path) -> Result<()> {
        match self.0 {
            PrimaryMode::WritesWav => {
                write_wav(output);
                Ok(())
            }
            PrimaryMode::Fails => Err(Error::ToolUnavailable("tts".to_string())),
            PrimaryMode::ClaimsSuccessOnly => Ok(()),
            PrimaryMode::WritesGarbageThenFails => {
                std::fs::write(output, b"RIFF-truncated")?;
                Err(Error::Timeout {
                    program: "tts".to_string(),
                    limit: std::time::Duration::from_secs(60),
                })
            }
        }
    }
}

pub fn missing_tools(dir: &Path) -> ConversionConfig {
    ConversionConfig {
        ffmpeg_command: dir.join("no-ffmpeg").display().to_string(),
        sox_command: dir.join("no-sox").display().to_string(),
        ..ConversionConfig::default()
    }
}

pub fn system_config(command: Option<&Path>) -> SystemConfig {
    match command {
        Some(path) => SystemConfig {
            enabled: true,
            command: path.display().to_string(),
            ..SystemConfig::default()
        },
        None => SystemConfig {
            enabled: false,
            ..SystemConfig::default()
        },
    }
}

pub fn orchestrator(
    mode: PrimaryMode,
    system: SystemConfig,
    conversion: ConversionConfig,
) -> Orchestrator {
    let primary = PrimaryAdapter::new(Box::new(FakeBackend(mode)), "fallback-model");
    let system = SystemAdapter::new(system, FormatNormalizer::from_config(&conversion));
    Orchestrator::with_adapters(primary, system)
}
