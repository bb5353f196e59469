//! Audio containers handled in-process

pub mod aiff;
#[cfg(feature = "symphonia")]
pub mod decode;
mod encoder;

pub use encoder::{PcmAudio, WavEncoder};
