//! Audio subsystem: WAV decoding, streaming source and device output

pub mod decoder;
pub mod output;
pub mod source;
pub mod types;

pub use decoder::Waveform;
pub use output::{list_devices, CpalOutput, NullOutput, OutputBackend};
pub use source::WavSource;
pub use types::{AudioFrame, SamplePair, SourceFormat};
