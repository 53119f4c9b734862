//! Audio capture side of the pipeline: device discovery, the capture worker,
//! the chunk buffer that links it to transcription, and the sample-domain
//! helpers (downmix, resample) the consumer applies.

pub mod capture;
pub mod chunk;
pub mod device;
pub mod downmix;
pub mod resample;

#[cfg(test)]
mod tests;

pub use capture::{CaptureConfig, CaptureWorker};
pub use chunk::{AudioChunk, ChunkBuffer, ChunkProducer};
pub use device::{classify_loopback, AudioDeviceDescriptor, DeviceCatalog};
pub use downmix::downmix_to_mono;
pub use resample::resample;
