//! Device enumeration and loopback classification.
//!
//! Capturing remote call audio requires an input that carries the system's
//! own output (a "loopback" device such as "Stereo Mix" or a virtual cable).
//! Classification is a name heuristic over one enumeration snapshot; when it
//! finds nothing the caller must name a device explicitly.

use crate::error::PipelineError;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::debug;

/// Immutable snapshot of one device from a single enumeration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDeviceDescriptor {
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
    pub max_output_channels: u16,
}

impl AudioDeviceDescriptor {
    /// A loopback candidate has at least one input channel and a name that
    /// contains any of the configured keywords, case-insensitively.
    pub fn is_loopback_candidate(&self, keywords: &[String]) -> bool {
        if self.max_input_channels == 0 {
            return false;
        }
        let name = self.name.to_lowercase();
        keywords
            .iter()
            .any(|keyword| name.contains(&keyword.to_lowercase()))
    }
}

/// Snapshot of every device the host exposes, input-capable or not, in the
/// host's enumeration order. Indices are only meaningful against the snapshot
/// they came from.
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    descriptors: Vec<AudioDeviceDescriptor>,
}

impl DeviceCatalog {
    pub fn enumerate() -> Result<Self, PipelineError> {
        let host = cpal::default_host();
        let devices = host
            .devices()
            .map_err(|e| PipelineError::DeviceUnavailable(format!("device enumeration failed: {e}")))?;

        let mut descriptors = Vec::new();
        for (index, device) in devices.enumerate() {
            let name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());
            let max_input_channels = max_channels(device.supported_input_configs().ok());
            let max_output_channels = max_channels(device.supported_output_configs().ok());
            descriptors.push(AudioDeviceDescriptor {
                index,
                name,
                max_input_channels,
                max_output_channels,
            });
        }
        debug!(count = descriptors.len(), "enumerated audio devices");
        Ok(Self { descriptors })
    }

    #[cfg(test)]
    pub(crate) fn from_descriptors(descriptors: Vec<AudioDeviceDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[AudioDeviceDescriptor] {
        &self.descriptors
    }

    /// Find a device whose name contains `needle` (exact matches first).
    pub fn find_by_name(&self, needle: &str) -> Option<&AudioDeviceDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name == needle)
            .or_else(|| self.descriptors.iter().find(|d| d.name.contains(needle)))
    }
}

fn max_channels<I>(configs: Option<I>) -> u16
where
    I: Iterator<Item = cpal::SupportedStreamConfigRange>,
{
    configs
        .map(|iter| iter.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

/// Pick the loopback capture device, if any.
///
/// Candidates are ranked by input-channel count; ties resolve to the lowest
/// index so repeated runs are deterministic. Returns the winning device index.
pub fn classify_loopback(devices: &[AudioDeviceDescriptor], keywords: &[String]) -> Option<usize> {
    let mut best: Option<&AudioDeviceDescriptor> = None;
    for device in devices {
        if !device.is_loopback_candidate(keywords) {
            continue;
        }
        best = match best {
            Some(current) if device.max_input_channels > current.max_input_channels => Some(device),
            Some(current) => Some(current),
            None => Some(device),
        };
    }
    best.map(|d| d.index)
}

/// Re-open the device at `index` from a fresh host enumeration. The index must
/// come from a [`DeviceCatalog`] snapshot taken in the same process.
pub(crate) fn open_device(index: usize) -> Result<cpal::Device, PipelineError> {
    let host = cpal::default_host();
    let devices = host
        .devices()
        .map_err(|e| PipelineError::DeviceUnavailable(format!("device enumeration failed: {e}")))?;
    devices
        .enumerate()
        .find(|(i, _)| *i == index)
        .map(|(_, device)| device)
        .ok_or_else(|| PipelineError::DeviceUnavailable(format!("no device at index {index}")))
}
