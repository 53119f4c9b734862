//! Multi-channel to mono conversion.

/// Collapse interleaved multi-channel audio to mono by averaging each frame.
/// A trailing partial frame is averaged over the samples it actually has.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let mut mono = Vec::with_capacity(interleaved.len() / channels + 1);
    let mut acc = 0.0f32;
    let mut count = 0usize;
    for &sample in interleaved {
        acc += sample;
        count += 1;
        if count == channels {
            mono.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        mono.push(acc / count as f32);
    }
    mono
}
