use super::chunk::{AudioChunk, ChunkBuffer};
use super::device::{classify_loopback, AudioDeviceDescriptor, DeviceCatalog};
use super::downmix::downmix_to_mono;
use super::resample::{basic_resample, resample, resample_linear};

fn chunk(samples: Vec<f32>, channels: u16) -> AudioChunk {
    AudioChunk {
        samples,
        channels,
        sample_rate: 44_100,
    }
}

fn descriptor(index: usize, name: &str, inputs: u16, outputs: u16) -> AudioDeviceDescriptor {
    AudioDeviceDescriptor {
        index,
        name: name.to_string(),
        max_input_channels: inputs,
        max_output_channels: outputs,
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn downmix_averages_each_stereo_frame() {
    let mono = downmix_to_mono(&[0.2, 0.4, -1.0, 1.0], 2);
    assert_eq!(mono.len(), 2);
    assert!((mono[0] - 0.3).abs() < 1e-6);
    assert!(mono[1].abs() < 1e-6);
}

#[test]
fn downmix_handles_trailing_partial_frame() {
    // Last frame has only one of two channels; average over what is there.
    let mono = downmix_to_mono(&[1.0, 3.0, 0.5], 2);
    assert_eq!(mono.len(), 2);
    assert!((mono[0] - 2.0).abs() < 1e-6);
    assert!((mono[1] - 0.5).abs() < 1e-6);
}

#[test]
fn downmix_passes_mono_through() {
    let input = [0.1, -0.2, 0.3];
    assert_eq!(downmix_to_mono(&input, 1), input.to_vec());
    assert_eq!(downmix_to_mono(&input, 0), input.to_vec());
}

#[test]
fn chunk_frames_divide_by_channel_count() {
    assert_eq!(chunk(vec![0.0; 1024], 2).frames(), 512);
    assert_eq!(chunk(vec![0.0; 1024], 1).frames(), 1024);
    assert_eq!(chunk(vec![0.0; 7], 2).frames(), 3);
    assert_eq!(chunk(Vec::new(), 2).frames(), 0);
}

#[test]
fn resample_is_identity_when_rates_match() {
    let input = vec![0.25, -0.5, 0.75];
    assert_eq!(resample(&input, 16_000, 16_000), input);
    assert_eq!(resample(&input, 0, 16_000), input);
    assert_eq!(resample(&[], 44_100, 16_000), Vec::<f32>::new());
}

#[test]
fn resample_output_length_tracks_rate_ratio() {
    let input = vec![0.0f32; 44_100];
    let output = resample(&input, 44_100, 16_000);
    let expected = (44_100f64 * 16_000f64 / 44_100f64).round() as usize;
    assert!(
        output.len().abs_diff(expected) <= 10,
        "expected about {expected} samples, got {}",
        output.len()
    );
}

#[test]
fn basic_resample_matches_expected_length() {
    let input: Vec<f32> = (0..4_410).map(|i| (i as f32 * 0.01).sin()).collect();
    let output = basic_resample(&input, 44_100, 16_000);
    let expected = (4_410f32 * 16_000.0 / 44_100.0).round() as usize;
    assert_eq!(output.len(), expected);
}

#[test]
fn linear_resampler_scales_length_by_ratio() {
    let input = vec![0.0f32; 100];
    assert_eq!(resample_linear(&input, 2.0).len(), 200);
    assert_eq!(resample_linear(&input, 0.5).len(), 50);
}

#[test]
fn linear_resampler_preserves_constant_signal() {
    let input = vec![0.5f32; 64];
    let output = resample_linear(&input, 0.36);
    assert!(!output.is_empty());
    assert!(output.iter().all(|&s| (s - 0.5).abs() < 1e-5));
}

#[test]
fn buffer_pops_in_push_order() {
    let buffer = ChunkBuffer::with_capacity(4);
    let producer = buffer.producer();
    assert!(producer.push(chunk(vec![1.0], 1)));
    assert!(producer.push(chunk(vec![2.0], 1)));

    assert_eq!(buffer.try_pop().unwrap().samples, vec![1.0]);
    assert_eq!(buffer.try_pop().unwrap().samples, vec![2.0]);
    assert!(buffer.try_pop().is_none());
}

#[test]
fn full_buffer_drops_and_counts() {
    let buffer = ChunkBuffer::with_capacity(2);
    let producer = buffer.producer();
    assert!(producer.push(chunk(vec![1.0], 1)));
    assert!(producer.push(chunk(vec![2.0], 1)));
    assert!(!producer.push(chunk(vec![3.0], 1)));
    assert!(!producer.push(chunk(vec![4.0], 1)));

    assert_eq!(buffer.dropped(), 2);
    assert_eq!(buffer.len(), 2);
    // Queued chunks are the oldest ones; the overflow was discarded.
    assert_eq!(buffer.try_pop().unwrap().samples, vec![1.0]);
}

#[test]
fn drain_empties_the_buffer() {
    let buffer = ChunkBuffer::with_capacity(8);
    let producer = buffer.producer();
    for i in 0..5 {
        producer.push(chunk(vec![i as f32], 1));
    }
    assert_eq!(buffer.drain(), 5);
    assert!(buffer.is_empty());
    assert_eq!(buffer.drain(), 0);
}

#[test]
fn classification_picks_keyword_device_with_inputs() {
    let devices = vec![
        descriptor(0, "Speakers", 0, 2),
        descriptor(1, "Stereo Mix (Realtek)", 2, 0),
        descriptor(2, "Microphone", 1, 0),
    ];
    let picked = classify_loopback(&devices, &keywords(&["loopback", "stereo mix"]));
    assert_eq!(picked, Some(1));
}

#[test]
fn classification_requires_input_channels() {
    // Name matches but the device is output-only.
    let devices = vec![descriptor(0, "Loopback Out", 0, 2)];
    assert_eq!(classify_loopback(&devices, &keywords(&["loopback"])), None);
}

#[test]
fn classification_prefers_more_input_channels() {
    let devices = vec![
        descriptor(0, "Loopback A", 1, 0),
        descriptor(1, "Loopback B", 8, 0),
        descriptor(2, "Loopback C", 2, 0),
    ];
    let picked = classify_loopback(&devices, &keywords(&["loopback"]));
    assert_eq!(picked, Some(1));
}

#[test]
fn classification_breaks_ties_by_lowest_index() {
    let devices = vec![
        descriptor(0, "Microphone", 2, 0),
        descriptor(1, "Loopback A", 2, 0),
        descriptor(2, "Loopback B", 2, 0),
    ];
    let picked = classify_loopback(&devices, &keywords(&["loopback"]));
    assert_eq!(picked, Some(1));
}

#[test]
fn classification_is_case_insensitive() {
    let devices = vec![descriptor(0, "CABLE Output (VB-Audio)", 2, 0)];
    let picked = classify_loopback(&devices, &keywords(&["cable output"]));
    assert_eq!(picked, Some(0));
}

#[test]
fn classification_returns_none_without_candidates() {
    let devices = vec![
        descriptor(0, "Microphone", 1, 0),
        descriptor(1, "Speakers", 0, 2),
    ];
    assert_eq!(
        classify_loopback(&devices, &keywords(&["loopback", "stereo mix"])),
        None
    );
}

#[test]
fn find_by_name_prefers_exact_match() {
    let catalog = DeviceCatalog::from_descriptors(vec![
        descriptor(0, "Mix Input", 2, 0),
        descriptor(1, "Mix", 2, 0),
    ]);
    assert_eq!(catalog.find_by_name("Mix").map(|d| d.index), Some(1));
    assert_eq!(catalog.find_by_name("Input").map(|d| d.index), Some(0));
    assert!(catalog.find_by_name("Headset").is_none());
}
